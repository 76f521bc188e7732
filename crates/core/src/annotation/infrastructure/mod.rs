pub mod marker_annotator;
