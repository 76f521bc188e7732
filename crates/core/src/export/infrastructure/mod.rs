pub mod atomic_file;
pub mod csv_exporter;
pub mod json_exporter;
pub mod track_exporter;
pub mod track_loader;
