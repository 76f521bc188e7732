use crate::detection::domain::face_points::FacePoints;
use crate::shared::frame::Frame;

/// Domain interface for drawing detection feedback onto a frame.
///
/// Implementations modify the frame in place.
pub trait FrameAnnotator: Send {
    fn annotate(
        &self,
        frame: &mut Frame,
        faces: &[FacePoints],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
