use crate::detection::domain::face_points::FacePoints;
use crate::shared::frame::Frame;

/// Domain interface for facial landmark detection.
///
/// Returns every face found in the frame, in detector order. Implementations
/// may hold inference state, hence `&mut self`.
pub trait LandmarkDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FacePoints>, Box<dyn std::error::Error>>;

    /// Number of landmarks per face, when the model layout is fixed.
    fn points_per_face(&self) -> Option<usize> {
        None
    }
}
