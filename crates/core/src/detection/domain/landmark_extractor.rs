//! Reduces detector output to the one point of interest per face.

use crate::detection::domain::face_points::FacePoints;
use crate::detection::domain::landmark_detector::LandmarkDetector;
use crate::shared::error::TrackingError;
use crate::video::domain::frame_sampler::FrameSample;

/// Result of running the detector on one sampled frame.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameExtraction {
    /// Faces as reported, plus the designated point of each face that has it
    /// visible. Zero faces is a valid, empty result.
    Points {
        faces: Vec<FacePoints>,
        points: Vec<(f64, f64)>,
    },
    /// The detector failed on this frame; the caller moves on to the next one.
    Skipped { reason: String },
}

impl FrameExtraction {
    pub fn points(&self) -> &[(f64, f64)] {
        match self {
            FrameExtraction::Points { points, .. } => points,
            FrameExtraction::Skipped { .. } => &[],
        }
    }

    pub fn faces(&self) -> &[FacePoints] {
        match self {
            FrameExtraction::Points { faces, .. } => faces,
            FrameExtraction::Skipped { .. } => &[],
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, FrameExtraction::Skipped { .. })
    }
}

/// Wraps a [`LandmarkDetector`] and picks landmark `point_index` from every
/// detected face.
pub struct LandmarkExtractor {
    detector: Box<dyn LandmarkDetector>,
    point_index: usize,
    skipped: usize,
}

impl LandmarkExtractor {
    pub fn new(
        detector: Box<dyn LandmarkDetector>,
        point_index: usize,
    ) -> Result<Self, TrackingError> {
        if let Some(available) = detector.points_per_face() {
            if point_index >= available {
                return Err(TrackingError::InvalidPointIndex {
                    index: point_index,
                    available,
                });
            }
        }
        Ok(Self {
            detector,
            point_index,
            skipped: 0,
        })
    }

    pub fn point_index(&self) -> usize {
        self.point_index
    }

    /// Frames whose detection failed so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn extract(&mut self, sample: &FrameSample) -> FrameExtraction {
        let faces = match self.detector.detect(&sample.image) {
            Ok(faces) => faces,
            Err(e) => {
                self.skipped += 1;
                log::warn!(
                    "landmark detection failed on frame {}, skipping: {e}",
                    sample.capture_index
                );
                return FrameExtraction::Skipped {
                    reason: e.to_string(),
                };
            }
        };

        let points: Vec<(f64, f64)> = faces
            .iter()
            .filter_map(|face| {
                let point = face.point(self.point_index);
                if point.is_none() {
                    log::debug!(
                        "frame {}: face without visible landmark {}",
                        sample.capture_index,
                        self.point_index
                    );
                }
                point
            })
            .collect();

        FrameExtraction::Points { faces, points }
    }
}
