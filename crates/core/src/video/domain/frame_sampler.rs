use crate::shared::error::TrackingError;
use crate::shared::frame::Frame;

/// A captured frame that passed the stride check, tagged with its 1-based
/// capture position.
#[derive(Clone, Debug)]
pub struct FrameSample {
    pub capture_index: usize,
    pub image: Frame,
}

/// Decides which captured frames are forwarded to landmark extraction.
///
/// The capture counter advances on every frame, forwarded or not, so the
/// indices recorded downstream are true capture positions rather than
/// ordinals of processed frames. With stride `N` exactly every `N`-th frame
/// is forwarded.
#[derive(Clone, Debug)]
pub struct FrameSampler {
    stride: usize,
    captured: usize,
    sampled: usize,
}

impl FrameSampler {
    pub fn new(stride: usize) -> Result<Self, TrackingError> {
        if stride < 1 {
            return Err(TrackingError::InvalidStride(stride));
        }
        Ok(Self {
            stride,
            captured: 0,
            sampled: 0,
        })
    }

    /// Sampler that forwards every frame.
    pub fn every_frame() -> Self {
        Self {
            stride: 1,
            captured: 0,
            sampled: 0,
        }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Frames seen since construction or the last reset.
    pub fn captured(&self) -> usize {
        self.captured
    }

    /// Frames forwarded since construction or the last reset.
    pub fn sampled(&self) -> usize {
        self.sampled
    }

    pub fn should_process(&self, capture_index: usize) -> bool {
        capture_index % self.stride == 0
    }

    /// Counts one captured frame and returns its capture index.
    pub fn advance(&mut self) -> usize {
        self.captured += 1;
        if self.should_process(self.captured) {
            self.sampled += 1;
        }
        self.captured
    }

    /// Counts `image` as captured and forwards it when the stride allows.
    pub fn admit(&mut self, image: Frame) -> Option<FrameSample> {
        let capture_index = self.advance();
        self.should_process(capture_index).then_some(FrameSample {
            capture_index,
            image,
        })
    }

    pub fn reset(&mut self) {
        self.captured = 0;
        self.sampled = 0;
    }

    /// Number of frames a source of `total_frames` will forward.
    pub fn expected_samples(&self, total_frames: usize) -> usize {
        total_frames / self.stride
    }
}
