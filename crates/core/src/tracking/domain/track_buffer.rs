//! Frame-indexed store of accumulated detections.
//!
//! Batch sessions know their frame count up front and preallocate a fixed
//! capacity; live sessions grow without bound and may be cleared. Both share
//! the append/trim/clear contract below.

use crate::shared::error::TrackingError;
use crate::tracking::domain::detection::Detection;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferMode {
    Bounded { capacity: usize },
    Unbounded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    CapacityReached,
    /// The detection's frame index is lower than the last entry's.
    OutOfOrder,
    /// The buffer was trimmed and no longer accepts entries.
    Finalized,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    Rejected(RejectReason),
}

#[derive(Clone, Debug)]
pub struct TrackBuffer {
    mode: BufferMode,
    entries: Vec<Detection>,
    finalized: bool,
    rejected: usize,
}

impl TrackBuffer {
    pub fn bounded(capacity: usize) -> Self {
        Self {
            mode: BufferMode::Bounded { capacity },
            entries: Vec::with_capacity(capacity),
            finalized: false,
            rejected: 0,
        }
    }

    pub fn unbounded() -> Self {
        Self {
            mode: BufferMode::Unbounded,
            entries: Vec::new(),
            finalized: false,
            rejected: 0,
        }
    }

    /// Bounded buffer sized for a source of `total_frames` sampled every
    /// `stride` frames.
    pub fn for_batch(total_frames: usize, stride: usize) -> Result<Self, TrackingError> {
        if stride < 1 {
            return Err(TrackingError::InvalidStride(stride));
        }
        Ok(Self::bounded(total_frames / stride))
    }

    pub fn mode(&self) -> BufferMode {
        self.mode
    }

    /// Fixed capacity in bounded mode, `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        match self.mode {
            BufferMode::Bounded { capacity } => Some(capacity),
            BufferMode::Unbounded => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Appends rejected since creation or the last clear.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn entries(&self) -> &[Detection] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Detection> {
        self.entries
    }

    /// Appends `detection` whole, or leaves the buffer untouched.
    pub fn append(&mut self, detection: Detection) -> AppendOutcome {
        let verdict = self.check(&detection);
        match verdict {
            Some(reason) => {
                self.rejected += 1;
                log::debug!(
                    "rejected detection for frame {}: {reason:?}",
                    detection.frame_index
                );
                AppendOutcome::Rejected(reason)
            }
            None => {
                self.entries.push(detection);
                AppendOutcome::Appended
            }
        }
    }

    fn check(&self, detection: &Detection) -> Option<RejectReason> {
        if self.finalized {
            return Some(RejectReason::Finalized);
        }
        if let BufferMode::Bounded { capacity } = self.mode {
            if self.entries.len() >= capacity {
                return Some(RejectReason::CapacityReached);
            }
        }
        match self.entries.last() {
            Some(last) if detection.frame_index < last.frame_index => {
                Some(RejectReason::OutOfOrder)
            }
            _ => None,
        }
    }

    /// Finalizes the buffer at its live count and releases unused storage.
    pub fn trim(&mut self) {
        if self.finalized {
            return;
        }
        self.entries.shrink_to_fit();
        self.finalized = true;
    }

    /// Drops every entry and reopens the buffer. The mode is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.finalized = false;
        self.rejected = 0;
    }
}
