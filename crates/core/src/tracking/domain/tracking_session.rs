//! Per-run session state: sampler, buffer, and for live runs the recording
//! gate and elapsed-time origin.

use std::time::Instant;

use crate::shared::error::TrackingError;
use crate::shared::frame::Frame;
use crate::tracking::domain::detection::Detection;
use crate::tracking::domain::recording_controller::{
    RecordingController, SessionAction, SessionState, Transition,
};
use crate::tracking::domain::track_buffer::{AppendOutcome, TrackBuffer};
use crate::video::domain::frame_sampler::{FrameSample, FrameSampler};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded {
        appended: usize,
        rejected: usize,
        /// First detection recorded since the session started or was cleared.
        started: bool,
    },
    /// The session is paused; the points were not stored.
    Paused { discarded: usize },
}

/// One tracking run, batch or live.
///
/// Owns everything that changes while frames flow in, so nothing about a run
/// lives outside this value.
pub struct TrackingSession {
    sampler: FrameSampler,
    buffer: TrackBuffer,
    controller: Option<RecordingController>,
    origin: Option<Instant>,
}

impl TrackingSession {
    /// Session over a file of `total_frames` frames, sampled every `stride`.
    ///
    /// When the container does not report a frame count the buffer is
    /// unbounded instead of zero-sized.
    pub fn batch(total_frames: usize, stride: usize) -> Result<Self, TrackingError> {
        let sampler = FrameSampler::new(stride)?;
        let buffer = if total_frames == 0 {
            log::warn!("source does not report a frame count; detections are not capped");
            TrackBuffer::unbounded()
        } else {
            TrackBuffer::for_batch(total_frames, stride)?
        };
        Ok(Self {
            sampler,
            buffer,
            controller: None,
            origin: None,
        })
    }

    /// Live session analysing every frame, timed from `now`.
    pub fn live(initial: SessionState, now: Instant) -> Self {
        Self {
            sampler: FrameSampler::every_frame(),
            buffer: TrackBuffer::unbounded(),
            controller: Some(RecordingController::new(initial)),
            origin: Some(now),
        }
    }

    pub fn is_live(&self) -> bool {
        self.controller.is_some()
    }

    pub fn state(&self) -> Option<SessionState> {
        self.controller.as_ref().map(|c| c.state())
    }

    pub fn has_started(&self) -> bool {
        self.controller
            .as_ref()
            .map_or(!self.buffer.is_empty(), |c| c.has_started())
    }

    pub fn captured(&self) -> usize {
        self.sampler.captured()
    }

    pub fn sampled(&self) -> usize {
        self.sampler.sampled()
    }

    pub fn stride(&self) -> usize {
        self.sampler.stride()
    }

    pub fn buffer(&self) -> &TrackBuffer {
        &self.buffer
    }

    /// Seconds since the session origin; `None` for batch sessions.
    pub fn elapsed(&self, now: Instant) -> Option<f64> {
        self.origin
            .map(|origin| now.saturating_duration_since(origin).as_secs_f64())
    }

    /// Counts a captured frame and returns it when it is due for analysis.
    pub fn capture(&mut self, image: Frame) -> Option<FrameSample> {
        self.sampler.admit(image)
    }

    /// Stores one detection per point, unless the session is paused.
    pub fn record(
        &mut self,
        sample: &FrameSample,
        points: &[(f64, f64)],
        now: Instant,
    ) -> RecordOutcome {
        if let Some(controller) = &self.controller {
            if !controller.accepts_detections() {
                return RecordOutcome::Paused {
                    discarded: points.len(),
                };
            }
        }

        let timestamp = self.elapsed(now);
        let mut appended = 0;
        let mut rejected = 0;
        for &(x, y) in points {
            let detection = Detection {
                frame_index: sample.capture_index,
                timestamp,
                x,
                y,
            };
            match self.buffer.append(detection) {
                AppendOutcome::Appended => appended += 1,
                AppendOutcome::Rejected(_) => rejected += 1,
            }
        }

        let started = appended > 0
            && self
                .controller
                .as_mut()
                .map_or(false, |controller| controller.note_append());

        RecordOutcome::Recorded {
            appended,
            rejected,
            started,
        }
    }

    /// Applies a user action. `Clear` also empties the buffer and restarts
    /// frame numbering and the time origin at `now`.
    pub fn apply(&mut self, action: SessionAction, now: Instant) -> Result<Transition, TrackingError> {
        let controller = self
            .controller
            .as_mut()
            .ok_or(TrackingError::NotInteractive)?;
        let transition = controller.apply(action)?;
        if transition == Transition::Cleared {
            self.buffer.clear();
            self.sampler.reset();
            self.origin = Some(now);
        }
        Ok(transition)
    }

    /// Ends the session and hands over the trimmed buffer.
    pub fn finish(mut self) -> TrackBuffer {
        self.buffer.trim();
        if self.buffer.rejected() > 0 {
            log::warn!(
                "{} detections were dropped because the buffer was full",
                self.buffer.rejected()
            );
        }
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Duration;

    fn frame(index: usize) -> Frame {
        Frame::new(vec![0u8; 4 * 4 * 3], 4, 4, 3, index)
    }

    /// Feeds one frame carrying `points` through the session.
    fn step(
        session: &mut TrackingSession,
        index: usize,
        points: &[(f64, f64)],
        now: Instant,
    ) -> Option<RecordOutcome> {
        let sample = session.capture(frame(index))?;
        Some(session.record(&sample, points, now))
    }

    #[test]
    fn test_batch_records_true_capture_index() {
        let mut session = TrackingSession::batch(9, 3).unwrap();
        let now = Instant::now();
        for i in 0..9 {
            step(&mut session, i, &[(i as f64, 1.0)], now);
        }
        let buffer = session.finish();
        let frames: Vec<usize> = buffer.entries().iter().map(|d| d.frame_index).collect();
        assert_eq!(frames, vec![3, 6, 9]);
        assert!(buffer.entries().iter().all(|d| d.timestamp.is_none()));
    }

    #[test]
    fn test_batch_multi_face_overflow_is_dropped() {
        let mut session = TrackingSession::batch(4, 2).unwrap();
        let now = Instant::now();
        let two_faces = [(1.0, 1.0), (2.0, 2.0)];
        for i in 0..4 {
            step(&mut session, i, &two_faces, now);
        }
        let buffer = session.finish();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.rejected(), 2);
        assert_eq!(buffer.entries()[1].frame_index, 2);
    }

    #[test]
    fn test_batch_unknown_length_is_unbounded() {
        let session = TrackingSession::batch(0, 2).unwrap();
        assert_eq!(session.buffer().capacity(), None);
    }

    #[test]
    fn test_batch_rejects_actions() {
        let mut session = TrackingSession::batch(10, 1).unwrap();
        assert_eq!(
            session.apply(SessionAction::Toggle, Instant::now()),
            Err(TrackingError::NotInteractive)
        );
    }

    #[test]
    fn test_paused_recording_clear_scenario() {
        let t0 = Instant::now();
        let mut session = TrackingSession::live(SessionState::Paused, t0);

        for i in 0..3 {
            let outcome = step(&mut session, i, &[(10.0, 10.0)], t0).unwrap();
            assert_eq!(outcome, RecordOutcome::Paused { discarded: 1 });
        }
        assert_eq!(session.buffer().len(), 0);

        session.apply(SessionAction::Toggle, t0).unwrap();
        let t1 = t0 + Duration::from_secs(2);
        let first = step(&mut session, 3, &[(11.0, 10.0)], t1).unwrap();
        step(&mut session, 4, &[(12.0, 10.0)], t1);
        assert_eq!(
            first,
            RecordOutcome::Recorded {
                appended: 1,
                rejected: 0,
                started: true
            }
        );
        assert_eq!(session.buffer().len(), 2);

        let t_clear = t0 + Duration::from_secs(5);
        assert_eq!(
            session.apply(SessionAction::Clear, t_clear).unwrap(),
            Transition::Cleared
        );
        assert_eq!(session.buffer().len(), 0);
        assert_eq!(session.captured(), 0);
        assert_eq!(session.state(), Some(SessionState::Recording));

        // Pause and resume, then record once more.
        session.apply(SessionAction::Toggle, t_clear).unwrap();
        session.apply(SessionAction::Toggle, t_clear).unwrap();
        let t2 = t_clear + Duration::from_millis(1500);
        let outcome = step(&mut session, 5, &[(13.0, 10.0)], t2).unwrap();
        assert_eq!(
            outcome,
            RecordOutcome::Recorded {
                appended: 1,
                rejected: 0,
                started: true
            }
        );

        let buffer = session.finish();
        assert_eq!(buffer.len(), 1);
        let entry = buffer.entries()[0];
        assert_eq!(entry.frame_index, 1);
        assert_relative_eq!(entry.timestamp.unwrap(), 1.5, epsilon = 1e-9);
    }

    #[test]
    fn test_live_timestamps_from_origin() {
        let t0 = Instant::now();
        let mut session = TrackingSession::live(SessionState::Recording, t0);
        step(&mut session, 0, &[(1.0, 1.0)], t0 + Duration::from_millis(250));
        assert_relative_eq!(
            session.buffer().entries()[0].timestamp.unwrap(),
            0.25,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_live_quit_then_actions_fail() {
        let now = Instant::now();
        let mut session = TrackingSession::live(SessionState::Recording, now);
        assert_eq!(
            session.apply(SessionAction::Quit, now).unwrap(),
            Transition::Finished
        );
        assert_eq!(
            session.apply(SessionAction::Clear, now),
            Err(TrackingError::SessionFinished)
        );
    }

    #[test]
    fn test_finish_trims_buffer() {
        let now = Instant::now();
        let mut session = TrackingSession::live(SessionState::Recording, now);
        step(&mut session, 0, &[(1.0, 2.0)], now);
        let buffer = session.finish();
        assert!(buffer.is_finalized());
        assert_eq!(buffer.len(), 1);
    }
}
