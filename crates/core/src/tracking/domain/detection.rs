/// One recorded landmark coordinate.
///
/// `frame_index` is the 1-based capture position of the frame it came from.
/// `timestamp` is the seconds elapsed since the session origin and is only
/// present for live sessions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub frame_index: usize,
    pub timestamp: Option<f64>,
    pub x: f64,
    pub y: f64,
}

impl Detection {
    pub fn new(frame_index: usize, x: f64, y: f64) -> Self {
        Self {
            frame_index,
            timestamp: None,
            x,
            y,
        }
    }

    pub fn timed(frame_index: usize, timestamp: f64, x: f64, y: f64) -> Self {
        Self {
            frame_index,
            timestamp: Some(timestamp),
            x,
            y,
        }
    }
}
