use crate::shared::error::TrackingError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Recording,
    Paused,
}

impl SessionState {
    pub fn label(self) -> &'static str {
        match self {
            SessionState::Recording => "REC",
            SessionState::Paused => "PAUSED",
        }
    }
}

/// A user command in a live session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionAction {
    Toggle,
    Clear,
    Quit,
}

impl SessionAction {
    /// Maps the interactive keys `r`, `c` and `q` to actions.
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'r' => Some(SessionAction::Toggle),
            'c' => Some(SessionAction::Clear),
            'q' => Some(SessionAction::Quit),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    StateChanged(SessionState),
    Cleared,
    Finished,
}

/// Gates whether detections are recorded in a live session.
///
/// `Clear` is orthogonal to the recording axis: it never changes the state.
/// `Quit` is terminal; any action after it fails with
/// [`TrackingError::SessionFinished`].
#[derive(Clone, Debug)]
pub struct RecordingController {
    state: SessionState,
    finished: bool,
    started: bool,
}

impl RecordingController {
    pub fn new(initial: SessionState) -> Self {
        Self {
            state: initial,
            finished: false,
            started: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn accepts_detections(&self) -> bool {
        !self.finished && self.state == SessionState::Recording
    }

    /// Whether at least one detection was recorded since start or the last clear.
    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn apply(&mut self, action: SessionAction) -> Result<Transition, TrackingError> {
        if self.finished {
            return Err(TrackingError::SessionFinished);
        }
        let transition = match action {
            SessionAction::Toggle => {
                self.state = match self.state {
                    SessionState::Recording => SessionState::Paused,
                    SessionState::Paused => SessionState::Recording,
                };
                Transition::StateChanged(self.state)
            }
            SessionAction::Clear => {
                self.started = false;
                Transition::Cleared
            }
            SessionAction::Quit => {
                self.finished = true;
                Transition::Finished
            }
        };
        Ok(transition)
    }

    /// Call after each recorded detection. Returns `true` for the first one
    /// of the run, which is when recording has actually started.
    pub fn note_append(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        true
    }
}
