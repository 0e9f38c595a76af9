//! Playback states reported to observers.

use std::fmt;

/// Current state of a [`PlaybackStateMachine`](crate::PlaybackStateMachine).
///
/// Exactly one state is active at a time. Only the state machine moves
/// between states; hosts observe them through
/// [`PlaybackObserver::on_state_changed`](crate::PlaybackObserver::on_state_changed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackState {
    /// No resource is bound. Initial state and the state after `reset`.
    #[default]
    Unknown,
    /// A media item was handed to the resource and is loading.
    Preparing,
    /// The resource ran out of buffered media.
    Buffering,
    Playing,
    Paused,
    /// Playback was stopped and rewound to the start.
    Stopped,
    /// The media item played to its end.
    Ended,
    /// The resource reported a failure for the current item.
    Error,
}

impl PlaybackState {
    /// Returns true if `play` is accepted from this state.
    pub fn can_play(self) -> bool {
        matches!(self, Self::Paused | Self::Stopped | Self::Ended)
    }

    /// Returns true if `pause` is accepted from this state.
    pub fn can_pause(self) -> bool {
        self == Self::Playing
    }

    /// Returns true if `stop` is accepted from this state.
    pub fn can_stop(self) -> bool {
        !matches!(self, Self::Unknown | Self::Stopped)
    }

    /// Returns true if resuming from this state must start over from the beginning.
    pub fn needs_rewind(self) -> bool {
        matches!(self, Self::Stopped | Self::Ended)
    }

    /// Returns true while the host should show a loading indicator.
    pub fn is_loading(self) -> bool {
        matches!(self, Self::Preparing | Self::Buffering)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Preparing => "preparing",
            Self::Buffering => "buffering",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Ended => "ended",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}
