use crate::error::PlaybackError;
use crate::state::PlaybackState;
use crate::time::TimeUpdate;

/// Receives playback events from a [`PlaybackStateMachine`](crate::PlaybackStateMachine).
///
/// The state machine only keeps a weak reference to its observer; the host
/// decides how long the observer lives. All callbacks run on the thread that
/// drives the state machine.
pub trait PlaybackObserver {
    /// Called once for every state change.
    fn on_state_changed(&self, state: PlaybackState);

    /// Called on every periodic tick with a finite duration, and when a seek starts.
    fn on_time_updated(&self, update: TimeUpdate);

    /// Called when the current item played to its end.
    fn on_finished(&self);

    fn on_failed(&self, error: PlaybackError);
}
