//! Low-level signals posted by playback resources.
//!
//! Resources run their own threads (bus watchers, timers, frame pullers) and
//! must never touch the state machine directly. Instead they post [`Signal`]s
//! into a queue that the state machine drains on the UI thread in
//! [`PlaybackStateMachine::pump`](crate::PlaybackStateMachine::pump).
//!
//! Every registration a resource hands out is a [`Subscription`]. Dropping it
//! silences the matching [`SignalSink`], so a replaced item or a discarded
//! resource can not deliver anything afterwards.

use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Identifies one media item handed to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl ItemId {
    pub(crate) fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identifies one seek request so completions can be matched to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeekTicket(u64);

impl SeekTicket {
    pub(crate) fn next() -> Self {
        static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_TICKET.fetch_add(1, Ordering::Relaxed))
    }
}

/// Loading status of the current media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Unknown,
    ReadyToPlay,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignalKind {
    Status(ItemStatus),
    /// The playback buffer ran dry.
    BufferEmpty,
    /// Enough media is buffered to keep playing.
    LikelyToKeepUp,
    EndOfMedia,
    /// Periodic position report.
    Tick(Duration),
    SeekCompleted(SeekTicket),
}

/// A signal concerning a specific media item.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub item: ItemId,
    pub kind: SignalKind,
}

/// Creates the queue a state machine drains.
pub(crate) fn queue() -> (SignalSender, Receiver<Signal>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (SignalSender(tx), rx)
}

/// Unconditional sender handed to a resource when it is created.
#[derive(Debug, Clone)]
pub struct SignalSender(Sender<Signal>);

impl SignalSender {
    /// Posts a signal. Returns false once the state machine is gone.
    pub fn send(&self, item: ItemId, kind: SignalKind) -> bool {
        self.0.send(Signal { item, kind }).is_ok()
    }

    /// Creates a sink bound to a new subscription.
    pub fn subscribe(&self) -> (Subscription, SignalSink) {
        let active = Arc::new(AtomicBool::new(true));
        let sink = SignalSink {
            sender: self.clone(),
            active: Arc::clone(&active),
        };
        (Subscription { active }, sink)
    }
}

/// Sender that stops delivering once its [`Subscription`] is dropped.
#[derive(Debug, Clone)]
pub struct SignalSink {
    sender: SignalSender,
    active: Arc<AtomicBool>,
}

impl SignalSink {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Posts a signal if the subscription is still alive.
    pub fn emit(&self, item: ItemId, kind: SignalKind) -> bool {
        self.is_active() && self.sender.send(item, kind)
    }
}

/// Registration guard. Dropping it deregisters the associated handlers.
#[derive(Debug)]
#[must_use = "dropping a subscription immediately deregisters it"]
pub struct Subscription {
    active: Arc<AtomicBool>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_subscription_silences_its_sink() {
        let (sender, rx) = queue();
        let item = ItemId::next();
        let (subscription, sink) = sender.subscribe();

        assert!(sink.emit(item, SignalKind::BufferEmpty));
        drop(subscription);
        assert!(!sink.emit(item, SignalKind::EndOfMedia));

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            received,
            [Signal {
                item,
                kind: SignalKind::BufferEmpty
            }]
        );
    }

    #[test]
    fn item_ids_are_unique() {
        assert_ne!(ItemId::next(), ItemId::next());
    }
}
