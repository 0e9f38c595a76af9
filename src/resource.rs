//! Seams between the state machine and a concrete playback pipeline.

use crate::Error;
use crate::signal::{ItemId, SeekTicket, SignalSender, Subscription};
use crate::surface::RenderTarget;
use std::time::Duration;
use url::Url;

/// One playable source handed to a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    id: ItemId,
    url: Url,
}

impl MediaItem {
    pub(crate) fn new(url: Url) -> Self {
        Self {
            id: ItemId::next(),
            url,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// A decode/render pipeline playing one [`MediaItem`] at a time.
///
/// Methods are called from the UI thread. Anything the pipeline learns
/// asynchronously is posted through the [`SignalSender`] it was created with,
/// tagged with the item it concerns.
pub trait PlaybackResource {
    /// Replaces the current item. The resource keeps its render target.
    fn load(&mut self, item: &MediaItem) -> Result<(), Error>;

    /// Detaches the current item, if any.
    fn unload(&mut self);

    fn play(&mut self);

    fn pause(&mut self);

    /// Starts a seek. The resource posts `SeekCompleted(ticket)` once the
    /// seek finished, whether or not it succeeded.
    fn seek(&mut self, position: Duration, ticket: SeekTicket);

    fn position(&self) -> Duration;

    /// Total duration of the current item, or `None` when unknown or
    /// unbounded (live streams).
    fn duration(&self) -> Option<Duration>;

    /// Human-readable reason for the last item failure.
    fn failure_reason(&self) -> Option<String>;

    /// Registers status, buffering and end-of-media handlers for `item`.
    fn observe_item(&mut self, item: &MediaItem) -> Subscription;

    /// Registers a periodic position tick.
    fn observe_time(&mut self, interval: Duration) -> Subscription;
}

/// Creates resources bound to a render target.
pub trait Backend {
    type Resource: PlaybackResource;

    fn create_resource(
        &mut self,
        target: &RenderTarget,
        signals: SignalSender,
    ) -> Result<Self::Resource, Error>;
}
