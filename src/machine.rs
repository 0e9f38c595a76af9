//! Playback state machine.
//!
//! Owns at most one [`PlaybackResource`] and is the only place the current
//! [`PlaybackState`] changes. Host operations are validated against the
//! current state; invalid ones are silently ignored. Signals posted by the
//! resource are queued and applied by [`PlaybackStateMachine::pump`], which
//! must run on the same thread as every other call.

use crate::config::PlayerConfig;
use crate::error::{Error, PlaybackError, PlaybackErrorKind};
use crate::observer::PlaybackObserver;
use crate::resource::{Backend, MediaItem, PlaybackResource};
use crate::signal::{
    self, ItemStatus, SeekTicket, Signal, SignalKind, SignalSender, Subscription,
};
use crate::state::PlaybackState;
use crate::surface::{ContentFit, RenderTarget};
use crate::time::Progress;
use crossbeam_channel::Receiver;
use std::sync::{Arc, Weak};
use std::time::Duration;
use url::Url;

pub struct PlaybackStateMachine<B: Backend> {
    backend: B,
    config: PlayerConfig,
    state: PlaybackState,
    target: Option<RenderTarget>,
    observer: Option<Weak<dyn PlaybackObserver>>,

    // Subscriptions are declared before the resource so they are released first.
    time_subscription: Option<Subscription>,
    item_subscription: Option<Subscription>,
    item: Option<MediaItem>,
    resource: Option<B::Resource>,
    pending_seek: Option<SeekTicket>,
    // Set while the resource is paused because its buffer ran dry.
    paused_for_buffering: bool,

    signals: SignalSender,
    inbox: Receiver<Signal>,
}

impl<B: Backend> PlaybackStateMachine<B> {
    /// Create a state machine with the default configuration.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, PlayerConfig::default())
    }

    pub fn with_config(backend: B, config: PlayerConfig) -> Self {
        let (signals, inbox) = signal::queue();
        Self {
            backend,
            config,
            state: PlaybackState::Unknown,
            target: None,
            observer: None,
            time_subscription: None,
            item_subscription: None,
            item: None,
            resource: None,
            pending_seek: None,
            paused_for_buffering: false,
            signals,
            inbox,
        }
    }

    /// Set the observer. Only a weak reference is kept.
    pub fn set_observer<O: PlaybackObserver + 'static>(&mut self, observer: &Arc<O>) {
        let observer: Weak<O> = Arc::downgrade(observer);
        let observer: Weak<dyn PlaybackObserver> = observer;
        self.observer = Some(observer);
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Bind the render target resources will draw into.
    pub fn configure(&mut self, target: RenderTarget) {
        if let Some(current) = &self.target {
            if current.same_target(&target) {
                return;
            }
            if self.resource.is_some() {
                log::warn!(
                    "render target changed while a resource is bound; it applies after reset"
                );
            }
        }
        self.target = Some(target);
    }

    /// Load `url` and start playing it.
    ///
    /// Completion is reported asynchronously through the observer. An
    /// unparsable url is reported as [`PlaybackErrorKind::InvalidUrl`] without
    /// changing state. Without a live render target nothing happens.
    pub fn prepare(&mut self, url: &str) -> Result<(), Error> {
        let Some(target) = self.target.clone().filter(RenderTarget::is_alive) else {
            log::warn!("no render target bound, not preparing {url}");
            return Err(Error::UnboundTarget);
        };

        let url = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::warn!("not preparing invalid url {url:?}: {err}");
                self.notify(|observer| observer.on_failed(PlaybackError::invalid_url(url, &err)));
                return Err(err.into());
            }
        };

        // A new item supersedes whatever the previous one had in flight.
        self.pending_seek = None;
        self.paused_for_buffering = false;
        self.item_subscription = None;
        self.item = None;

        let item = MediaItem::new(url);
        if let Err(err) = self.bind_item(&target, &item) {
            log::error!("failed to prepare {}: {err}", item.url());
            self.transition(PlaybackState::Error);
            let error = PlaybackError::new(PlaybackErrorKind::Unknown, err.to_string());
            self.notify(|observer| observer.on_failed(error));
            return Err(err);
        }

        self.transition(PlaybackState::Preparing);
        if let Some(resource) = self.resource.as_mut() {
            self.item_subscription = Some(resource.observe_item(&item));
            resource.play();
        }
        self.item = Some(item);
        Ok(())
    }

    fn bind_item(&mut self, target: &RenderTarget, item: &MediaItem) -> Result<(), Error> {
        let mut resource = match self.resource.take() {
            Some(resource) => resource,
            None => {
                let mut resource = self.backend.create_resource(target, self.signals.clone())?;
                target.set_content_fit(self.config.get_content_fit());
                self.time_subscription =
                    Some(resource.observe_time(self.config.get_tick_interval()));
                resource
            }
        };
        let loaded = resource.load(item);
        self.resource = Some(resource);
        loaded
    }

    /// Resume playback. Accepted from paused, stopped and ended.
    pub fn play(&mut self) {
        if !self.state.can_play() {
            log::debug!("ignoring play while {}", self.state);
            return;
        }
        let Some(resource) = self.resource.as_mut() else {
            return;
        };

        if self.state.needs_rewind() {
            self.pending_seek = None;
            resource.seek(Duration::ZERO, SeekTicket::next());
        }
        resource.play();
        self.paused_for_buffering = false;
        self.transition(PlaybackState::Playing);
    }

    pub fn pause(&mut self) {
        if !self.state.can_pause() {
            log::debug!("ignoring pause while {}", self.state);
            return;
        }
        let Some(resource) = self.resource.as_mut() else {
            return;
        };

        resource.pause();
        self.paused_for_buffering = false;
        self.transition(PlaybackState::Paused);
    }

    /// Seek to `fraction` (clamped to `0..=1`) of the current item.
    ///
    /// Ignored when the duration is unknown. Playback resumes once the
    /// resource reports the seek as completed.
    pub fn seek_to(&mut self, fraction: f64) {
        if !fraction.is_finite() {
            log::debug!("ignoring seek to non-finite fraction {fraction}");
            return;
        }
        let Some(duration) = self.resource.as_ref().and_then(|r| r.duration()) else {
            log::debug!("ignoring seek without a finite duration");
            return;
        };

        let position = duration.mul_f64(fraction.clamp(0.0, 1.0));
        let update = Progress::new(position, duration).report(self.config.get_time_reporting());
        self.notify(|observer| observer.on_time_updated(update));

        let ticket = SeekTicket::next();
        self.pending_seek = Some(ticket);
        if let Some(resource) = self.resource.as_mut() {
            resource.seek(position, ticket);
        }
    }

    /// Pause and rewind to the start. Ignored when already stopped or idle.
    pub fn stop(&mut self) {
        if !self.state.can_stop() {
            log::debug!("ignoring stop while {}", self.state);
            return;
        }
        let Some(resource) = self.resource.as_mut() else {
            return;
        };

        resource.pause();
        self.pending_seek = None;
        self.paused_for_buffering = false;
        resource.seek(Duration::ZERO, SeekTicket::next());
        self.transition(PlaybackState::Stopped);
    }

    /// Release the resource and return to [`PlaybackState::Unknown`].
    pub fn reset(&mut self) {
        let Some(mut resource) = self.resource.take() else {
            // A failed resource creation leaves the error state without a resource.
            self.transition(PlaybackState::Unknown);
            return;
        };

        resource.pause();
        self.time_subscription = None;
        self.item_subscription = None;
        resource.unload();
        drop(resource);

        self.item = None;
        self.pending_seek = None;
        self.paused_for_buffering = false;
        if let Some(target) = &self.target {
            target.clear();
        }
        self.transition(PlaybackState::Unknown);
    }

    /// Apply every signal queued by the resource. Returns how many were applied.
    ///
    /// Signals for items that are no longer current are discarded.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(signal) = self.inbox.try_recv() {
            if self.item.as_ref().map(MediaItem::id) != Some(signal.item) {
                log::trace!("dropping stale signal {:?}", signal);
                continue;
            }
            self.apply(signal.kind);
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, kind: SignalKind) {
        match kind {
            SignalKind::Status(ItemStatus::Unknown) => self.transition(PlaybackState::Buffering),
            SignalKind::Status(ItemStatus::ReadyToPlay) => self.transition(PlaybackState::Playing),
            SignalKind::Status(ItemStatus::Failed) => {
                self.paused_for_buffering = false;
                self.transition(PlaybackState::Error);
                let reason = self.resource.as_ref().and_then(|r| r.failure_reason());
                if let Some(reason) = reason {
                    let error = PlaybackError::new(PlaybackErrorKind::Unknown, reason);
                    self.notify(|observer| observer.on_failed(error));
                }
            }
            SignalKind::BufferEmpty => {
                if matches!(
                    self.state,
                    PlaybackState::Paused
                        | PlaybackState::Stopped
                        | PlaybackState::Ended
                        | PlaybackState::Error
                ) {
                    return;
                }
                if let Some(resource) = self.resource.as_mut() {
                    resource.pause();
                    self.paused_for_buffering = true;
                }
                self.transition(PlaybackState::Buffering);
            }
            SignalKind::LikelyToKeepUp => {
                // Readiness may have been reported while the buffer was still
                // low, leaving the resource paused in the playing state.
                if !self.paused_for_buffering && self.state != PlaybackState::Buffering {
                    return;
                }
                self.paused_for_buffering = false;
                if let Some(resource) = self.resource.as_mut() {
                    resource.play();
                }
                self.transition(PlaybackState::Playing);
            }
            SignalKind::EndOfMedia => {
                self.paused_for_buffering = false;
                self.transition(PlaybackState::Ended);
                self.notify(|observer| observer.on_finished());
            }
            SignalKind::Tick(position) => {
                let Some(duration) = self.resource.as_ref().and_then(|r| r.duration()) else {
                    return;
                };
                let update =
                    Progress::new(position, duration).report(self.config.get_time_reporting());
                self.notify(|observer| observer.on_time_updated(update));
            }
            SignalKind::SeekCompleted(ticket) => {
                if self.pending_seek != Some(ticket) {
                    return;
                }
                self.pending_seek = None;
                self.paused_for_buffering = false;
                if let Some(resource) = self.resource.as_mut() {
                    resource.play();
                }
                self.transition(PlaybackState::Playing);
            }
        }
    }

    fn transition(&mut self, next: PlaybackState) {
        if self.state == next {
            return;
        }
        log::debug!("playback state {} -> {}", self.state, next);
        self.state = next;
        self.notify(|observer| observer.on_state_changed(next));
    }

    fn notify(&self, event: impl FnOnce(&dyn PlaybackObserver)) {
        if let Some(observer) = self.observer.as_ref().and_then(Weak::upgrade) {
            event(&*observer);
        }
    }

    pub fn current_state(&self) -> PlaybackState {
        self.state
    }

    /// Duration of the current item, if it is known and finite.
    pub fn current_duration(&self) -> Option<Duration> {
        self.item.as_ref()?;
        self.resource.as_ref()?.duration()
    }

    pub fn current_position(&self) -> Option<Duration> {
        self.item.as_ref()?;
        Some(self.resource.as_ref()?.position())
    }

    pub fn current_item(&self) -> Option<&MediaItem> {
        self.item.as_ref()
    }

    pub fn has_resource(&self) -> bool {
        self.resource.is_some()
    }

    /// Returns true while a seek started by [`seek_to`](Self::seek_to) has not completed.
    pub fn is_seeking(&self) -> bool {
        self.pending_seek.is_some()
    }

    /// Set how the video is scaled inside the surface.
    pub fn set_content_fit(&mut self, fit: ContentFit) {
        self.config = self.config.clone().content_fit(fit);
        if let Some(target) = &self.target {
            target.set_content_fit(fit);
        }
    }
}
