//! Scripted backend and recording observer for driving the state machine.

#![allow(dead_code)]

use gpui_playback::{
    Backend, Error, ItemId, MediaItem, PlaybackError, PlaybackObserver, PlaybackResource,
    PlaybackState, PlaybackStateMachine, PlayerConfig, PresentationSurface, RenderTarget,
    SeekTicket, SignalKind, SignalSender, SignalSink, Subscription, TimeUpdate, VideoSurface,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

pub const MOVIE: &str = "https://example.com/movie.mp4";
pub const TRAILER: &str = "file:///media/trailer.mkv";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load(String),
    Unload,
    Play,
    Pause,
    Seek(Duration),
}

#[derive(Default)]
struct Script {
    calls: Vec<Call>,
    duration: Option<Duration>,
    position: Duration,
    failure: Option<String>,
    fail_create: bool,
    resources_created: usize,
    signals: Option<SignalSender>,
    item: Option<ItemId>,
    item_sink: Option<SignalSink>,
    time_sink: Option<SignalSink>,
    seeks: Vec<SeekTicket>,
}

/// Backend whose resources only record what they were asked to do.
#[derive(Clone, Default)]
pub struct ScriptedBackend(Arc<Mutex<Script>>);

impl ScriptedBackend {
    pub fn set_duration(&self, duration: Option<Duration>) {
        self.0.lock().duration = duration;
    }

    pub fn set_failure(&self, reason: Option<&str>) {
        self.0.lock().failure = reason.map(str::to_string);
    }

    pub fn fail_create(&self, fail: bool) {
        self.0.lock().fail_create = fail;
    }

    pub fn resources_created(&self) -> usize {
        self.0.lock().resources_created
    }

    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut self.0.lock().calls)
    }

    pub fn current_item(&self) -> Option<ItemId> {
        self.0.lock().item
    }

    /// Posts a signal through the current item subscription.
    pub fn emit(&self, kind: SignalKind) -> bool {
        let script = self.0.lock();
        match (script.item, script.item_sink.as_ref()) {
            (Some(item), Some(sink)) => sink.emit(item, kind),
            _ => false,
        }
    }

    /// Posts a signal for an arbitrary item, bypassing subscriptions.
    pub fn send_raw(&self, item: ItemId, kind: SignalKind) -> bool {
        let script = self.0.lock();
        script
            .signals
            .as_ref()
            .is_some_and(|signals| signals.send(item, kind))
    }

    /// Posts a periodic tick through the time subscription.
    pub fn tick(&self, position: Duration) -> bool {
        let script = self.0.lock();
        match (script.item, script.time_sink.as_ref()) {
            (Some(item), Some(sink)) => sink.emit(item, SignalKind::Tick(position)),
            _ => false,
        }
    }

    pub fn time_subscribed(&self) -> bool {
        self.0
            .lock()
            .time_sink
            .as_ref()
            .is_some_and(SignalSink::is_active)
    }

    pub fn item_subscribed(&self) -> bool {
        self.0
            .lock()
            .item_sink
            .as_ref()
            .is_some_and(SignalSink::is_active)
    }

    /// Reports every seek issued so far as completed.
    pub fn complete_seeks(&self) {
        let mut script = self.0.lock();
        let seeks = std::mem::take(&mut script.seeks);
        if let (Some(item), Some(signals)) = (script.item, script.signals.as_ref()) {
            for ticket in seeks {
                signals.send(item, SignalKind::SeekCompleted(ticket));
            }
        }
    }
}

impl Backend for ScriptedBackend {
    type Resource = ScriptedResource;

    fn create_resource(
        &mut self,
        _target: &RenderTarget,
        signals: SignalSender,
    ) -> Result<ScriptedResource, Error> {
        let mut script = self.0.lock();
        if script.fail_create {
            return Err(Error::Backend("no decoder available".into()));
        }
        script.resources_created += 1;
        script.signals = Some(signals);
        Ok(ScriptedResource(Arc::clone(&self.0)))
    }
}

pub struct ScriptedResource(Arc<Mutex<Script>>);

impl PlaybackResource for ScriptedResource {
    fn load(&mut self, item: &MediaItem) -> Result<(), Error> {
        let mut script = self.0.lock();
        script.calls.push(Call::Load(item.url().to_string()));
        script.item = Some(item.id());
        Ok(())
    }

    fn unload(&mut self) {
        let mut script = self.0.lock();
        script.calls.push(Call::Unload);
        script.item = None;
    }

    fn play(&mut self) {
        self.0.lock().calls.push(Call::Play);
    }

    fn pause(&mut self) {
        self.0.lock().calls.push(Call::Pause);
    }

    fn seek(&mut self, position: Duration, ticket: SeekTicket) {
        let mut script = self.0.lock();
        script.calls.push(Call::Seek(position));
        script.position = position;
        script.seeks.push(ticket);
    }

    fn position(&self) -> Duration {
        self.0.lock().position
    }

    fn duration(&self) -> Option<Duration> {
        let script = self.0.lock();
        script.item.and(script.duration)
    }

    fn failure_reason(&self) -> Option<String> {
        self.0.lock().failure.clone()
    }

    fn observe_item(&mut self, _item: &MediaItem) -> Subscription {
        let mut script = self.0.lock();
        let signals = script.signals.clone().expect("resource was created with signals");
        let (subscription, sink) = signals.subscribe();
        script.item_sink = Some(sink);
        subscription
    }

    fn observe_time(&mut self, _interval: Duration) -> Subscription {
        let mut script = self.0.lock();
        let signals = script.signals.clone().expect("resource was created with signals");
        let (subscription, sink) = signals.subscribe();
        script.time_sink = Some(sink);
        subscription
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    State(PlaybackState),
    Time(TimeUpdate),
    Finished,
    Failed(PlaybackError),
}

#[derive(Default)]
pub struct Recorder(Mutex<Vec<Event>>);

impl Recorder {
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.0.lock())
    }
}

impl PlaybackObserver for Recorder {
    fn on_state_changed(&self, state: PlaybackState) {
        self.0.lock().push(Event::State(state));
    }

    fn on_time_updated(&self, update: TimeUpdate) {
        self.0.lock().push(Event::Time(update));
    }

    fn on_finished(&self) {
        self.0.lock().push(Event::Finished);
    }

    fn on_failed(&self, error: PlaybackError) {
        self.0.lock().push(Event::Failed(error));
    }
}

pub struct Harness {
    pub machine: PlaybackStateMachine<ScriptedBackend>,
    pub backend: ScriptedBackend,
    pub observer: Arc<Recorder>,
    pub surface: VideoSurface,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(PlayerConfig::default())
    }

    /// A configured machine with an observer, nothing prepared yet.
    pub fn with_config(config: PlayerConfig) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let backend = ScriptedBackend::default();
        let surface = VideoSurface::new();
        let observer = Arc::new(Recorder::default());

        let mut machine = PlaybackStateMachine::with_config(backend.clone(), config);
        machine.set_observer(&observer);
        machine.configure(surface.render_target());

        Self {
            machine,
            backend,
            observer,
            surface,
        }
    }

    /// Drives the machine into `state`, then forgets the events and calls it took.
    pub fn drive_to(&mut self, state: PlaybackState) {
        use gpui_playback::ItemStatus;

        if state != PlaybackState::Unknown {
            self.machine.prepare(MOVIE).expect("prepare succeeds");
        }
        match state {
            PlaybackState::Unknown | PlaybackState::Preparing => {}
            PlaybackState::Buffering => {
                self.backend.emit(SignalKind::BufferEmpty);
            }
            PlaybackState::Error => {
                self.backend.emit(SignalKind::Status(ItemStatus::Failed));
            }
            PlaybackState::Playing
            | PlaybackState::Paused
            | PlaybackState::Stopped
            | PlaybackState::Ended => {
                self.backend.emit(SignalKind::Status(ItemStatus::ReadyToPlay));
            }
        }
        self.machine.pump();

        match state {
            PlaybackState::Paused => self.machine.pause(),
            PlaybackState::Stopped => self.machine.stop(),
            PlaybackState::Ended => {
                self.backend.emit(SignalKind::EndOfMedia);
                self.machine.pump();
            }
            _ => {}
        }

        assert_eq!(self.machine.current_state(), state);
        self.observer.take();
        self.backend.take_calls();
    }
}
