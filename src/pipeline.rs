//! GStreamer implementation of [`PlaybackResource`].
//!
//! One `playbin` pipeline is created per resource and reused for every item
//! by swapping its `uri`. Three kinds of threads run next to it:
//!
//! - a frame worker copying decoded NV12 samples into the render target,
//! - a bus worker translating bus messages into [`SignalKind`]s,
//! - one timer per time subscription posting position ticks.
//!
//! None of them touch playback state; they only post signals. All of them are
//! joined when the resource is dropped.

use crate::Error;
use crate::resource::{Backend, MediaItem, PlaybackResource};
use crate::signal::{
    ItemId, ItemStatus, SeekTicket, SignalKind, SignalSender, SignalSink, Subscription,
};
use crate::surface::{RenderTarget, VideoFrame};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use gstreamer as gst;
use gstreamer_app as gst_app;
use gstreamer_app::prelude::*;
use gstreamer_video as gst_video;
use gstreamer_video::VideoFrameExt;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

const SINK_NAME: &str = "gpui_playback";
const PULL_TIMEOUT_MS: u64 = 16;
const BUS_TIMEOUT_MS: u64 = 100;

/// Creates [`GstResource`]s.
#[derive(Debug, Clone)]
pub struct GstBackend {
    accurate_seek: bool,
}

impl Default for GstBackend {
    fn default() -> Self {
        Self {
            accurate_seek: true,
        }
    }
}

impl GstBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seek to the exact position instead of the nearest keyframe.
    pub fn accurate_seek(mut self, accurate: bool) -> Self {
        self.accurate_seek = accurate;
        self
    }
}

impl Backend for GstBackend {
    type Resource = GstResource;

    fn create_resource(
        &mut self,
        target: &RenderTarget,
        signals: SignalSender,
    ) -> Result<GstResource, Error> {
        GstResource::new(target.clone(), signals, self.accurate_seek)
    }
}

/// Per-item bookkeeping shared with the bus worker.
#[derive(Debug, Default)]
struct ItemState {
    item: Option<ItemId>,
    sink: Option<SignalSink>,
    failure: Option<String>,
    pending_seek: Option<SeekTicket>,
    ready: bool,
    buffering: bool,
}

impl ItemState {
    fn emit(&self, item: ItemId, kind: SignalKind) {
        if let Some(sink) = &self.sink {
            sink.emit(item, kind);
        }
    }
}

#[derive(Debug, Default)]
struct Shared(Mutex<ItemState>);

impl Shared {
    fn begin(&self, item: ItemId) {
        *self.0.lock() = ItemState {
            item: Some(item),
            ..ItemState::default()
        };
    }

    fn end(&self) {
        *self.0.lock() = ItemState::default();
    }

    fn current_item(&self) -> Option<ItemId> {
        self.0.lock().item
    }

    fn complete_seek(&self, signals: &SignalSender) {
        let mut state = self.0.lock();
        if let (Some(item), Some(ticket)) = (state.item, state.pending_seek.take()) {
            signals.send(item, SignalKind::SeekCompleted(ticket));
        }
    }

    /// Translates a bus message popped while `item` was current.
    ///
    /// Messages popped before an item swap are dropped, so they never reach
    /// the item that replaced it.
    fn handle_message(&self, item: ItemId, msg: &gst::Message, signals: &SignalSender) {
        let mut state = self.0.lock();
        if state.item != Some(item) {
            log::trace!("dropping {:?} for a replaced item", msg.type_());
            return;
        }

        match msg.view() {
            gst::MessageView::Eos(_) => state.emit(item, SignalKind::EndOfMedia),
            gst::MessageView::Error(err) => {
                log::error!("GStreamer error: {}", err.error());
                state.failure = Some(err.error().to_string());
                state.emit(item, SignalKind::Status(ItemStatus::Failed));
            }
            gst::MessageView::Buffering(buffering) => {
                let empty = buffering.percent() < 100;
                if std::mem::replace(&mut state.buffering, empty) != empty {
                    state.emit(
                        item,
                        if empty {
                            SignalKind::BufferEmpty
                        } else {
                            SignalKind::LikelyToKeepUp
                        },
                    );
                }
            }
            gst::MessageView::AsyncDone(_) => {
                if !std::mem::replace(&mut state.ready, true) {
                    state.emit(item, SignalKind::Status(ItemStatus::ReadyToPlay));
                }
                if let Some(ticket) = state.pending_seek.take() {
                    signals.send(item, SignalKind::SeekCompleted(ticket));
                }
            }
            _ => {}
        }
    }
}

/// A `playbin` pipeline rendering into a [`RenderTarget`].
#[derive(Debug)]
pub struct GstResource {
    pipeline: gst::Pipeline,
    signals: SignalSender,
    shared: Arc<Shared>,
    alive: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
    // Dropping the sender wakes every tick timer so it can be joined.
    stop_timers: Option<Sender<()>>,
    timers_stopped: Receiver<()>,
    accurate_seek: bool,
}

impl GstResource {
    fn new(
        target: RenderTarget,
        signals: SignalSender,
        accurate_seek: bool,
    ) -> Result<Self, Error> {
        gst::init()?;

        let description = format!(
            "playbin video-sink=\"videoscale ! videoconvert ! appsink name={SINK_NAME} drop=true caps=video/x-raw,format=NV12,pixel-aspect-ratio=1/1\""
        );
        let pipeline = gst::parse::launch(&description)?
            .downcast::<gst::Pipeline>()
            .map_err(|_| Error::Cast)?;

        let video_sink = pipeline
            .property::<gst::Element>("video-sink")
            .downcast::<gst::Bin>()
            .map_err(|_| Error::Cast)?
            .by_name(SINK_NAME)
            .ok_or(Error::Cast)?
            .downcast::<gst_app::AppSink>()
            .map_err(|_| Error::Cast)?;
        let bus = pipeline
            .bus()
            .ok_or_else(|| Error::Backend("pipeline has no bus".into()))?;

        let shared = Arc::new(Shared::default());
        let alive = Arc::new(AtomicBool::new(true));
        let (stop_timers, timers_stopped) = crossbeam_channel::bounded(0);

        let mut resource = Self {
            pipeline,
            signals,
            shared,
            alive,
            workers: Vec::new(),
            stop_timers: Some(stop_timers),
            timers_stopped,
            accurate_seek,
        };

        let frames = spawn_frame_worker(
            resource.pipeline.clone(),
            video_sink,
            target,
            Arc::clone(&resource.alive),
        )?;
        resource.workers.push(frames);

        let alive = Arc::clone(&resource.alive);
        let shared = Arc::clone(&resource.shared);
        let signals = resource.signals.clone();
        let messages = spawn("gpui-playback-bus", move || {
            while alive.load(Ordering::Acquire) {
                let item = shared.current_item();
                let msg = bus.timed_pop(gst::ClockTime::from_mseconds(BUS_TIMEOUT_MS));
                if let (Some(item), Some(msg)) = (item, msg) {
                    shared.handle_message(item, &msg, &signals);
                }
            }
        })?;
        resource.workers.push(messages);

        Ok(resource)
    }

    fn set_state(&self, state: gst::State) {
        if let Err(err) = self.pipeline.set_state(state) {
            log::error!("failed to set pipeline to {state:?}: {err}");
        }
    }
}

impl PlaybackResource for GstResource {
    fn load(&mut self, item: &MediaItem) -> Result<(), Error> {
        // playbin only accepts a new uri in READY or NULL
        discard_pending_messages(&self.pipeline)?;
        self.shared.begin(item.id());
        self.pipeline.set_property("uri", item.url().as_str());
        Ok(())
    }

    fn unload(&mut self) {
        self.set_state(gst::State::Null);
        self.shared.end();
    }

    fn play(&mut self) {
        self.set_state(gst::State::Playing);
    }

    fn pause(&mut self) {
        self.set_state(gst::State::Paused);
    }

    fn seek(&mut self, position: Duration, ticket: SeekTicket) {
        self.shared.0.lock().pending_seek = Some(ticket);

        let flags = gst::SeekFlags::FLUSH
            | if self.accurate_seek {
                gst::SeekFlags::ACCURATE
            } else {
                gst::SeekFlags::KEY_UNIT
            };
        let position = gst::ClockTime::from_nseconds(position.as_nanos() as u64);
        if let Err(err) = self.pipeline.seek_simple(flags, position) {
            log::error!("seek to {position} failed: {err}");
            self.shared.complete_seek(&self.signals);
        }
    }

    fn position(&self) -> Duration {
        Duration::from_nanos(
            self.pipeline
                .query_position::<gst::ClockTime>()
                .map_or(0, |pos| pos.nseconds()),
        )
    }

    fn duration(&self) -> Option<Duration> {
        self.pipeline
            .query_duration::<gst::ClockTime>()
            .map(|duration| Duration::from_nanos(duration.nseconds()))
    }

    fn failure_reason(&self) -> Option<String> {
        self.shared.0.lock().failure.clone()
    }

    fn observe_item(&mut self, item: &MediaItem) -> Subscription {
        let (subscription, sink) = self.signals.subscribe();
        let mut state = self.shared.0.lock();
        if state.item == Some(item.id()) {
            state.sink = Some(sink);
        }
        subscription
    }

    fn observe_time(&mut self, interval: Duration) -> Subscription {
        let (subscription, sink) = self.signals.subscribe();
        let pipeline = self.pipeline.clone();
        let shared = Arc::clone(&self.shared);

        let timer = spawn_ticker(interval, self.timers_stopped.clone(), sink, move || {
            if pipeline.current_state() != gst::State::Playing {
                return None;
            }
            let item = shared.current_item()?;
            let position = pipeline.query_position::<gst::ClockTime>()?;
            Some((item, Duration::from_nanos(position.nseconds())))
        });
        match timer {
            Ok(timer) => self.workers.push(timer),
            Err(err) => log::error!("time updates unavailable: {err}"),
        }
        subscription
    }
}

impl Drop for GstResource {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        self.stop_timers = None;
        if let Err(err) = self.pipeline.set_state(gst::State::Null) {
            log::error!("failed to shut down pipeline: {err}");
        }

        for worker in self.workers.drain(..) {
            if let Err(err) = worker.join() {
                match err.downcast_ref::<String>() {
                    Some(e) => log::error!("playback thread panicked: {e}"),
                    None => log::error!("playback thread panicked with unknown reason"),
                }
            }
        }
    }
}

fn spawn(name: &str, body: impl FnOnce() + Send + 'static) -> Result<JoinHandle<()>, Error> {
    std::thread::Builder::new()
        .name(name.to_string())
        .spawn(body)
        .map_err(|e| Error::Backend(format!("failed to spawn {name}: {e}")))
}

/// Moves the pipeline to NULL and drops every message still queued on its bus.
///
/// Messages about the previous uri must not be read once a new one is set.
fn discard_pending_messages(pipeline: &gst::Pipeline) -> Result<(), Error> {
    pipeline.set_state(gst::State::Null)?;
    if let Some(bus) = pipeline.bus() {
        bus.set_flushing(true);
        bus.set_flushing(false);
    }
    Ok(())
}

/// Spawns a timer posting `tick()` through `sink` every `interval`.
///
/// It exits once the subscription is dropped or `stop` is disconnected.
fn spawn_ticker(
    interval: Duration,
    stop: Receiver<()>,
    sink: SignalSink,
    tick: impl Fn() -> Option<(ItemId, Duration)> + Send + 'static,
) -> Result<JoinHandle<()>, Error> {
    spawn("gpui-playback-ticks", move || {
        while let Err(RecvTimeoutError::Timeout) = stop.recv_timeout(interval) {
            if !sink.is_active() {
                break;
            }
            if let Some((item, position)) = tick() {
                sink.emit(item, SignalKind::Tick(position));
            }
        }
    })
}

fn spawn_frame_worker(
    pipeline: gst::Pipeline,
    video_sink: gst_app::AppSink,
    target: RenderTarget,
    alive: Arc<AtomicBool>,
) -> Result<JoinHandle<()>, Error> {
    spawn("gpui-playback-frames", move || {
        let idle = Duration::from_millis(PULL_TIMEOUT_MS);
        let mut last_pts = None;

        while alive.load(Ordering::Acquire) {
            let playing = pipeline.current_state() == gst::State::Playing;
            let Some(sample) = pull_sample(&video_sink, playing, idle) else {
                continue;
            };

            // Paused pipelines hand out the same preroll sample on every pull.
            let pts = sample.buffer().and_then(|buffer| buffer.pts());
            if !playing && pts.is_some() && pts == last_pts {
                std::thread::sleep(idle);
                continue;
            }
            last_pts = pts;

            match copy_nv12(&sample) {
                Some(frame) => {
                    target.present(frame);
                }
                None => log::error!("error processing frame: unreadable sample"),
            }
        }
    })
}

/// Pulls the next sample, sleeping for `idle` when there is none.
///
/// A sink that is not prerolled yet or already reached end of stream
/// returns immediately.
fn pull_sample(
    video_sink: &gst_app::AppSink,
    playing: bool,
    idle: Duration,
) -> Option<gst::Sample> {
    let timeout = gst::ClockTime::from_mseconds(PULL_TIMEOUT_MS);
    let sample = if playing {
        video_sink.try_pull_sample(timeout)
    } else {
        video_sink.try_pull_preroll(timeout)
    };
    if sample.is_none() {
        std::thread::sleep(idle);
    }
    sample
}

/// Copies an NV12 sample into a tightly packed frame, dropping row padding.
fn copy_nv12(sample: &gst::Sample) -> Option<VideoFrame> {
    let info = gst_video::VideoInfo::from_caps(sample.caps()?).ok()?;
    let buffer = sample.buffer()?;
    let frame = gst_video::VideoFrameRef::from_buffer_ref_readable(buffer, &info).ok()?;

    let width = info.width() as usize;
    let height = info.height() as usize;
    let mut data = Vec::with_capacity(width * height * 3 / 2);

    for (plane, rows) in [(0u32, height), (1u32, height.div_ceil(2))] {
        let stride = frame.plane_stride()[plane as usize] as usize;
        let bytes = frame.plane_data(plane).ok()?;
        for row in bytes.chunks(stride).take(rows) {
            data.extend_from_slice(&row[..width.min(row.len())]);
        }
    }

    Some(VideoFrame {
        data,
        width: info.width(),
        height: info.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal;
    use std::time::Instant;

    fn init() {
        gst::init().expect("GStreamer initializes");
    }

    #[test]
    fn messages_popped_before_an_item_swap_are_dropped() {
        init();
        let (signals, rx) = signal::queue();
        let (_subscription, sink) = signals.subscribe();
        let shared = Shared::default();
        let previous = ItemId::next();
        let current = ItemId::next();
        shared.begin(current);
        shared.0.lock().sink = Some(sink);

        let eos = gst::message::Eos::new();
        shared.handle_message(previous, &eos, &signals);
        assert!(rx.try_recv().is_err());

        shared.handle_message(current, &eos, &signals);
        assert_eq!(rx.try_recv().map(|s| s.kind), Ok(SignalKind::EndOfMedia));
    }

    #[test]
    fn swapping_items_discards_queued_bus_messages() {
        init();
        let pipeline = gst::Pipeline::new();
        let bus = pipeline.bus().expect("pipelines have a bus");
        bus.post(gst::message::Eos::new()).expect("bus accepts messages");

        discard_pending_messages(&pipeline).expect("an empty pipeline can be stopped");
        assert!(bus.pop().is_none());
    }

    #[test]
    fn empty_pulls_back_off() {
        init();
        let sink = gst_app::AppSink::builder().build();
        let idle = Duration::from_millis(20);

        let started = Instant::now();
        assert!(pull_sample(&sink, true, idle).is_none());
        assert!(started.elapsed() >= idle);
    }

    #[test]
    fn ticker_posts_until_stopped() {
        let (signals, rx) = signal::queue();
        let (_subscription, sink) = signals.subscribe();
        let (stop, stopped) = crossbeam_channel::bounded(0);
        let item = ItemId::next();
        let timer = spawn_ticker(Duration::from_millis(5), stopped, sink, move || {
            Some((item, Duration::from_secs(3)))
        })
        .expect("timer spawns");

        let tick = rx.recv_timeout(Duration::from_secs(5)).expect("a tick arrives");
        assert_eq!(tick.kind, SignalKind::Tick(Duration::from_secs(3)));

        drop(stop);
        assert!(timer.join().is_ok());
    }

    #[test]
    fn stopping_interrupts_a_long_interval() {
        let (signals, _rx) = signal::queue();
        let (_subscription, sink) = signals.subscribe();
        let (stop, stopped) = crossbeam_channel::bounded::<()>(0);
        let timer = spawn_ticker(Duration::from_secs(3600), stopped, sink, || None)
            .expect("timer spawns");

        let started = Instant::now();
        drop(stop);
        assert!(timer.join().is_ok());
        assert!(started.elapsed() < Duration::from_secs(60));
    }
}
