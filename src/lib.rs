//! # GPUI Playback
//!
//! A playback state machine for GPUI applications, with a GStreamer-backed
//! resource and a surface element that renders its frames.
//!
//! ## Features
//!
//! - A small, validated state machine (`preparing`, `buffering`, `playing`,
//!   `paused`, `stopped`, `ended`, `error`)
//! - Observer callbacks for state changes, time updates, end of media and failures
//! - Periodic time updates as raw seconds or `HH:MM:SS` strings
//! - Backend signals queued and applied on the UI thread only
//! - GStreamer-powered decoding with CPU-based NV12 to RGBA conversion
//! - Content fit modes for the rendered video
//!
//! ## Example
//!
//! ```no_run
//! use gpui_playback::{
//!     GstBackend, PlaybackError, PlaybackObserver, PlaybackState, PlayerConfig, PlayerView,
//!     TimeReporting, TimeUpdate,
//! };
//! use std::sync::Arc;
//!
//! struct Log;
//!
//! impl PlaybackObserver for Log {
//!     fn on_state_changed(&self, state: PlaybackState) {
//!         println!("state: {state}");
//!     }
//!     fn on_time_updated(&self, update: TimeUpdate) {
//!         println!("time: {update:?}");
//!     }
//!     fn on_finished(&self) {}
//!     fn on_failed(&self, error: PlaybackError) {
//!         eprintln!("{error}");
//!     }
//! }
//!
//! let observer = Arc::new(Log);
//! let config = PlayerConfig::default().time_reporting(TimeReporting::Formatted);
//! let mut view = PlayerView::new(GstBackend::new(), config);
//! view.machine_mut().set_observer(&observer);
//! view.machine_mut().prepare("file:///path/to/video.mp4").ok();
//! // Hand `view` to `cx.new(|_| view)` and render it inside your window.
//! ```

mod config;
mod element;
mod error;
mod machine;
mod observer;
mod pipeline;
mod player_view;
mod resource;
mod signal;
mod state;
mod surface;
mod time;

pub use config::{DEFAULT_TICK_INTERVAL, PlayerConfig};
pub use element::{SurfaceElement, surface_element};
pub use error::{Error, PlaybackError, PlaybackErrorKind};
pub use machine::PlaybackStateMachine;
pub use observer::PlaybackObserver;
pub use pipeline::{GstBackend, GstResource};
pub use player_view::{PlayerView, player_view};
pub use resource::{Backend, MediaItem, PlaybackResource};
pub use signal::{
    ItemId, ItemStatus, SeekTicket, Signal, SignalKind, SignalSender, SignalSink, Subscription,
};
pub use state::PlaybackState;
pub use surface::{ContentFit, PresentationSurface, RenderTarget, VideoFrame, VideoSurface};
pub use time::{Progress, TimeReporting, TimeUpdate, format_clock};

// Re-export commonly used types
pub use gstreamer as gst;
pub use url::Url;
