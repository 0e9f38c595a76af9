//! Presentation surface and the render target handle resources draw into.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Content fit modes for video display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentFit {
    /// Scale to fit inside the area, preserving aspect ratio.
    #[default]
    Contain,
    /// Scale to cover the whole area, preserving aspect ratio.
    Cover,
    /// Stretch to the area.
    Fill,
    /// Like `Contain`, but never scale up.
    ScaleDown,
    /// Natural size.
    None,
}

impl ContentFit {
    /// Size the media takes up inside `area` (both as `(width, height)`).
    pub fn fitted_size(self, media: (f32, f32), area: (f32, f32)) -> (f32, f32) {
        let (mw, mh) = media;
        let (aw, ah) = area;
        if mw <= 0.0 || mh <= 0.0 {
            return (0.0, 0.0);
        }

        let contain = (aw / mw).min(ah / mh);
        let scale = match self {
            ContentFit::Fill => return area,
            ContentFit::None => 1.0,
            ContentFit::Contain => contain,
            ContentFit::Cover => (aw / mw).max(ah / mh),
            ContentFit::ScaleDown => contain.min(1.0),
        };
        (mw * scale, mh * scale)
    }
}

/// A decoded NV12 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Default)]
struct SurfaceShared {
    frame: Mutex<Option<VideoFrame>>,
    frame_ready: AtomicBool,
    fit: Mutex<ContentFit>,
}

/// Non-owning handle to a surface's frame slot.
///
/// The handle stays the same across media swaps. Frames presented after the
/// owning surface is gone are dropped.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    shared: Weak<SurfaceShared>,
}

impl RenderTarget {
    /// Returns true while the owning surface exists.
    pub fn is_alive(&self) -> bool {
        self.shared.strong_count() > 0
    }

    /// Hands a new frame to the surface. Returns false if the surface is gone.
    pub fn present(&self, frame: VideoFrame) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        *shared.frame.lock() = Some(frame);
        shared.frame_ready.store(true, Ordering::SeqCst);
        true
    }

    /// Drops the frame currently shown.
    pub fn clear(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.frame.lock().take();
            shared.frame_ready.store(true, Ordering::SeqCst);
        }
    }

    pub fn set_content_fit(&self, fit: ContentFit) {
        if let Some(shared) = self.shared.upgrade() {
            *shared.fit.lock() = fit;
        }
    }

    pub fn same_target(&self, other: &RenderTarget) -> bool {
        self.shared.ptr_eq(&other.shared)
    }
}

/// Anything that can hand out a stable [`RenderTarget`].
pub trait PresentationSurface {
    fn render_target(&self) -> RenderTarget;
}

/// Surface backing a [`PlayerView`](crate::PlayerView).
#[derive(Debug, Clone, Default)]
pub struct VideoSurface {
    shared: Arc<SurfaceShared>,
}

impl VideoSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the "new frame" flag.
    pub fn take_frame_ready(&self) -> bool {
        self.shared.frame_ready.swap(false, Ordering::SeqCst)
    }

    /// Get the current NV12 frame if one was presented.
    pub fn current_frame(&self) -> Option<VideoFrame> {
        self.shared.frame.lock().clone()
    }

    pub fn content_fit(&self) -> ContentFit {
        *self.shared.fit.lock()
    }

    pub fn set_content_fit(&self, fit: ContentFit) {
        *self.shared.fit.lock() = fit;
    }
}

impl PresentationSurface for VideoSurface {
    fn render_target(&self) -> RenderTarget {
        RenderTarget {
            shared: Arc::downgrade(&self.shared),
        }
    }
}
