use crate::surface::{VideoFrame, VideoSurface};
use gpui::{
    Element, ElementId, GlobalElementId, InspectorElementId, IntoElement, LayoutId, Window,
};
use yuv::{YuvBiPlanarImage, YuvConversionMode, YuvRange, YuvStandardMatrix, yuv_nv12_to_rgba};

/// Conversions tried in order: HD full range, HD limited range, SD limited range.
const CONVERSIONS: [(YuvRange, YuvStandardMatrix); 3] = [
    (YuvRange::Full, YuvStandardMatrix::Bt709),
    (YuvRange::Limited, YuvStandardMatrix::Bt709),
    (YuvRange::Limited, YuvStandardMatrix::Bt601),
];

/// Paints the frames presented to a [`VideoSurface`].
pub struct SurfaceElement {
    surface: VideoSurface,
    display_width: Option<gpui::Pixels>,
    display_height: Option<gpui::Pixels>,
    element_id: Option<ElementId>,
    animate: bool,
}

impl SurfaceElement {
    pub fn new(surface: VideoSurface) -> Self {
        Self {
            surface,
            display_width: None,
            display_height: None,
            element_id: None,
            animate: false,
        }
    }

    pub fn id(mut self, id: impl Into<ElementId>) -> Self {
        self.element_id = Some(id.into());
        self
    }

    pub fn size(mut self, width: gpui::Pixels, height: gpui::Pixels) -> Self {
        self.display_width = Some(width);
        self.display_height = Some(height);
        self
    }

    /// Keep requesting frames while media is expected to change.
    pub fn animate(mut self, animate: bool) -> Self {
        self.animate = animate;
        self
    }

    /// Explicit size, or the natural size of the current frame.
    fn display_size(&self) -> (gpui::Pixels, gpui::Pixels) {
        match (self.display_width, self.display_height) {
            (Some(w), Some(h)) => (w, h),
            _ => {
                let (width, height) = self
                    .surface
                    .current_frame()
                    .map_or((0, 0), |frame| (frame.width, frame.height));
                (gpui::px(width as f32), gpui::px(height as f32))
            }
        }
    }
}

/// Converts a packed NV12 frame to RGBA. Unconvertible frames come out black.
fn nv12_to_rgba(frame: &VideoFrame) -> Vec<u8> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let y_size = width * height;
    let uv_size = y_size / 2;
    let mut rgba = vec![0u8; y_size * 4];

    if frame.data.len() < y_size + uv_size {
        return rgba;
    }

    let image = YuvBiPlanarImage {
        y_plane: &frame.data[..y_size],
        y_stride: frame.width,
        uv_plane: &frame.data[y_size..y_size + uv_size],
        uv_stride: frame.width,
        width: frame.width,
        height: frame.height,
    };

    for (range, matrix) in CONVERSIONS {
        if yuv_nv12_to_rgba(
            &image,
            &mut rgba,
            frame.width * 4,
            range,
            matrix,
            YuvConversionMode::Balanced,
        )
        .is_ok()
        {
            return rgba;
        }
    }

    rgba.fill(0);
    rgba
}

impl Element for SurfaceElement {
    type RequestLayoutState = ();
    type PrepaintState = ();

    fn id(&self) -> Option<ElementId> {
        self.element_id.clone()
    }

    fn source_location(&self) -> Option<&'static core::panic::Location<'static>> {
        None
    }

    fn request_layout(
        &mut self,
        _global_id: Option<&GlobalElementId>,
        _inspector_id: Option<&InspectorElementId>,
        window: &mut Window,
        cx: &mut gpui::App,
    ) -> (LayoutId, Self::RequestLayoutState) {
        let (width, height) = self.display_size();

        let style = gpui::Style {
            size: gpui::Size {
                width: gpui::Length::Definite(gpui::DefiniteLength::Absolute(
                    gpui::AbsoluteLength::Pixels(width),
                )),
                height: gpui::Length::Definite(gpui::DefiniteLength::Absolute(
                    gpui::AbsoluteLength::Pixels(height),
                )),
            },
            ..Default::default()
        };

        let layout_id = window.request_layout(style, [], cx);
        (layout_id, ())
    }

    fn prepaint(
        &mut self,
        _global_id: Option<&GlobalElementId>,
        _inspector_id: Option<&InspectorElementId>,
        _bounds: gpui::Bounds<gpui::Pixels>,
        _request_layout_state: &mut Self::RequestLayoutState,
        window: &mut Window,
        _cx: &mut gpui::App,
    ) -> Self::PrepaintState {
        let has_new_frame = self.surface.take_frame_ready();
        if self.animate || has_new_frame {
            window.request_animation_frame();
        }
    }

    fn paint(
        &mut self,
        _global_id: Option<&GlobalElementId>,
        _inspector_id: Option<&InspectorElementId>,
        bounds: gpui::Bounds<gpui::Pixels>,
        _request_layout_state: &mut Self::RequestLayoutState,
        _prepaint_state: &mut Self::PrepaintState,
        window: &mut Window,
        _cx: &mut gpui::App,
    ) {
        let Some(frame) = self.surface.current_frame() else {
            return;
        };
        let rgba = nv12_to_rgba(&frame);

        use image::{ImageBuffer, Rgba};
        use smallvec::SmallVec;

        let Some(image_buffer) =
            ImageBuffer::<Rgba<u8>, _>::from_raw(frame.width, frame.height, rgba)
        else {
            return;
        };
        let frames: SmallVec<[image::Frame; 1]> =
            SmallVec::from_elem(image::Frame::new(image_buffer), 1);
        let render_image = std::sync::Arc::new(gpui::RenderImage::new(frames));

        let area = (f32::from(bounds.size.width), f32::from(bounds.size.height));
        let (width, height) = self
            .surface
            .content_fit()
            .fitted_size((frame.width as f32, frame.height as f32), area);
        let origin = gpui::point(
            bounds.origin.x + gpui::px((area.0 - width) / 2.0),
            bounds.origin.y + gpui::px((area.1 - height) / 2.0),
        );
        let target = gpui::Bounds::new(origin, gpui::size(gpui::px(width), gpui::px(height)));

        window.with_content_mask(Some(gpui::ContentMask { bounds }), |window| {
            window
                .paint_image(target, gpui::Corners::default(), render_image, 0, false)
                .ok();
        });
    }
}

impl IntoElement for SurfaceElement {
    type Element = Self;

    fn into_element(self) -> Self::Element {
        self
    }
}

/// Helper function to create a surface element.
pub fn surface_element(surface: VideoSurface) -> SurfaceElement {
    SurfaceElement::new(surface)
}
