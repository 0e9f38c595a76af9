use crate::config::PlayerConfig;
use crate::element::surface_element;
use crate::machine::PlaybackStateMachine;
use crate::resource::Backend;
use crate::state::PlaybackState;
use crate::surface::{PresentationSurface, VideoSurface};
use gpui::{Context, IntoElement, ParentElement, Render, Styled, Window, div};

/// A gpui view owning a state machine and the surface it renders into.
///
/// Every render drains the signals queued by the resource, so backend
/// threads only ever affect playback state on the UI thread.
pub struct PlayerView<B: Backend> {
    machine: PlaybackStateMachine<B>,
    surface: VideoSurface,
}

impl<B: Backend> PlayerView<B> {
    /// Create a view whose state machine is already configured with its surface.
    pub fn new(backend: B, config: PlayerConfig) -> Self {
        let surface = VideoSurface::new();
        let mut machine = PlaybackStateMachine::with_config(backend, config);
        machine.configure(surface.render_target());
        Self { machine, surface }
    }

    pub fn machine(&self) -> &PlaybackStateMachine<B> {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut PlaybackStateMachine<B> {
        &mut self.machine
    }

    pub fn surface(&self) -> &VideoSurface {
        &self.surface
    }

    /// Whether the view has to keep rendering to pick up signals.
    fn needs_frames(&self) -> bool {
        if self.machine.is_seeking() {
            return true;
        }
        self.machine.has_resource()
            && matches!(
                self.machine.current_state(),
                PlaybackState::Preparing | PlaybackState::Buffering | PlaybackState::Playing
            )
    }
}

impl<B> Render for PlayerView<B>
where
    B: Backend + 'static,
    B::Resource: 'static,
{
    fn render(&mut self, _window: &mut Window, _cx: &mut Context<Self>) -> impl IntoElement {
        self.machine.pump();

        div()
            .size_full()
            .flex()
            .items_center()
            .justify_center()
            .child(surface_element(self.surface.clone()).animate(self.needs_frames()))
    }
}

/// Helper function to create a player view with the default configuration.
pub fn player_view<B: Backend>(backend: B) -> PlayerView<B> {
    PlayerView::new(backend, PlayerConfig::default())
}
