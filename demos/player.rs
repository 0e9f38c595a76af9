use gpui::{App, Application, Context, Entity, Render, Window, WindowOptions, div, prelude::*};
use gpui_playback::{
    GstBackend, PlaybackError, PlaybackObserver, PlaybackState, PlayerConfig, PlayerView,
    TimeReporting, TimeUpdate,
};
use std::sync::Arc;

struct LogObserver;

impl PlaybackObserver for LogObserver {
    fn on_state_changed(&self, state: PlaybackState) {
        log::info!("state: {state}");
    }

    fn on_time_updated(&self, update: TimeUpdate) {
        if let TimeUpdate::Formatted {
            elapsed, remaining, ..
        } = update
        {
            log::info!("{elapsed} / -{remaining}");
        }
    }

    fn on_finished(&self) {
        log::info!("finished");
    }

    fn on_failed(&self, error: PlaybackError) {
        log::error!("{error}");
    }
}

struct PlayerDemo {
    player: Entity<PlayerView<GstBackend>>,
    _observer: Arc<LogObserver>,
}

impl Render for PlayerDemo {
    fn render(&mut self, _window: &mut Window, _cx: &mut Context<Self>) -> impl IntoElement {
        div().size_full().child(self.player.clone())
    }
}

fn main() {
    env_logger::init();
    let url = std::env::args()
        .nth(1)
        .expect("usage: player <media url>");

    Application::new().run(move |cx: &mut App| {
        cx.open_window(
            WindowOptions {
                focus: true,
                ..Default::default()
            },
            |_, cx| {
                let observer = Arc::new(LogObserver);
                let config = PlayerConfig::default().time_reporting(TimeReporting::Formatted);
                let mut view = PlayerView::new(GstBackend::new(), config);
                view.machine_mut().set_observer(&observer);
                if let Err(err) = view.machine_mut().prepare(&url) {
                    log::error!("cannot play {url}: {err}");
                }

                let player = cx.new(|_| view);
                cx.new(|_| PlayerDemo {
                    player,
                    _observer: observer,
                })
            },
        )
        .unwrap();
        cx.activate(true);
    });
}
