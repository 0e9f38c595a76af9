use crate::surface::ContentFit;
use crate::time::TimeReporting;
use std::time::Duration;

/// Interval between periodic time updates.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Settings for a [`PlaybackStateMachine`](crate::PlaybackStateMachine).
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    tick_interval: Duration,
    time_reporting: TimeReporting,
    content_fit: ContentFit,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            time_reporting: TimeReporting::default(),
            content_fit: ContentFit::default(),
        }
    }
}

impl PlayerConfig {
    /// Set how often periodic time updates fire. Zero falls back to the default.
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = if interval.is_zero() {
            DEFAULT_TICK_INTERVAL
        } else {
            interval
        };
        self
    }

    /// Set the shape of time updates.
    pub fn time_reporting(mut self, reporting: TimeReporting) -> Self {
        self.time_reporting = reporting;
        self
    }

    /// Set the content fit applied when an item is prepared.
    pub fn content_fit(mut self, fit: ContentFit) -> Self {
        self.content_fit = fit;
        self
    }

    pub fn get_tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn get_time_reporting(&self) -> TimeReporting {
        self.time_reporting
    }

    pub fn get_content_fit(&self) -> ContentFit {
        self.content_fit
    }
}
