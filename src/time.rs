//! Time reporting shared by periodic ticks and seeks.

use std::time::Duration;

/// How time updates are shaped before they reach the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeReporting {
    /// Raw elapsed/remaining seconds.
    #[default]
    Seconds,
    /// `HH:MM:SS` strings plus the played fraction.
    Formatted,
}

/// A time update delivered to the observer.
///
/// See [`PlaybackObserver::on_time_updated`](crate::PlaybackObserver::on_time_updated).
#[derive(Debug, Clone, PartialEq)]
pub enum TimeUpdate {
    Seconds {
        elapsed: f64,
        remaining: f64,
    },
    Formatted {
        elapsed: String,
        remaining: String,
        fraction: f64,
    },
}

/// Playback progress against a finite duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    elapsed: f64,
    remaining: f64,
    fraction: f64,
}

impl Progress {
    /// Computes progress for `position` within `duration`.
    ///
    /// The elapsed time is clamped to `0..=duration`, so the fraction always
    /// lies within `0..=1`. A zero-length duration reports a fraction of 0.
    pub fn new(position: Duration, duration: Duration) -> Self {
        let total = duration.as_secs_f64();
        let elapsed = position.as_secs_f64().clamp(0.0, total);
        let fraction = if total > 0.0 { elapsed / total } else { 0.0 };

        Self {
            elapsed,
            remaining: total - elapsed,
            fraction,
        }
    }

    pub fn report(&self, reporting: TimeReporting) -> TimeUpdate {
        match reporting {
            TimeReporting::Seconds => TimeUpdate::Seconds {
                elapsed: self.elapsed,
                remaining: self.remaining,
            },
            TimeReporting::Formatted => TimeUpdate::Formatted {
                elapsed: format_clock(self.elapsed),
                remaining: format_clock(self.remaining),
                fraction: self.fraction,
            },
        }
    }
}

/// Formats seconds as `HH:MM:SS`, rounding to the nearest whole second.
pub fn format_clock(seconds: f64) -> String {
    let total_secs = if seconds.is_finite() {
        seconds.max(0.0).round() as u64
    } else {
        0
    };
    let hours = total_secs / 3600;
    let minutes = (total_secs / 60) % 60;
    let secs = total_secs % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_clock_handles_zero() {
        assert_eq!(format_clock(0.0), "00:00:00");
    }

    #[test]
    fn format_clock_handles_hours() {
        assert_eq!(format_clock(3661.0), "01:01:01");
    }

    #[test]
    fn format_clock_rounds_instead_of_truncating() {
        assert_eq!(format_clock(59.6), "00:01:00");
        assert_eq!(format_clock(59.4), "00:00:59");
    }

    #[test]
    fn format_clock_handles_negative() {
        assert_eq!(format_clock(-10.0), "00:00:00");
    }

    #[test]
    fn format_clock_does_not_cap_hours() {
        assert_eq!(format_clock(100.0 * 3600.0), "100:00:00");
    }

    #[test]
    fn progress_clamps_past_the_end() {
        let progress = Progress::new(Duration::from_secs(120), Duration::from_secs(100));
        assert_eq!(progress.elapsed, 100.0);
        assert_eq!(progress.remaining, 0.0);
        assert_eq!(progress.fraction, 1.0);
    }

    #[test]
    fn progress_on_empty_media() {
        let progress = Progress::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(progress.fraction, 0.0);
        assert_eq!(progress.remaining, 0.0);
    }

    #[test]
    fn formatted_report_carries_fraction() {
        let progress = Progress::new(Duration::from_secs(30), Duration::from_secs(120));
        assert_eq!(
            progress.report(TimeReporting::Formatted),
            TimeUpdate::Formatted {
                elapsed: "00:00:30".into(),
                remaining: "00:01:30".into(),
                fraction: 0.25,
            }
        );
    }
}
