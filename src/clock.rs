//! Wall-clock time for the hands and the animation phase of the strip.

use std::f32::consts::TAU;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use iced::time::Instant;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// One full travel of the twist around the ring.
pub(crate) const ANIMATION_PERIOD: Duration = Duration::from_secs(10);

/// Time of day in seconds since midnight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ClockTime {
    seconds: f64,
}

/// Hand angles in radians, clockwise from twelve o'clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HandAngles {
    pub(crate) hour: f32,
    pub(crate) minute: f32,
    pub(crate) second: f32,
}

impl ClockTime {
    pub(crate) fn from_seconds_of_day(seconds: f64) -> Self {
        Self {
            seconds: seconds.rem_euclid(SECONDS_PER_DAY),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_hms(hours: u32, minutes: u32, seconds: f64) -> Self {
        Self::from_seconds_of_day(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
    }

    /// Reads the system clock, shifted by `utc_offset_hours`.
    pub(crate) fn now(utc_offset_hours: f32) -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        Self::from_seconds_of_day(since_epoch + utc_offset_hours as f64 * 3600.0)
    }

    pub(crate) fn hand_angles(&self) -> HandAngles {
        let hours = (self.seconds / 3600.0) % 12.0;
        let minutes = (self.seconds / 60.0) % 60.0;
        let whole_seconds = (self.seconds % 60.0).floor();

        HandAngles {
            hour: (hours / 12.0 * TAU as f64) as f32,
            minute: (minutes / 60.0 * TAU as f64) as f32,
            second: (whole_seconds / 60.0 * TAU as f64) as f32,
        }
    }
}

/// Animation clock fed by frame ticks.
///
/// Only time that passes while running counts, so pausing and resuming does
/// not make the strip jump.
#[derive(Debug, Clone)]
pub(crate) struct Animation {
    elapsed: Duration,
    last_tick: Option<Instant>,
    running: bool,
}

impl Animation {
    pub(crate) fn new(running: bool) -> Self {
        Self {
            elapsed: Duration::ZERO,
            last_tick: None,
            running,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn set_running(&mut self, running: bool) {
        if running != self.running {
            self.running = running;
            self.last_tick = None;
        }
    }

    pub(crate) fn tick(&mut self, now: Instant) {
        if self.running {
            if let Some(last) = self.last_tick {
                self.elapsed += now.saturating_duration_since(last);
            }
            self.last_tick = Some(now);
        }
    }

    /// Torsion angle of the strip, one turn per [`ANIMATION_PERIOD`].
    pub(crate) fn torsion(&self) -> f32 {
        torsion_at(self.elapsed)
    }
}

pub(crate) fn torsion_at(elapsed: Duration) -> f32 {
    let period = ANIMATION_PERIOD.as_secs_f64();
    let phase = elapsed.as_secs_f64() % period / period;
    (phase * TAU as f64) as f32
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI};

    use super::*;
    use crate::geometry::tests::assert_close;

    #[test]
    fn noon_puts_every_hand_at_twelve() {
        let angles = ClockTime::from_hms(12, 0, 0.0).hand_angles();
        assert_eq!(angles, HandAngles { hour: 0.0, minute: 0.0, second: 0.0 });
    }

    #[test]
    fn quarter_past_three() {
        let angles = ClockTime::from_hms(15, 15, 30.0).hand_angles();
        // The hour hand has moved a quarter of the way towards four.
        assert_close(angles.hour, FRAC_PI_2 + TAU / 12.0 * 0.2583, 1e-3);
        assert_close(angles.minute, FRAC_PI_2 + TAU / 120.0, 1e-5);
        assert_close(angles.second, PI, 1e-6);
    }

    #[test]
    fn second_hand_ticks_in_whole_seconds() {
        let a = ClockTime::from_seconds_of_day(10.2).hand_angles();
        let b = ClockTime::from_seconds_of_day(10.9).hand_angles();
        assert_eq!(a.second, b.second);
        assert!(a.minute < b.minute);
    }

    #[test]
    fn times_wrap_into_one_day() {
        let late = ClockTime::from_seconds_of_day(SECONDS_PER_DAY + 5.0);
        assert_eq!(late, ClockTime::from_seconds_of_day(5.0));
        let early = ClockTime::from_seconds_of_day(-60.0);
        assert_eq!(early, ClockTime::from_hms(23, 59, 0.0));
    }

    #[test]
    fn torsion_completes_a_turn_every_period() {
        assert_close(torsion_at(Duration::ZERO), 0.0, 1e-6);
        assert_close(torsion_at(Duration::from_millis(2500)), FRAC_PI_2, 1e-5);
        assert_close(torsion_at(ANIMATION_PERIOD + Duration::from_secs(5)), PI, 1e-5);
    }

    #[test]
    fn paused_animation_ignores_ticks() {
        let start = Instant::now();
        let mut animation = Animation::new(false);
        animation.tick(start);
        animation.tick(start + Duration::from_secs(3));
        assert_eq!(animation.torsion(), 0.0);
    }

    #[test]
    fn resuming_does_not_count_paused_time() {
        let start = Instant::now();
        let mut animation = Animation::new(true);
        animation.tick(start);
        animation.tick(start + Duration::from_secs(1));
        animation.set_running(false);
        animation.tick(start + Duration::from_secs(5));
        animation.set_running(true);
        animation.tick(start + Duration::from_secs(6));
        animation.tick(start + Duration::from_secs(7));
        assert_eq!(animation.torsion(), torsion_at(Duration::from_secs(2)));
        assert!(animation.is_running());
    }
}
