//! Simulated time of day.
//!
//! A day is `DAY_LENGTH` clock units long. The clock drives both the
//! directional light colours and the skybox blend through a single
//! [`DayClock::day_weight`], which is `0.0` at night, `1.0` during the day and
//! ramps linearly through dawn and dusk.

use instant::Duration;

/// Clock units per simulated day.
pub const DAY_LENGTH: f32 = 24000.0;
/// Clock units added per real second with the default scale.
pub const DEFAULT_TIME_SCALE: f32 = 1000.0;

const DAWN_START: f32 = 5000.0;
const DAWN_END: f32 = 6000.0;
const DUSK_START: f32 = 21000.0;
const DUSK_END: f32 = 22000.0;

/// Coarse phase of the day. Transitions carry their progress in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DayPhase {
    Night,
    Dawn(f32),
    Day,
    Dusk(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayClock {
    time: f32,
    scale: f32,
}

impl DayClock {
    pub fn new(scale: f32) -> Self {
        Self { time: 0.0, scale }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_time(&mut self, time: f32) {
        self.time = wrap(time);
    }

    pub fn advance(&mut self, dt: Duration) {
        self.time = wrap(self.time + dt.as_secs_f32() * self.scale);
    }

    pub fn phase(&self) -> DayPhase {
        let t = self.time;
        if t < DAWN_START {
            DayPhase::Night
        } else if t < DAWN_END {
            DayPhase::Dawn((t - DAWN_START) / (DAWN_END - DAWN_START))
        } else if t < DUSK_START {
            DayPhase::Day
        } else if t < DUSK_END {
            DayPhase::Dusk((t - DUSK_START) / (DUSK_END - DUSK_START))
        } else {
            DayPhase::Night
        }
    }

    /// How much of the day palette is visible: 0 at night, 1 at day.
    pub fn day_weight(&self) -> f32 {
        match self.phase() {
            DayPhase::Night => 0.0,
            DayPhase::Dawn(progress) => progress,
            DayPhase::Day => 1.0,
            DayPhase::Dusk(progress) => 1.0 - progress,
        }
    }
}

impl Default for DayClock {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_SCALE)
    }
}

fn wrap(time: f32) -> f32 {
    let wrapped = time.rem_euclid(DAY_LENGTH);
    // rem_euclid can round up to DAY_LENGTH for tiny negative inputs
    if wrapped >= DAY_LENGTH { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(time: f32) -> DayClock {
        let mut clock = DayClock::default();
        clock.set_time(time);
        clock
    }

    #[test]
    fn advance_wraps_after_a_full_day() {
        let mut clock = DayClock::default();
        clock.advance(Duration::from_secs(23));
        assert_eq!(clock.time(), 23000.0);
        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.time(), 1000.0);
    }

    #[test]
    fn time_scale_controls_speed() {
        let mut clock = DayClock::new(100.0);
        clock.advance(Duration::from_millis(1500));
        assert!((clock.time() - 150.0).abs() < 1e-3);
    }

    #[test]
    fn negative_times_wrap_into_range() {
        let clock = at(-1000.0);
        assert_eq!(clock.time(), 23000.0);
        let clock = at(-1e-9);
        assert!(clock.time() >= 0.0 && clock.time() < DAY_LENGTH);
    }

    #[test]
    fn phases_follow_the_day_table() {
        assert_eq!(at(0.0).phase(), DayPhase::Night);
        assert_eq!(at(4999.0).phase(), DayPhase::Night);
        assert_eq!(at(5500.0).phase(), DayPhase::Dawn(0.5));
        assert_eq!(at(6000.0).phase(), DayPhase::Day);
        assert_eq!(at(20999.0).phase(), DayPhase::Day);
        assert_eq!(at(21250.0).phase(), DayPhase::Dusk(0.25));
        assert_eq!(at(22000.0).phase(), DayPhase::Night);
        assert_eq!(at(23999.0).phase(), DayPhase::Night);
    }

    #[test]
    fn day_weight_ramps_through_transitions() {
        assert_eq!(at(1000.0).day_weight(), 0.0);
        assert_eq!(at(5000.0).day_weight(), 0.0);
        assert!((at(5750.0).day_weight() - 0.75).abs() < 1e-6);
        assert_eq!(at(12000.0).day_weight(), 1.0);
        assert!((at(21750.0).day_weight() - 0.25).abs() < 1e-6);
        assert_eq!(at(23000.0).day_weight(), 0.0);
    }
}
