use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::ConfigError;

pub fn now() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
}

/// Length of one tick, or `None` when the rate gives a zero or
/// unrepresentable duration.
pub fn tick_duration_for(tick_rate: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(1.0 / tick_rate)
        .ok()
        .filter(|duration| !duration.is_zero())
}

/// Turns variable frame time into a monotonic sequence of fixed ticks.
///
/// Call [`FixedTickClock::advance`] once per frame with the elapsed time, then
/// drain ticks with `while clock.should_tick() { ... }`. A long frame yields
/// several ticks; none are ever dropped.
#[derive(Debug, Clone)]
pub struct FixedTickClock {
    tick_duration: Duration,
    accumulator: Duration,
    current_tick: u64,
}

impl FixedTickClock {
    pub fn new(tick_rate: f64) -> Result<Self, ConfigError> {
        Self::starting_at(tick_rate, 0)
    }

    pub fn starting_at(tick_rate: f64, initial_tick: u64) -> Result<Self, ConfigError> {
        let tick_duration =
            tick_duration_for(tick_rate).ok_or(ConfigError::OutOfRange("TICK_RATE"))?;

        Ok(Self {
            tick_duration,
            accumulator: Duration::ZERO,
            current_tick: initial_tick,
        })
    }

    pub fn advance(&mut self, frame_time: Duration) {
        self.accumulator += frame_time;
    }

    /// Consumes one tick if a whole tick duration has accumulated.
    pub fn should_tick(&mut self) -> bool {
        if self.accumulator < self.tick_duration {
            return false;
        }

        self.accumulator -= self.tick_duration;
        self.current_tick += 1;
        true
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    pub fn accumulated(&self) -> Duration {
        self.accumulator
    }
}
