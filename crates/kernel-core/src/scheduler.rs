//! Loop pacing: how many internal ticks to run on each host frame.
//!
//! While the player is busy (their next eligible time is ahead of the clock) the
//! pacer catches up, running an eased burst of ticks per frame so the displayed clock
//! speeds up and slows down smoothly instead of jumping. Otherwise it steps at a fixed
//! real-time rate.

use std::time::Duration;

use contracts::{LoopPhase, SimConfig};
use log::trace;

#[derive(Debug, Clone)]
pub struct Pacer {
    phase: LoopPhase,
    /// Easing phase, advanced once per catch-up frame.
    counter: f64,
    divisor: f64,
    increment: f64,
    tick_interval: Duration,
    last_tick: Option<Duration>,
}

impl Pacer {
    pub fn new(config: &SimConfig) -> Self {
        // A rate too small for a `Duration` interval steps once and then never again.
        let tick_interval = if config.tick_rate > 0.0 && config.tick_rate.is_finite() {
            Duration::try_from_secs_f64(1.0 / config.tick_rate).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        let divisor = if config.catch_up_divisor > 0.0 {
            config.catch_up_divisor
        } else {
            std::f64::consts::TAU
        };
        Self {
            phase: LoopPhase::Idle,
            counter: 0.0,
            divisor,
            increment: config.catch_up_increment,
            tick_interval,
            last_tick: None,
        }
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn counter(&self) -> f64 {
        self.counter
    }

    /// Number of ticks to run for a host frame at real time `real_now`.
    ///
    /// `now` is the simulated time, `player_ready_at` the player's next eligible time and
    /// `step` the clock increment per tick.
    pub fn ticks_for_frame(
        &mut self,
        real_now: Duration,
        now: f64,
        player_ready_at: f64,
        step: f64,
    ) -> usize {
        if player_ready_at > now && step > 0.0 {
            self.phase = LoopPhase::CatchingUp;
            self.counter += self.increment;
            self.last_tick = Some(real_now);
            let remaining = (player_ready_at - now) / step;
            let ticks = catch_up_factor(remaining, self.divisor, self.counter)
                .ceil()
                .clamp(1.0, remaining.ceil().max(1.0));
            trace!("catching up: {ticks} ticks, {remaining:.0} remaining");
            return ticks as usize;
        }

        if self.phase == LoopPhase::CatchingUp {
            self.counter = 0.0;
        }

        let due = match self.last_tick {
            None => true,
            Some(last) => real_now.saturating_sub(last) >= self.tick_interval,
        };
        if due {
            self.phase = LoopPhase::Stepping;
            self.last_tick = Some(real_now);
            1
        } else {
            self.phase = LoopPhase::Idle;
            0
        }
    }
}

/// `(remaining / divisor) * (1 - cos(counter))`.
pub fn catch_up_factor(remaining_ticks: f64, divisor: f64, counter: f64) -> f64 {
    remaining_ticks / divisor * (1.0 - counter.cos())
}
