//! Fixed-timestep simulation clock.

use crate::config;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning for [`FixedTimestep`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimestepConfig {
    /// Simulation ticks per second
    pub target_tps: u32,
    /// Longest frame time fed into the accumulator, in seconds
    pub max_frame_delta: f32,
    pub max_ticks_per_frame: u32,
}

impl Default for TimestepConfig {
    fn default() -> Self {
        Self {
            target_tps: config::TARGET_TPS,
            max_frame_delta: config::MAX_FRAME_DELTA,
            max_ticks_per_frame: config::MAX_TICKS_PER_FRAME,
        }
    }
}

/// How many ticks a frame should run and what was left over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub ticks_to_run: u32,
    pub remaining_accumulator: Duration,
    pub dropped_backlog: Duration,
}

/// Turns variable frame times into a whole number of fixed ticks.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    accumulator: Duration,
    total_ticks: u64,
    dropped_total: Duration,
}

impl FixedTimestep {
    pub fn new(config: &TimestepConfig) -> Self {
        let target_tps = config.target_tps.max(1);
        let max_frame_delta = if config.max_frame_delta.is_finite() && config.max_frame_delta > 0.0 {
            Duration::from_secs_f32(config.max_frame_delta)
        } else {
            Duration::from_secs_f32(config::MAX_FRAME_DELTA)
        };
        Self {
            fixed_dt: Duration::from_secs_f64(1.0 / target_tps as f64),
            max_frame_delta,
            max_ticks_per_frame: config.max_ticks_per_frame.max(1),
            accumulator: Duration::ZERO,
            total_ticks: 0,
            dropped_total: Duration::ZERO,
        }
    }

    /// Length of one tick in seconds.
    pub fn dt(&self) -> f32 {
        self.fixed_dt.as_secs_f32()
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Simulation time covered by the ticks run so far.
    pub fn elapsed(&self) -> f32 {
        self.total_ticks as f32 * self.dt()
    }

    /// Backlog discarded over the clock's lifetime.
    pub fn dropped_total(&self) -> Duration {
        self.dropped_total
    }

    /// Feeds one frame's real time and returns how many ticks to run.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberfall::{FixedTimestep, TimestepConfig};
    ///
    /// let mut clock = FixedTimestep::new(&TimestepConfig::default());
    /// assert_eq!(clock.advance(1.0 / 30.0), 2);
    /// ```
    pub fn advance(&mut self, frame_seconds: f32) -> u32 {
        let frame = if frame_seconds.is_finite() && frame_seconds > 0.0 {
            Duration::from_secs_f32(frame_seconds)
        } else {
            Duration::ZERO
        };
        let clamped = frame.min(self.max_frame_delta);
        if clamped < frame {
            log::debug!(
                "frame of {}ms clamped to {}ms",
                frame.as_millis(),
                clamped.as_millis()
            );
        }

        let plan = plan_sim_steps(
            self.accumulator.saturating_add(clamped),
            self.fixed_dt,
            self.max_ticks_per_frame,
        );
        self.accumulator = plan.remaining_accumulator;
        self.total_ticks += u64::from(plan.ticks_to_run);
        if plan.dropped_backlog > Duration::ZERO {
            self.dropped_total += plan.dropped_backlog;
            log::warn!(
                "simulation behind, dropped {}ms of backlog after {} ticks",
                plan.dropped_backlog.as_millis(),
                plan.ticks_to_run
            );
        }
        plan.ticks_to_run
    }

    /// Fraction of a tick left in the accumulator, for render interpolation.
    pub fn alpha(&self) -> f32 {
        (self.accumulator.as_secs_f32() / self.dt()).clamp(0.0, 1.0)
    }
}

/// Splits an accumulator into whole ticks, at most `max_ticks_per_frame`.
/// Whatever would still be due after the cap is reported as dropped.
pub(crate) fn plan_sim_steps(accumulator: Duration, fixed_dt: Duration, max_ticks_per_frame: u32) -> StepPlan {
    if fixed_dt.is_zero() {
        return StepPlan {
            ticks_to_run: 0,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        };
    }

    let due = accumulator.as_nanos() / fixed_dt.as_nanos();
    let ticks_to_run = due.min(u128::from(max_ticks_per_frame)) as u32;
    let leftover = accumulator.saturating_sub(fixed_dt * ticks_to_run);

    if leftover >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: leftover,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: leftover,
            dropped_backlog: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let plan = plan_sim_steps(Duration::from_millis(50), fixed_dt, 5);
        assert_eq!(plan.ticks_to_run, 3);
        assert_eq!(plan.remaining_accumulator, Duration::from_millis(2));
        assert_eq!(plan.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn test_plan_drops_backlog_at_cap() {
        let fixed_dt = Duration::from_millis(16);
        let plan = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);
        assert_eq!(plan.ticks_to_run, 3);
        assert_eq!(plan.remaining_accumulator, Duration::ZERO);
        assert_eq!(plan.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn test_zero_step_drops_everything() {
        let plan = plan_sim_steps(Duration::from_millis(30), Duration::ZERO, 4);
        assert_eq!(plan.ticks_to_run, 0);
        assert_eq!(plan.dropped_backlog, Duration::from_millis(30));
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut clock = FixedTimestep::new(&TimestepConfig {
            target_tps: 10,
            max_frame_delta: 0.25,
            max_ticks_per_frame: 100,
        });
        // 5 seconds becomes 0.25, which is two ticks plus remainder
        assert_eq!(clock.advance(5.0), 2);
        assert!(clock.alpha() > 0.0 && clock.alpha() < 1.0);
    }

    #[test]
    fn test_bad_frame_times_run_nothing() {
        let mut clock = FixedTimestep::new(&TimestepConfig::default());
        assert_eq!(clock.advance(-1.0), 0);
        assert_eq!(clock.advance(f32::NAN), 0);
        assert_eq!(clock.total_ticks(), 0);
    }

    #[test]
    fn test_ticks_accumulate_across_frames() {
        let mut clock = FixedTimestep::new(&TimestepConfig {
            target_tps: 100,
            ..TimestepConfig::default()
        });
        let mut ticks = 0;
        for _ in 0..10 {
            ticks += clock.advance(0.004);
        }
        assert!((3..=4).contains(&ticks));
        assert_eq!(clock.total_ticks(), u64::from(ticks));
    }
}
