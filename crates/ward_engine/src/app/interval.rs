use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IntervalPlan {
    pub(crate) ticks_to_run: u32,
    pub(crate) remaining_accumulator: Duration,
    pub(crate) dropped_backlog: Duration,
}

/// Splits accumulated frame time into whole intervals. Anything still owed
/// after `max_ticks_per_frame` is dropped rather than carried forward.
pub(crate) fn plan_interval_ticks(
    mut accumulator: Duration,
    interval: Duration,
    max_ticks_per_frame: u32,
) -> IntervalPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= interval && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(interval);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= interval {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };

    IntervalPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

#[derive(Debug)]
pub(crate) struct IntervalClock {
    interval: Duration,
    max_ticks_per_frame: u32,
    accumulator: Duration,
}

impl IntervalClock {
    pub(crate) fn new(interval: Duration, max_ticks_per_frame: u32) -> Self {
        Self {
            interval: if interval.is_zero() {
                Duration::from_secs(1)
            } else {
                interval
            },
            max_ticks_per_frame: max_ticks_per_frame.max(1),
            accumulator: Duration::ZERO,
        }
    }

    pub(crate) fn advance(&mut self, frame_dt: Duration) -> IntervalPlan {
        let plan = plan_interval_ticks(
            self.accumulator.saturating_add(frame_dt),
            self.interval,
            self.max_ticks_per_frame,
        );
        self.accumulator = plan.remaining_accumulator;
        plan
    }

    pub(crate) fn max_ticks_per_frame(&self) -> u32 {
        self.max_ticks_per_frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_runs_whole_intervals_and_keeps_remainder() {
        let plan = plan_interval_ticks(Duration::from_millis(2_300), Duration::from_secs(1), 5);

        assert_eq!(plan.ticks_to_run, 2);
        assert_eq!(plan.remaining_accumulator, Duration::from_millis(300));
        assert_eq!(plan.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_drops_backlog_when_tick_cap_hit() {
        let plan = plan_interval_ticks(Duration::from_millis(5_500), Duration::from_secs(1), 2);

        assert_eq!(plan.ticks_to_run, 2);
        assert_eq!(plan.remaining_accumulator, Duration::ZERO);
        assert_eq!(plan.dropped_backlog, Duration::from_millis(3_500));
    }

    #[test]
    fn clock_accumulates_frames_until_an_interval_elapses() {
        let mut clock = IntervalClock::new(Duration::from_secs(1), 2);
        let frame = Duration::from_millis(400);

        assert_eq!(clock.advance(frame).ticks_to_run, 0);
        assert_eq!(clock.advance(frame).ticks_to_run, 0);
        assert_eq!(clock.advance(frame).ticks_to_run, 1);
        assert_eq!(clock.advance(frame).ticks_to_run, 0);
    }

    #[test]
    fn clock_normalizes_zero_settings() {
        let mut clock = IntervalClock::new(Duration::ZERO, 0);

        assert_eq!(clock.max_ticks_per_frame(), 1);
        assert_eq!(clock.advance(Duration::from_secs(1)).ticks_to_run, 1);
    }
}
