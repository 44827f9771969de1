use crate::time::Time;
use std::time::Duration;

/// Fixed-step frame driver: wall time accumulates and is drained in `frame_dt` slices.
pub(crate) struct RuntimeLoop {
    time: Time,
    accumulator: Duration,
    frame_dt: Duration,
}

pub(crate) struct RuntimeTick {
    pub dropped_backlog: Option<Duration>,
}

impl RuntimeLoop {
    pub(crate) fn new(time: Time, frame_rate: u32) -> Self {
        let frame_dt = Duration::from_secs_f64(1.0 / f64::from(frame_rate.max(1)));
        Self { time, accumulator: Duration::ZERO, frame_dt }
    }

    pub(crate) fn frame_dt(&self) -> Duration {
        self.frame_dt
    }

    pub(crate) fn tick(&mut self, max_backlog_frames: u32) -> RuntimeTick {
        self.time.tick();
        self.accumulator += self.time.delta;
        let max_backlog = self.frame_dt * max_backlog_frames.max(1);
        let mut dropped_backlog = None;
        if self.accumulator > max_backlog {
            dropped_backlog = Some(self.accumulator - max_backlog);
            self.accumulator = max_backlog;
        }
        RuntimeTick { dropped_backlog }
    }

    pub(crate) fn pop_frame(&mut self) -> Option<Duration> {
        if self.accumulator >= self.frame_dt {
            self.accumulator -= self.frame_dt;
            Some(self.frame_dt)
        } else {
            None
        }
    }

    pub(crate) fn elapsed_seconds(&self) -> f32 {
        self.time.elapsed_seconds()
    }

    /// Time left until the next frame is due.
    pub(crate) fn until_next_frame(&self) -> Duration {
        self.frame_dt.saturating_sub(self.accumulator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_dt_follows_rate() {
        let runtime = RuntimeLoop::new(Time::new(), 50);
        assert_eq!(runtime.frame_dt(), Duration::from_millis(20));
    }

    #[test]
    fn pop_frame_drains_accumulator() {
        let mut runtime = RuntimeLoop::new(Time::new(), 100);
        runtime.accumulator = Duration::from_millis(25);
        assert_eq!(runtime.pop_frame(), Some(Duration::from_millis(10)));
        assert_eq!(runtime.pop_frame(), Some(Duration::from_millis(10)));
        assert_eq!(runtime.pop_frame(), None);
        assert_eq!(runtime.until_next_frame(), Duration::from_millis(5));
    }

    #[test]
    fn elapsed_follows_wall_clock_ticks() {
        let mut runtime = RuntimeLoop::new(Time::new(), 100);
        std::thread::sleep(Duration::from_millis(30));
        runtime.tick(10);
        assert!(runtime.elapsed_seconds() >= 0.03);
        assert!(runtime.pop_frame().is_some());
    }
}
