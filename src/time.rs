use std::time::{Duration, Instant};

/// Wall clock for the frame loop.
pub struct Time {
    start: Instant,
    last: Instant,
    elapsed: Duration,
    pub delta: Duration,
}

impl Time {
    pub fn new() -> Self {
        let now = Instant::now();
        Self { start: now, last: now, elapsed: Duration::ZERO, delta: Duration::ZERO }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta = now - self.last;
        self.last = now;
        self.elapsed = now.duration_since(self.start);
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot countdown used for deferred actions such as respawns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    remaining: Duration,
}

impl Countdown {
    pub fn new(duration: Duration) -> Self {
        Self { remaining: duration }
    }

    /// Returns true on the tick that reaches zero (and on every tick after).
    pub fn tick(&mut self, delta: Duration) -> bool {
        self.remaining = self.remaining.saturating_sub(delta);
        self.remaining.is_zero()
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_accumulates_elapsed() {
        let mut time = Time::new();
        std::thread::sleep(Duration::from_millis(10));
        time.tick();
        let first = time.elapsed_seconds();
        std::thread::sleep(Duration::from_millis(10));
        time.tick();
        assert!(first >= 0.01);
        assert!(time.elapsed_seconds() >= first + time.delta.as_secs_f32() - 1e-6);
        assert!(time.delta >= Duration::from_millis(10));
    }

    #[test]
    fn countdown_fires_once_exhausted() {
        let mut countdown = Countdown::new(Duration::from_millis(100));
        assert!(!countdown.tick(Duration::from_millis(60)));
        assert!(countdown.tick(Duration::from_millis(60)));
        assert_eq!(countdown.remaining(), Duration::ZERO);
    }
}
