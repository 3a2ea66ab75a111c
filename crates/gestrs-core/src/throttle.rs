// Gestrs Event Throttler
// Generic rate-limited accumulator for high-frequency delta streams

use std::time::{Duration, Instant};

/// Default sampling rate for movement coalescing, in emissions per second.
/// Tuned against gesture consumers that stutter above this rate.
pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 70.0;

/// Accumulates values posted at arbitrary frequency and emits the merged
/// accumulation at most `rate` times per second.
///
/// Not internally synchronized; callers serialize access.
#[derive(Debug, Clone)]
pub struct Throttle<T: Clone> {
    rate: f64,
    window: Duration,
    identity: T,
    accumulated: T,
    last_emit: Option<Instant>,
    last_value: Option<T>,
}

impl<T: Clone> Throttle<T> {
    /// Create a throttle emitting at most `rate` times per second.
    /// `identity` is the reset value of the accumulation.
    pub fn new(rate: f64, identity: T) -> Self {
        let rate = rate.max(1.0);
        Self {
            rate,
            window: window_for(rate),
            identity: identity.clone(),
            accumulated: identity,
            last_emit: None,
            last_value: None,
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Change the emission rate; the emission window is recomputed.
    pub fn set_rate(&mut self, rate: f64) {
        self.rate = rate.max(1.0);
        self.window = window_for(self.rate);
    }

    /// Merge new data into the running accumulation. Returns the merged
    /// accumulation when the emission window has elapsed since the last
    /// emission (or on the first post), resetting the accumulation.
    pub fn post<F: FnOnce(T) -> T>(&mut self, now: Instant, combine: F) -> Option<T> {
        self.accumulated = combine(self.accumulated.clone());
        let due = match self.last_emit {
            None => true,
            Some(t) => now.duration_since(t) >= self.window,
        };
        if due {
            Some(self.emit(now))
        } else {
            None
        }
    }

    /// Merge and force-emit regardless of timing. Resets the accumulation
    /// and clears the last-emitted memory.
    pub fn end<F: FnOnce(T) -> T>(&mut self, combine: F) -> T {
        self.accumulated = combine(self.accumulated.clone());
        let value = std::mem::replace(&mut self.accumulated, self.identity.clone());
        self.last_emit = None;
        self.last_value = None;
        value
    }

    /// The most recently emitted value, if any emission has happened since
    /// the last `end`/`reset`.
    pub fn emit_last(&self) -> Option<T> {
        self.last_value.clone()
    }

    /// Discard all accumulation and memory without emitting.
    pub fn reset(&mut self) {
        self.accumulated = self.identity.clone();
        self.last_emit = None;
        self.last_value = None;
    }

    fn emit(&mut self, now: Instant) -> T {
        let value = std::mem::replace(&mut self.accumulated, self.identity.clone());
        self.last_emit = Some(now);
        self.last_value = Some(value.clone());
        value
    }
}

fn window_for(rate: f64) -> Duration {
    Duration::from_secs_f64(1.0 / rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(delta: f64) -> impl FnOnce(f64) -> f64 {
        move |acc| acc + delta
    }

    #[test]
    fn test_first_post_emits_immediately() {
        let mut throttle = Throttle::new(10.0, 0.0);
        let now = Instant::now();
        assert_eq!(throttle.post(now, add(3.0)), Some(3.0));
    }

    #[test]
    fn test_posts_within_window_accumulate() {
        let mut throttle = Throttle::new(10.0, 0.0); // 100ms window
        let start = Instant::now();
        assert_eq!(throttle.post(start, add(1.0)), Some(1.0));

        // Inside the window: merged, not emitted
        let t1 = start + Duration::from_millis(20);
        assert_eq!(throttle.post(t1, add(2.0)), None);
        let t2 = start + Duration::from_millis(40);
        assert_eq!(throttle.post(t2, add(3.0)), None);

        // Past the window: accumulated total comes out
        let t3 = start + Duration::from_millis(120);
        assert_eq!(throttle.post(t3, add(4.0)), Some(9.0));
    }

    #[test]
    fn test_emission_count_bounded_by_rate() {
        let mut throttle = Throttle::new(10.0, 0.0);
        let start = Instant::now();
        let mut emissions = 0;
        // Post every 10ms for one second: at 10 Hz no more than ~11 emissions
        for i in 0..100 {
            let t = start + Duration::from_millis(i * 10);
            if throttle.post(t, add(1.0)).is_some() {
                emissions += 1;
            }
        }
        assert!(emissions <= 11, "got {} emissions", emissions);
        assert!(emissions >= 9, "got {} emissions", emissions);
    }

    #[test]
    fn test_end_force_emits_and_clears_memory() {
        let mut throttle = Throttle::new(10.0, 0.0);
        let start = Instant::now();
        throttle.post(start, add(1.0));
        throttle.post(start + Duration::from_millis(5), add(2.0));
        assert_eq!(throttle.emit_last(), Some(1.0));

        // Pending accumulation (2.0) plus the merge comes out immediately
        assert_eq!(throttle.end(add(0.5)), 2.5);
        assert_eq!(throttle.emit_last(), None);
    }

    #[test]
    fn test_emit_last_replays_most_recent() {
        let mut throttle = Throttle::new(10.0, 0.0);
        let start = Instant::now();
        assert_eq!(throttle.emit_last(), None);
        throttle.post(start, add(7.0));
        assert_eq!(throttle.emit_last(), Some(7.0));
        // Replay does not clear it
        assert_eq!(throttle.emit_last(), Some(7.0));
    }

    #[test]
    fn test_set_rate_recomputes_window() {
        let mut throttle = Throttle::new(10.0, 0.0);
        let start = Instant::now();
        throttle.post(start, add(1.0));

        // At 10 Hz a 50ms gap is inside the window...
        assert_eq!(throttle.post(start + Duration::from_millis(50), add(1.0)), None);

        // ...but after raising the rate to 100 Hz it is not
        throttle.set_rate(100.0);
        assert!(throttle
            .post(start + Duration::from_millis(70), add(1.0))
            .is_some());
    }

    #[test]
    fn test_reset_discards_accumulation() {
        let mut throttle = Throttle::new(10.0, 0.0);
        let start = Instant::now();
        throttle.post(start, add(1.0));
        throttle.post(start + Duration::from_millis(5), add(2.0));
        throttle.reset();
        assert_eq!(throttle.emit_last(), None);
        // Fresh accumulation after reset
        assert_eq!(throttle.post(start + Duration::from_millis(6), add(4.0)), Some(4.0));
    }
}
