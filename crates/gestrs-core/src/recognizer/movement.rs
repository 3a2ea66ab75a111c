// Gestrs Mouse Movement Recognizer
// Gated, throttled accumulation of raw movement deltas

use std::ops::Add;
use std::time::Instant;

use crate::input::{EventDecision, RawEvent};
use crate::throttle::{Throttle, DEFAULT_SAMPLE_RATE_HZ};

/// Accumulated movement over one throttle window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MovementSample {
    pub dx: f64,
    pub dy: f64,
}

impl MovementSample {
    pub const ZERO: Self = Self { dx: 0.0, dy: 0.0 };

    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Manhattan magnitude, the measure used by the dead-zone and
    /// confirmation thresholds.
    pub fn magnitude(&self) -> f64 {
        self.dx.abs() + self.dy.abs()
    }

    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

impl Add for MovementSample {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            dx: self.dx + other.dx,
            dy: self.dy + other.dy,
        }
    }
}

/// Turns the raw movement stream into throttled `(dx, dy)` samples while
/// active; passes movement through untouched while inactive.
///
/// Only one movement recognizer may be active system-wide; the engine
/// cancels siblings when one activates.
#[derive(Debug)]
pub struct MouseMovementRecognizer {
    active: bool,
    throttle: Throttle<MovementSample>,
}

impl MouseMovementRecognizer {
    pub fn new() -> Self {
        Self {
            active: false,
            throttle: Throttle::new(DEFAULT_SAMPLE_RATE_HZ, MovementSample::ZERO),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn sample_rate(&self) -> f64 {
        self.throttle.rate()
    }

    pub fn set_sample_rate(&mut self, rate: f64) {
        self.throttle.set_rate(rate);
    }

    /// Gate the recognizer. Turning it off flushes the final partial
    /// sample through the throttler's `end` path exactly once and returns
    /// it, so the tail of the motion is not lost.
    pub fn set_active(&mut self, active: bool) -> Option<MovementSample> {
        if active == self.active {
            return None;
        }
        self.active = active;
        if active {
            self.throttle.reset();
            None
        } else {
            Some(self.throttle.end(|acc| acc))
        }
    }

    /// Process one motion event. While inactive the event passes through
    /// untouched; while active it is consumed and merged, surfacing a
    /// sample when the throttle window elapses.
    pub fn on_motion(&mut self, event: &RawEvent) -> (EventDecision, Option<MovementSample>) {
        if !event.is_motion() {
            return (EventDecision::PassThrough, None);
        }
        if !self.active {
            return (EventDecision::PassThrough, None);
        }
        let delta = MovementSample::new(event.dx, event.dy);
        let sample = self.throttle.post(event.time, |acc| acc + delta);
        (EventDecision::Consume, sample)
    }

    /// Best-effort deactivation without emitting anything; idempotent.
    pub fn cancel(&mut self) {
        self.active = false;
        self.throttle.reset();
    }
}

impl Default for MouseMovementRecognizer {
    fn default() -> Self {
        Self::new()
    }
}
