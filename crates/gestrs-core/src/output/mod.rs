// Gestrs Output Layer
// The synthetic-event boundary: fire-and-forget gesture primitives

use std::fmt;

use parking_lot::Mutex;

/// Lifecycle phase attached to every synthetic gesture event. Consuming
/// applications only accept gestures that follow this sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum GesturePhase {
    MayBegin,
    Began,
    Changed,
    Ended,
    Cancelled,
}

/// Direction of a synthesized multi-finger swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
}

/// Post-synthetic-event primitives implemented by the platform layer.
/// All calls are fire-and-forget: no return value, no failure reported
/// back.
pub trait SyntheticOutput: Send + Sync {
    /// Continuous scroll with pixel deltas.
    fn scroll(&self, phase: GesturePhase, dx: f64, dy: f64);

    /// Inertial scroll tail after the fingers lift.
    fn momentum_scroll(&self, phase: GesturePhase, dx: f64, dy: f64);

    /// Companion trackpad-gesture frame posted alongside scroll so
    /// consumers treat the stream as a physical trackpad gesture.
    fn gesture(&self, phase: GesturePhase);

    /// Pinch zoom; positive magnification zooms in.
    fn magnify(&self, phase: GesturePhase, magnification: f64);

    /// Rotation; positive degrees turn counterclockwise.
    fn rotate(&self, phase: GesturePhase, degrees: f64);

    /// Multi-finger swipe with a magnitude-derived intensity scalar.
    fn swipe(&self, phase: GesturePhase, direction: SwipeDirection, intensity: f64);
}

/// One recorded synthetic event, mirroring the trait surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntheticEvent {
    Scroll {
        phase: GesturePhase,
        dx: f64,
        dy: f64,
    },
    MomentumScroll {
        phase: GesturePhase,
        dx: f64,
        dy: f64,
    },
    Gesture {
        phase: GesturePhase,
    },
    Magnify {
        phase: GesturePhase,
        magnification: f64,
    },
    Rotate {
        phase: GesturePhase,
        degrees: f64,
    },
    Swipe {
        phase: GesturePhase,
        direction: SwipeDirection,
        intensity: f64,
    },
}

impl fmt::Display for SyntheticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntheticEvent::Scroll { phase, dx, dy } => {
                write!(f, "scroll {} dx={:.2} dy={:.2}", phase, dx, dy)
            }
            SyntheticEvent::MomentumScroll { phase, dx, dy } => {
                write!(f, "momentum {} dx={:.2} dy={:.2}", phase, dx, dy)
            }
            SyntheticEvent::Gesture { phase } => write!(f, "gesture {}", phase),
            SyntheticEvent::Magnify {
                phase,
                magnification,
            } => write!(f, "magnify {} mag={:.4}", phase, magnification),
            SyntheticEvent::Rotate { phase, degrees } => {
                write!(f, "rotate {} deg={:.2}", phase, degrees)
            }
            SyntheticEvent::Swipe {
                phase,
                direction,
                intensity,
            } => write!(f, "swipe {} {} intensity={:.2}", phase, direction, intensity),
        }
    }
}

/// Output sink that records every posted event. Backs the replay CLI and
/// the test suites.
#[derive(Debug, Default)]
pub struct RecordingOutput {
    events: Mutex<Vec<SyntheticEvent>>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<SyntheticEvent> {
        self.events.lock().clone()
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<SyntheticEvent> {
        std::mem::take(&mut self.events.lock())
    }
}

impl SyntheticOutput for RecordingOutput {
    fn scroll(&self, phase: GesturePhase, dx: f64, dy: f64) {
        self.events.lock().push(SyntheticEvent::Scroll { phase, dx, dy });
    }

    fn momentum_scroll(&self, phase: GesturePhase, dx: f64, dy: f64) {
        self.events
            .lock()
            .push(SyntheticEvent::MomentumScroll { phase, dx, dy });
    }

    fn gesture(&self, phase: GesturePhase) {
        self.events.lock().push(SyntheticEvent::Gesture { phase });
    }

    fn magnify(&self, phase: GesturePhase, magnification: f64) {
        self.events.lock().push(SyntheticEvent::Magnify {
            phase,
            magnification,
        });
    }

    fn rotate(&self, phase: GesturePhase, degrees: f64) {
        self.events.lock().push(SyntheticEvent::Rotate { phase, degrees });
    }

    fn swipe(&self, phase: GesturePhase, direction: SwipeDirection, intensity: f64) {
        self.events.lock().push(SyntheticEvent::Swipe {
            phase,
            direction,
            intensity,
        });
    }
}
