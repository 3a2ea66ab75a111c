// Gestrs Feature Controllers
// Per-feature orchestration of hold activation, movement, and phases

pub mod dock_swipe;
pub mod scroll;
pub mod zoom_rotate;

use crate::input::EventDecision;
use crate::recognizer::MovementSample;

pub use dock_swipe::{DockSwipeConfig, DockSwipeController, DockSwipePhase};
pub use scroll::{ScrollConfig, ScrollController, ScrollPhase};
pub use zoom_rotate::{ZoomRotateConfig, ZoomRotateController, ZoomRotatePhase};

/// Stable identity of a feature, used as the frame scheduler queue key
/// and in conflict reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum FeatureKey {
    Scroll,
    ZoomRotate,
    DockSwipe,
}

/// Movement direction assignable to a zoom or rotate axis.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum MoveDirection {
    #[default]
    None,
    Left,
    Right,
    Up,
    Down,
}

/// Axis a direction lives on; directions on the same axis are mutually
/// exclusive between zoom and rotate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl MoveDirection {
    pub fn axis(&self) -> Option<Axis> {
        match self {
            MoveDirection::None => None,
            MoveDirection::Left | MoveDirection::Right => Some(Axis::Horizontal),
            MoveDirection::Up | MoveDirection::Down => Some(Axis::Vertical),
        }
    }

    /// Signed projection of a movement sample onto this direction:
    /// positive when the motion goes the configured way.
    pub fn project(&self, sample: &MovementSample) -> f64 {
        match self {
            MoveDirection::None => 0.0,
            MoveDirection::Left => -sample.dx,
            MoveDirection::Right => sample.dx,
            MoveDirection::Up => -sample.dy,
            MoveDirection::Down => sample.dy,
        }
    }
}

/// Movement below this magnitude never advances a phase machine; jitter
/// while grabbing the activator must not start a gesture.
pub const MOVEMENT_DEAD_ZONE: f64 = 5.0;

/// Cumulative unsigned movement required before a zoom or rotate gesture
/// is confirmed.
pub const ZOOM_CONFIRM_THRESHOLD: f64 = 40.0;

/// Result of dispatching one raw event to a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlOutcome {
    pub decision: EventDecision,
    /// Set when this controller's hold engaged on this event; the engine
    /// must cancel every sibling controller in response.
    pub claimed_exclusive: bool,
}

impl ControlOutcome {
    pub fn pass() -> Self {
        Self {
            decision: EventDecision::PassThrough,
            claimed_exclusive: false,
        }
    }
}
