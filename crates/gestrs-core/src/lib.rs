// Gestrs Core Library
// Gesture recognition and trackpad-gesture synthesis engine

pub mod chord;
pub mod config;
pub mod conflict;
pub mod engine;
pub mod feature;
pub mod input;
pub mod key;
pub mod output;
pub mod recognizer;
pub mod scheduler;
pub mod settings;
pub mod throttle;

pub use chord::{Activator, KeyCombination};
pub use config::{parse_activator_string, ActivatorParseError};
pub use conflict::{
    conflicts, effective_activator, has_conflict, validate, validate_feature,
    ActivatorInvalidReason,
};
pub use engine::{GestureEngine, GestureSignal};
pub use feature::{
    DockSwipeConfig, DockSwipeController, DockSwipePhase, FeatureKey, MoveDirection, ScrollConfig,
    ScrollController, ScrollPhase, ZoomRotateConfig, ZoomRotateController, ZoomRotatePhase,
};
pub use input::{EventDecision, EventKind, EventTap, ModifierMask, RawEvent};
pub use key::ChordKey;
pub use output::{GesturePhase, RecordingOutput, SwipeDirection, SyntheticEvent, SyntheticOutput};
pub use recognizer::{
    MouseMovementRecognizer, MovementSample, RecognizerState, TapHoldRecognizer, TapRecognizer,
};
pub use scheduler::{FrameScheduler, FrameTask, ManualTickSource, TickSource};
pub use settings::{Settings, SettingsError, SharedSettings};
pub use throttle::Throttle;
