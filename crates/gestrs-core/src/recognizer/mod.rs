// Gestrs Gesture Recognizers
// Independent state machines driven by the raw event stream

pub mod movement;
pub mod tap;
pub mod tap_hold;

use std::collections::HashSet;
use std::time::Instant;

use crate::chord::KeyCombination;
use crate::input::RawEvent;
use crate::key::ChordKey;

pub use movement::{MouseMovementRecognizer, MovementSample};
pub use tap::TapRecognizer;
pub use tap_hold::TapHoldRecognizer;

/// Per-recognizer bookkeeping shared by the tap and hold machines.
///
/// The held-key sets mirror the physical device and are updated on every
/// edge; `reset` clears only the gesture-progress fields, since forgetting
/// which keys are physically down would desync the recognizer from
/// hardware.
#[derive(Debug, Clone, Default)]
pub struct RecognizerState {
    /// Timestamp of the last press/release edge relevant to the gesture.
    pub last_edge: Option<Instant>,
    pub tap_count: u8,
    /// Whether the configured activator is currently down.
    pub physically_down: bool,
    pub held_keys: HashSet<u16>,
    pub held_buttons: HashSet<u16>,
}

impl RecognizerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear gesture progress. Held-key tracking survives.
    pub fn reset(&mut self) {
        self.last_edge = None;
        self.tap_count = 0;
        self.physically_down = false;
    }

    /// Update held-key bookkeeping from an edge event. Motion events are
    /// ignored.
    pub fn note_event(&mut self, event: &RawEvent) {
        let Some(key) = event.chord_key() else {
            return;
        };
        let (set, code) = match key {
            ChordKey::Key(code) => (&mut self.held_keys, code),
            ChordKey::Button(code) => (&mut self.held_buttons, code),
        };
        if event.is_press() {
            set.insert(code);
        } else if event.is_release() {
            set.remove(&code);
        }
    }

    /// Whether this edge event presses or releases the combination's
    /// trigger with the required modifiers held.
    ///
    /// On a trigger release the modifier check is skipped: a hold must end
    /// when its trigger comes up even if the user already let go of the
    /// modifiers.
    pub fn matches_trigger(&self, combination: &KeyCombination, event: &RawEvent) -> bool {
        let Some(key) = event.chord_key() else {
            return false;
        };
        if key != combination.activator() {
            return false;
        }
        event.is_release() || combination.modifiers_satisfied(&self.held_keys)
    }
}
