// Gestrs Tap-Hold Recognizer
// Press-and-hold detection with an optional multi-tap precondition

use std::time::{Duration, Instant};

use log::trace;

use crate::chord::KeyCombination;
use crate::input::{EventDecision, RawEvent};
use crate::key::{canonical_modifier, ChordKey};
use crate::recognizer::RecognizerState;

/// Window per preceding tap: `(taps - 1) * HOLD_TAP_WINDOW_PER_TAP`
/// seconds for the whole preceding sequence.
pub const HOLD_TAP_WINDOW_PER_TAP: f64 = 0.3;
/// Grace added to the sequence window when judging a new press.
pub const HOLD_PRESS_GRACE: Duration = Duration::from_millis(200);
/// Grace added to the sequence window when judging an early release.
pub const HOLD_RELEASE_GRACE: Duration = Duration::from_millis(300);

/// Level change reported by the hold recognizer for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldOutcome {
    pub decision: EventDecision,
    /// Deduplicated holding level: `Some(true)` on the edge into holding,
    /// `Some(false)` on the edge out, `None` when the level is unchanged.
    pub level: Option<bool>,
}

impl HoldOutcome {
    fn unchanged(decision: EventDecision) -> Self {
        Self {
            decision,
            level: None,
        }
    }
}

/// Recognizes "activator pressed and kept down", optionally preceded by
/// N-1 quick taps of the same activator. Emits a deduplicated boolean
/// level: true while held, false otherwise.
#[derive(Debug)]
pub struct TapHoldRecognizer {
    combination: Option<KeyCombination>,
    taps_required: u8,
    state: RecognizerState,
    /// First press of the current tap sequence.
    sequence_start: Option<Instant>,
    holding: bool,
}

impl TapHoldRecognizer {
    pub fn new() -> Self {
        Self {
            combination: None,
            taps_required: 1,
            state: RecognizerState::new(),
            sequence_start: None,
            holding: false,
        }
    }

    /// Reconfigure the activator, discarding all progress silently.
    pub fn set_combination(&mut self, combination: Option<KeyCombination>, taps_required: u8) {
        self.combination = combination;
        self.taps_required = taps_required.max(1);
        self.consume();
    }

    pub fn is_holding(&self) -> bool {
        self.holding
    }

    /// Window for the preceding-tap sequence.
    pub fn window(&self) -> Duration {
        Duration::from_secs_f64(f64::from(self.taps_required - 1) * HOLD_TAP_WINDOW_PER_TAP)
    }

    /// Process one raw event, returning the consume decision and any
    /// deduplicated level change. A `Some(true)` level claims the
    /// continuous gesture: the caller cancels every mutually exclusive
    /// sibling recognizer.
    pub fn on_event(&mut self, event: &RawEvent) -> HoldOutcome {
        self.state.note_event(event);
        let Some(combination) = self.combination.clone() else {
            return HoldOutcome::unchanged(EventDecision::PassThrough);
        };

        // Releasing a modifier that belongs to the chord ends the hold.
        if self.holding && event.is_release() {
            if let Some(key) = event.chord_key() {
                let canonical = match key {
                    ChordKey::Key(code) => ChordKey::Key(canonical_modifier(code)),
                    button => button,
                };
                if key != combination.activator() && combination.modifiers().contains(&canonical) {
                    self.holding = false;
                    self.state.reset();
                    self.sequence_start = None;
                    return HoldOutcome {
                        decision: EventDecision::PassThrough,
                        level: Some(false),
                    };
                }
            }
        }

        if !self.state.matches_trigger(&combination, event) {
            return HoldOutcome::unchanged(EventDecision::PassThrough);
        }

        let window = self.window();
        if event.is_press() {
            // A press arriving after the sequence window (plus grace)
            // restarts the sequence at one.
            if let Some(start) = self.sequence_start {
                if event.time.duration_since(start) > window + HOLD_PRESS_GRACE {
                    self.state.tap_count = 0;
                    self.sequence_start = None;
                }
            }
            if self.sequence_start.is_none() {
                self.sequence_start = Some(event.time);
            }
            self.state.tap_count = self.state.tap_count.saturating_add(1);
            self.state.physically_down = true;
            self.state.last_edge = Some(event.time);

            if self.state.tap_count >= self.taps_required && !self.holding {
                trace!("hold engaged after {} press(es)", self.state.tap_count);
                self.holding = true;
                return HoldOutcome {
                    decision: EventDecision::Consume,
                    level: Some(true),
                };
            }
            return HoldOutcome::unchanged(EventDecision::Consume);
        }

        if event.is_release() {
            self.state.physically_down = false;
            self.state.last_edge = Some(event.time);
            let was_in_sequence = self.state.tap_count > 0 || self.holding;
            let level = if self.holding {
                self.holding = false;
                Some(false)
            } else {
                None
            };
            // Giving up before the full tap count, late enough that this
            // is not a mid-sequence release: start over.
            if self.state.tap_count < self.taps_required {
                if let Some(start) = self.sequence_start {
                    if event.time.duration_since(start) >= window + HOLD_RELEASE_GRACE {
                        self.state.tap_count = 0;
                        self.sequence_start = None;
                    }
                }
            } else {
                self.state.tap_count = 0;
                self.sequence_start = None;
            }
            let decision = if was_in_sequence {
                EventDecision::Consume
            } else {
                EventDecision::PassThrough
            };
            return HoldOutcome { decision, level };
        }

        HoldOutcome::unchanged(EventDecision::PassThrough)
    }

    /// Forcibly reset internal state without emitting. Used by a
    /// controller once it has claimed the gesture, so the same edges are
    /// not interpreted twice.
    pub fn consume(&mut self) {
        self.state.reset();
        self.sequence_start = None;
        self.holding = false;
    }

    /// Best-effort cancellation from a mutually exclusive sibling;
    /// idempotent. An engaged hold is consumed silently. Pre-hold tap
    /// progress survives, so a recognizer awaiting more taps of a shared
    /// combination (a derived double-tap) is not knocked out by the
    /// single-tap sibling engaging first.
    pub fn cancel(&mut self) {
        if self.holding {
            self.consume();
        }
    }
}

impl Default for TapHoldRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{ChordKey, BTN_MIDDLE};

    fn middle_hold(taps: u8) -> TapHoldRecognizer {
        let mut recognizer = TapHoldRecognizer::new();
        recognizer.set_combination(
            Some(KeyCombination::bare(ChordKey::Button(BTN_MIDDLE))),
            taps,
        );
        recognizer
    }

    #[test]
    fn test_single_tap_hold_is_immediate() {
        let mut recognizer = middle_hold(1);
        let now = Instant::now();

        let outcome = recognizer.on_event(&RawEvent::button_down(BTN_MIDDLE, now));
        assert_eq!(outcome.level, Some(true));
        assert_eq!(outcome.decision, EventDecision::Consume);
        assert!(recognizer.is_holding());

        let outcome = recognizer.on_event(&RawEvent::button_up(
            BTN_MIDDLE,
            now + Duration::from_millis(500),
        ));
        assert_eq!(outcome.level, Some(false));
        assert!(!recognizer.is_holding());
    }

    #[test]
    fn test_double_tap_hold_requires_quick_second_press() {
        let mut recognizer = middle_hold(2);
        let start = Instant::now();

        // First press: no hold yet
        let outcome = recognizer.on_event(&RawEvent::button_down(BTN_MIDDLE, start));
        assert_eq!(outcome.level, None);
        recognizer.on_event(&RawEvent::button_up(BTN_MIDDLE, start + Duration::from_millis(50)));

        // Second press inside (2-1)*0.3 + 0.2 = 0.5s: hold engages
        let outcome = recognizer.on_event(&RawEvent::button_down(
            BTN_MIDDLE,
            start + Duration::from_millis(200),
        ));
        assert_eq!(outcome.level, Some(true));
    }

    #[test]
    fn test_double_tap_hold_slow_second_press_restarts() {
        let mut recognizer = middle_hold(2);
        let start = Instant::now();

        recognizer.on_event(&RawEvent::button_down(BTN_MIDDLE, start));
        recognizer.on_event(&RawEvent::button_up(BTN_MIDDLE, start + Duration::from_millis(50)));

        // Past the window plus grace: sequence restarts at one
        let outcome = recognizer.on_event(&RawEvent::button_down(
            BTN_MIDDLE,
            start + Duration::from_millis(700),
        ));
        assert_eq!(outcome.level, None);
        assert!(!recognizer.is_holding());
    }

    #[test]
    fn test_release_always_drops_level() {
        let mut recognizer = middle_hold(1);
        let now = Instant::now();
        recognizer.on_event(&RawEvent::button_down(BTN_MIDDLE, now));

        let outcome =
            recognizer.on_event(&RawEvent::button_up(BTN_MIDDLE, now + Duration::from_millis(10)));
        assert_eq!(outcome.level, Some(false));

        // Level output is deduplicated: a stray release changes nothing
        let outcome =
            recognizer.on_event(&RawEvent::button_up(BTN_MIDDLE, now + Duration::from_millis(20)));
        assert_eq!(outcome.level, None);
    }

    #[test]
    fn test_modifier_release_ends_hold() {
        let mut recognizer = TapHoldRecognizer::new();
        recognizer.set_combination(
            Some(KeyCombination::new(
                [ChordKey::Key(29)],
                ChordKey::Button(BTN_MIDDLE),
            )),
            1,
        );
        let now = Instant::now();
        recognizer.on_event(&RawEvent::key_down(29, now));
        let outcome = recognizer.on_event(&RawEvent::button_down(BTN_MIDDLE, now));
        assert_eq!(outcome.level, Some(true));

        let outcome =
            recognizer.on_event(&RawEvent::key_up(29, now + Duration::from_millis(100)));
        assert_eq!(outcome.level, Some(false));
    }

    #[test]
    fn test_consume_resets_silently() {
        let mut recognizer = middle_hold(1);
        let now = Instant::now();
        recognizer.on_event(&RawEvent::button_down(BTN_MIDDLE, now));
        assert!(recognizer.is_holding());

        recognizer.consume();
        assert!(!recognizer.is_holding());

        // The eventual release is a no-op at the level output
        let outcome =
            recognizer.on_event(&RawEvent::button_up(BTN_MIDDLE, now + Duration::from_millis(10)));
        assert_eq!(outcome.level, None);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut recognizer = middle_hold(2);
        let now = Instant::now();
        recognizer.on_event(&RawEvent::button_down(BTN_MIDDLE, now));

        recognizer.cancel();
        let holding_once = recognizer.is_holding();
        let count_once = recognizer.state.tap_count;
        recognizer.cancel();
        assert_eq!(recognizer.is_holding(), holding_once);
        assert_eq!(recognizer.state.tap_count, count_once);
        assert!(!holding_once);
    }

    #[test]
    fn test_unconfigured_recognizer_never_holds() {
        let mut recognizer = TapHoldRecognizer::new();
        let now = Instant::now();
        let outcome = recognizer.on_event(&RawEvent::button_down(BTN_MIDDLE, now));
        assert_eq!(outcome.level, None);
        assert_eq!(outcome.decision, EventDecision::PassThrough);
    }
}
