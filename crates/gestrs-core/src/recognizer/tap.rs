// Gestrs Tap Recognizer
// Detects N rapid press/release cycles of an activator within a decaying
// time window

use std::time::{Duration, Instant};

use log::trace;

use crate::chord::KeyCombination;
use crate::input::{EventDecision, RawEvent};
use crate::recognizer::RecognizerState;

/// Base of the tap window: `taps * TAP_WINDOW_PER_TAP + TAP_WINDOW_BASE`
/// seconds. Empirically tuned; widening it makes multi-taps lazier,
/// narrowing it makes them twitchy.
pub const TAP_WINDOW_BASE: f64 = 0.1;
pub const TAP_WINDOW_PER_TAP: f64 = 0.2;

/// Extra delay before a completed tap sequence commits, so that a longer
/// sequence sharing the same prefix can still cancel it.
pub const DEFAULT_COMMIT_DELAY: Duration = Duration::from_millis(150);

/// Recognizes exactly N press/release cycles of the configured activator,
/// each edge landing inside the decaying window. Completion is deferred by
/// a commit delay carried as a single cancellable deadline; the host polls
/// [`pending_deadline`](TapRecognizer::pending_deadline) and calls
/// [`fire_due`](TapRecognizer::fire_due) when it elapses.
#[derive(Debug)]
pub struct TapRecognizer {
    combination: Option<KeyCombination>,
    taps_required: u8,
    commit_delay: Duration,
    state: RecognizerState,
    /// Press timestamp of the cycle currently in flight.
    cycle_start: Option<Instant>,
    /// Deadline of a scheduled completion signal.
    pending: Option<Instant>,
}

impl TapRecognizer {
    pub fn new() -> Self {
        Self {
            combination: None,
            taps_required: 1,
            commit_delay: DEFAULT_COMMIT_DELAY,
            state: RecognizerState::new(),
            cycle_start: None,
            pending: None,
        }
    }

    /// Reconfigure the activator. Any in-flight progress and pending
    /// completion are discarded.
    pub fn set_combination(&mut self, combination: Option<KeyCombination>, taps_required: u8) {
        self.combination = combination;
        self.taps_required = taps_required.max(1);
        self.state.reset();
        self.cycle_start = None;
        self.pending = None;
    }

    pub fn set_commit_delay(&mut self, delay: Duration) {
        self.commit_delay = delay;
    }

    /// The decaying window for the configured tap count.
    pub fn window(&self) -> Duration {
        Duration::from_secs_f64(f64::from(self.taps_required) * TAP_WINDOW_PER_TAP + TAP_WINDOW_BASE)
    }

    /// Process one raw event. Qualifying activator edges are consumed from
    /// the stream once a match is in progress; everything else passes
    /// through.
    pub fn on_event(&mut self, event: &RawEvent) -> EventDecision {
        self.state.note_event(event);
        let Some(combination) = self.combination.clone() else {
            return EventDecision::PassThrough;
        };
        if !self.state.matches_trigger(&combination, event) {
            return EventDecision::PassThrough;
        }

        let window = self.window();
        if event.is_press() {
            // A stale edge decays the count before this press starts a
            // fresh cycle.
            if let Some(last) = self.state.last_edge {
                if event.time.duration_since(last) >= window {
                    self.state.tap_count = 0;
                }
            }
            // A further tap cancels a scheduled completion.
            self.pending = None;
            self.state.physically_down = true;
            self.cycle_start = Some(event.time);
            self.state.last_edge = Some(event.time);
            return EventDecision::Consume;
        }

        if event.is_release() {
            self.state.physically_down = false;
            let Some(start) = self.cycle_start.take() else {
                return EventDecision::PassThrough;
            };
            if event.time.duration_since(start) >= window {
                // Held too long: not a tap.
                self.reset_progress();
                return EventDecision::PassThrough;
            }
            self.state.tap_count += 1;
            self.state.last_edge = Some(event.time);
            if self.state.tap_count >= self.taps_required {
                trace!(
                    "tap sequence complete ({} taps), commit in {:?}",
                    self.taps_required,
                    self.commit_delay
                );
                self.pending = Some(event.time + self.commit_delay);
                self.state.tap_count = 0;
            }
            return EventDecision::Consume;
        }

        EventDecision::PassThrough
    }

    /// Deadline of the scheduled completion signal, if one is pending.
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending
    }

    /// Fire the pending completion if its deadline has passed. Returns
    /// true exactly once per completed sequence.
    pub fn fire_due(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(deadline) if now >= deadline => {
                self.pending = None;
                self.reset_progress();
                true
            }
            _ => false,
        }
    }

    /// Best-effort reset; idempotent.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.reset_progress();
    }

    fn reset_progress(&mut self) {
        self.state.reset();
        self.cycle_start = None;
    }
}

impl Default for TapRecognizer {
    fn default() -> Self {
        Self::new()
    }
}
