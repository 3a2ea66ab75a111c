// Gestrs Gesture Engine
// Composition root: fans every intercepted event out to the feature
// controllers, mediates cross-recognizer cancellation, and swaps in
// settings snapshots at event boundaries

use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};

use crate::chord::Activator;
use crate::conflict::{self, validate_feature};
use crate::feature::{
    DockSwipeConfig, DockSwipeController, DockSwipePhase, FeatureKey, ScrollConfig,
    ScrollController, ScrollPhase, ZoomRotateConfig, ZoomRotateController, ZoomRotatePhase,
};
use crate::input::{EventDecision, EventKind, RawEvent, INTEREST_SET};
use crate::output::SyntheticOutput;
use crate::recognizer::TapRecognizer;
use crate::scheduler::FrameScheduler;
use crate::settings::{Settings, SharedSettings};

/// Recognized-gesture signals surfaced to the composition root's host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureSignal {
    /// The configured tap sequence completed (after its commit delay).
    TapCompleted,
}

/// The gesture engine. Owns every controller and recognizer; all methods
/// must be called from one serialized execution context, since press and
/// release ordering is load-bearing.
pub struct GestureEngine {
    settings: SharedSettings,
    snapshot: Arc<Settings>,
    scroll: ScrollController,
    zoom: ZoomRotateController,
    swipe: DockSwipeController,
    tap: TapRecognizer,
}

impl GestureEngine {
    pub fn new(
        settings: SharedSettings,
        output: Arc<dyn SyntheticOutput>,
        scheduler: Arc<FrameScheduler>,
    ) -> Self {
        let snapshot = settings.load();
        let mut engine = Self {
            settings,
            snapshot,
            scroll: ScrollController::new(Arc::clone(&output), Arc::clone(&scheduler)),
            zoom: ZoomRotateController::new(Arc::clone(&output), Arc::clone(&scheduler)),
            swipe: DockSwipeController::new(output, scheduler),
            tap: TapRecognizer::new(),
        };
        engine.apply_snapshot();
        engine
    }

    /// The event kinds this engine wants intercepted.
    pub fn interests() -> &'static [EventKind] {
        INTEREST_SET
    }

    /// Process one intercepted event and decide its fate. Every
    /// controller sees every event (each tracks held keys itself); the
    /// per-controller votes merge with any-consume-wins.
    pub fn process_event(&mut self, event: &RawEvent) -> EventDecision {
        self.refresh_settings();

        let tap_decision = self.tap.on_event(event);
        let scroll = self.scroll.on_event(event);
        let zoom = self.zoom.on_event(event);
        let swipe = self.swipe.on_event(event);

        // Only one continuous gesture may run at a time: a hold engaging
        // cancels every sibling recognizer, best-effort. When several
        // holds engage on the same edge (shared combinations), the one
        // requiring the most taps is the more specific match and wins.
        let mut winner: Option<(FeatureKey, u8)> = None;
        let claims = [
            (FeatureKey::Scroll, scroll.claimed_exclusive, self.scroll.taps_required()),
            (FeatureKey::ZoomRotate, zoom.claimed_exclusive, self.zoom.taps_required()),
            (FeatureKey::DockSwipe, swipe.claimed_exclusive, self.swipe.taps_required()),
        ];
        for (key, claimed, taps) in claims {
            if claimed && winner.map_or(true, |(_, best)| taps > best) {
                winner = Some((key, taps));
            }
        }
        if let Some((key, _)) = winner {
            self.cancel_except(key);
        }

        let decision = tap_decision
            .merge(scroll.decision)
            .merge(zoom.decision)
            .merge(swipe.decision);
        debug!("{:?} {} -> {:?}", event.kind, event.code, decision);
        decision
    }

    /// Configure a standalone tap trigger (e.g. a multi-tap click
    /// action) recognized alongside the hold-driven features.
    pub fn set_tap_trigger(&mut self, activator: Option<Activator>) {
        match activator {
            Some(activator) => self.tap.set_combination(
                Some(activator.combination().clone()),
                activator.taps_required(),
            ),
            None => self.tap.set_combination(None, 1),
        }
    }

    /// Deadline of the tap recognizer's delayed commit, for the host to
    /// arm a single cancellable timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tap.pending_deadline()
    }

    /// Fire any due deadline, surfacing completed gestures.
    pub fn fire_due(&mut self, now: Instant) -> Vec<GestureSignal> {
        if self.tap.fire_due(now) {
            vec![GestureSignal::TapCompleted]
        } else {
            Vec::new()
        }
    }

    /// Best-effort reset of every recognizer; idempotent.
    pub fn cancel_all(&mut self) {
        self.scroll.cancel();
        self.zoom.cancel();
        self.swipe.cancel();
        self.tap.cancel();
    }

    /// Current controller phases, for diagnostics and replay output.
    pub fn phases(&self) -> (ScrollPhase, ZoomRotatePhase, DockSwipePhase) {
        (self.scroll.phase(), self.zoom.phase(), self.swipe.phase())
    }

    fn cancel_except(&mut self, winner: FeatureKey) {
        debug!("{} claimed the continuous gesture", winner);
        if winner != FeatureKey::Scroll {
            self.scroll.cancel();
        }
        if winner != FeatureKey::ZoomRotate {
            self.zoom.cancel();
        }
        if winner != FeatureKey::DockSwipe {
            self.swipe.cancel();
        }
        self.tap.cancel();
    }

    /// Re-read the shared settings; on a fresh snapshot, push new configs
    /// into the controllers (which reset recognizers whose activator
    /// changed).
    fn refresh_settings(&mut self) {
        let latest = self.settings.load();
        if Arc::ptr_eq(&latest, &self.snapshot) {
            return;
        }
        self.snapshot = latest;
        self.apply_snapshot();
    }

    fn apply_snapshot(&mut self) {
        let snapshot = Arc::clone(&self.snapshot);

        self.scroll.apply_config(ScrollConfig {
            activator: self
                .usable_activator(FeatureKey::Scroll, &snapshot)
                .map(|a| a.combination().clone()),
            taps_required: snapshot.scroll.taps_required,
            speed: snapshot.scroll.speed,
            inertia: snapshot.scroll.inertia,
            sample_rate: snapshot.scroll.sample_rate,
        });

        let zoom_activator = self.usable_activator(FeatureKey::ZoomRotate, &snapshot);
        let mut zoom_config = ZoomRotateConfig {
            activator: zoom_activator.as_ref().map(|a| a.combination().clone()),
            taps_required: zoom_activator
                .as_ref()
                .map_or(snapshot.zoom.taps_required, Activator::taps_required),
            zoom_direction: snapshot.zoom.zoom_direction,
            rotate_direction: snapshot.zoom.rotate_direction,
            speed: snapshot.zoom.speed,
            sample_rate: snapshot.zoom.sample_rate,
            double_tap_of_scroll: snapshot.zoom.double_tap_of_scroll,
        };
        zoom_config.resolve_direction_conflict();
        self.zoom.apply_config(zoom_config);

        self.swipe.apply_config(DockSwipeConfig {
            activator: self
                .usable_activator(FeatureKey::DockSwipe, &snapshot)
                .map(|a| a.combination().clone()),
            taps_required: snapshot.swipe.taps_required,
            speed: snapshot.swipe.speed,
            sample_rate: snapshot.swipe.sample_rate,
        });
    }

    /// A feature's effective activator when it is enabled and valid;
    /// anything else leaves the feature permanently idle.
    fn usable_activator(&self, feature: FeatureKey, settings: &Settings) -> Option<Activator> {
        if !conflict::is_enabled(feature, settings) {
            return None;
        }
        if let Some(reason) = validate_feature(feature, settings) {
            warn!("{} activator rejected: {}", feature, reason);
            return None;
        }
        conflict::effective_activator(feature, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::chord::KeyCombination;
    use crate::key::{ChordKey, BTN_EXTRA, BTN_MIDDLE, BTN_RIGHT, BTN_SIDE};
    use crate::output::RecordingOutput;
    use crate::scheduler::ManualTickSource;

    fn engine_with(settings: Settings) -> (GestureEngine, Arc<RecordingOutput>, SharedSettings) {
        let shared = SharedSettings::new(settings);
        let output = Arc::new(RecordingOutput::new());
        let scheduler = Arc::new(FrameScheduler::new(Arc::new(ManualTickSource::new())));
        let engine = GestureEngine::new(shared.clone(), output.clone(), scheduler);
        (engine, output, shared)
    }

    fn scroll_on_middle() -> Settings {
        let mut settings = Settings::new();
        settings.scroll.enabled = true;
        settings.scroll.activator = Some(KeyCombination::bare(ChordKey::Button(BTN_MIDDLE)));
        settings.scroll.sample_rate = 1000.0;
        settings
    }

    #[test]
    fn test_activator_press_is_consumed_and_motion_suppressed() {
        let (mut engine, _output, _shared) = engine_with(scroll_on_middle());
        let start = Instant::now();

        assert_eq!(
            engine.process_event(&RawEvent::button_down(BTN_MIDDLE, start)),
            EventDecision::Consume
        );
        assert_eq!(
            engine.process_event(&RawEvent::motion(10.0, 0.0, start + Duration::from_millis(10))),
            EventDecision::Consume
        );
    }

    #[test]
    fn test_unrelated_events_pass_through() {
        let (mut engine, _output, _shared) = engine_with(scroll_on_middle());
        let now = Instant::now();
        assert_eq!(
            engine.process_event(&RawEvent::button_down(BTN_SIDE, now)),
            EventDecision::PassThrough
        );
        assert_eq!(
            engine.process_event(&RawEvent::motion(5.0, 5.0, now)),
            EventDecision::PassThrough
        );
        assert_eq!(
            engine.process_event(&RawEvent::key_down(30, now)),
            EventDecision::PassThrough
        );
    }

    #[test]
    fn test_claiming_cancels_sibling_gesture() {
        let mut settings = scroll_on_middle();
        settings.swipe.enabled = true;
        settings.swipe.activator = Some(KeyCombination::bare(ChordKey::Button(BTN_EXTRA)));
        settings.swipe.sample_rate = 1000.0;
        let (mut engine, _output, _shared) = engine_with(settings);
        let start = Instant::now();

        // Scroll engages and starts moving
        engine.process_event(&RawEvent::button_down(BTN_MIDDLE, start));
        engine.process_event(&RawEvent::motion(10.0, 0.0, start + Duration::from_millis(10)));
        let (scroll_phase, _, _) = engine.phases();
        assert_ne!(scroll_phase, ScrollPhase::Inactive);

        // Swipe's hold engages: scroll is force-cancelled
        engine.process_event(&RawEvent::button_down(BTN_EXTRA, start + Duration::from_millis(20)));
        let (scroll_phase, _, swipe_phase) = engine.phases();
        assert_eq!(scroll_phase, ScrollPhase::Inactive);
        assert_eq!(swipe_phase, DockSwipePhase::Inactive); // not yet moved

        // Swipe motion now drives the swipe machine
        engine.process_event(&RawEvent::motion(30.0, 0.0, start + Duration::from_millis(30)));
        let (_, _, swipe_phase) = engine.phases();
        assert_eq!(swipe_phase, DockSwipePhase::ShouldBegin);
    }

    #[test]
    fn test_invalid_primary_button_activator_stays_idle() {
        let mut settings = Settings::new();
        settings.scroll.enabled = true;
        settings.scroll.activator = Some(KeyCombination::bare(ChordKey::Button(BTN_RIGHT)));
        let (mut engine, _output, _shared) = engine_with(settings);
        let start = Instant::now();

        // Reserved for normal clicking: passes through, never engages
        assert_eq!(
            engine.process_event(&RawEvent::button_down(BTN_RIGHT, start)),
            EventDecision::PassThrough
        );
        engine.process_event(&RawEvent::motion(50.0, 0.0, start + Duration::from_millis(10)));
        let (scroll_phase, _, _) = engine.phases();
        assert_eq!(scroll_phase, ScrollPhase::Inactive);
    }

    #[test]
    fn test_keyboard_activator_requires_listener() {
        let mut settings = Settings::new();
        settings.scroll.enabled = true;
        settings.scroll.activator = Some(KeyCombination::bare(ChordKey::Key(58)));
        let (mut engine, _output, shared) = engine_with(settings.clone());
        let start = Instant::now();

        engine.process_event(&RawEvent::key_down(58, start));
        engine.process_event(&RawEvent::motion(50.0, 0.0, start + Duration::from_millis(10)));
        assert_eq!(engine.phases().0, ScrollPhase::Inactive);

        // Opting in flips it on at the next event boundary
        settings.keyboard_listening = true;
        shared.store(settings);
        engine.process_event(&RawEvent::key_up(58, start + Duration::from_millis(20)));
        engine.process_event(&RawEvent::key_down(58, start + Duration::from_millis(30)));
        engine.process_event(&RawEvent::motion(50.0, 0.0, start + Duration::from_millis(40)));
        assert_ne!(engine.phases().0, ScrollPhase::Inactive);
    }

    #[test]
    fn test_settings_swap_resets_recognizers() {
        let (mut engine, _output, shared) = engine_with(scroll_on_middle());
        let start = Instant::now();
        engine.process_event(&RawEvent::button_down(BTN_MIDDLE, start));
        engine.process_event(&RawEvent::motion(10.0, 0.0, start + Duration::from_millis(10)));
        assert_ne!(engine.phases().0, ScrollPhase::Inactive);

        // Move the activator to another button mid-hold
        let mut settings = scroll_on_middle();
        settings.scroll.activator = Some(KeyCombination::bare(ChordKey::Button(BTN_SIDE)));
        shared.store(settings);

        // Old activator no longer drives anything
        engine.process_event(&RawEvent::motion(10.0, 0.0, start + Duration::from_millis(20)));
        assert_eq!(engine.phases().0, ScrollPhase::Inactive);
    }

    #[test]
    fn test_tap_trigger_signal_lifecycle() {
        let (mut engine, _output, _shared) = engine_with(Settings::new());
        engine.set_tap_trigger(Some(Activator::new(
            KeyCombination::bare(ChordKey::Button(BTN_SIDE)),
            2,
        )));
        let start = Instant::now();

        let mut t = start;
        for _ in 0..2 {
            engine.process_event(&RawEvent::button_down(BTN_SIDE, t));
            t += Duration::from_millis(30);
            engine.process_event(&RawEvent::button_up(BTN_SIDE, t));
            t += Duration::from_millis(40);
        }

        let deadline = engine.next_deadline().expect("commit pending");
        assert!(engine.fire_due(deadline - Duration::from_millis(1)).is_empty());
        assert_eq!(engine.fire_due(deadline), vec![GestureSignal::TapCompleted]);
        assert!(engine.fire_due(deadline + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_cancel_all_is_idempotent() {
        let (mut engine, _output, _shared) = engine_with(scroll_on_middle());
        let start = Instant::now();
        engine.process_event(&RawEvent::button_down(BTN_MIDDLE, start));
        engine.cancel_all();
        engine.cancel_all();
        assert_eq!(engine.phases().0, ScrollPhase::Inactive);
    }

    #[test]
    fn test_interests_cover_all_kinds() {
        assert_eq!(GestureEngine::interests().len(), 6);
    }
}
