// Gestrs Zoom/Rotate Emulation
// Hold-to-pinch and hold-to-rotate driven by one movement axis each

use std::sync::Arc;

use log::debug;

use crate::chord::KeyCombination;
use crate::feature::{
    ControlOutcome, FeatureKey, MoveDirection, MOVEMENT_DEAD_ZONE, ZOOM_CONFIRM_THRESHOLD,
};
use crate::input::RawEvent;
use crate::output::{GesturePhase, SyntheticOutput};
use crate::recognizer::{MouseMovementRecognizer, MovementSample, TapHoldRecognizer};
use crate::scheduler::FrameScheduler;
use crate::throttle::DEFAULT_SAMPLE_RATE_HZ;

/// Magnification per movement unit at speed 1.0.
pub const MAGNIFY_PER_UNIT: f64 = 0.005;
/// Rotation degrees per movement unit at speed 1.0.
pub const DEGREES_PER_UNIT: f64 = 0.2;

/// Phase machine of the zoom/rotate feature. `AboutToBegin` accumulates
/// movement until the confirmation threshold is crossed, filtering out
/// jitter that would otherwise trigger a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ZoomRotatePhase {
    Inactive,
    AboutToBegin,
    Begun,
    Changed,
    Ending,
}

/// Which of the two gestures a confirmed activation produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureMode {
    Zoom,
    Rotate,
}

/// Configuration snapshot consumed by the zoom/rotate controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomRotateConfig {
    pub activator: Option<KeyCombination>,
    pub taps_required: u8,
    /// Movement direction that means "zoom in".
    pub zoom_direction: MoveDirection,
    /// Movement direction that means "rotate counterclockwise".
    pub rotate_direction: MoveDirection,
    pub speed: f64,
    pub sample_rate: f64,
    /// Derive the activator from the scroll feature's, with one more tap.
    pub double_tap_of_scroll: bool,
}

impl Default for ZoomRotateConfig {
    fn default() -> Self {
        Self {
            activator: None,
            taps_required: 1,
            zoom_direction: MoveDirection::None,
            rotate_direction: MoveDirection::None,
            speed: 1.0,
            sample_rate: DEFAULT_SAMPLE_RATE_HZ,
            double_tap_of_scroll: false,
        }
    }
}

impl ZoomRotateConfig {
    /// Zoom and rotate directions are mutually exclusive on an axis.
    /// When both land on the same axis the zoom assignment wins and the
    /// rotate assignment is cleared.
    pub fn resolve_direction_conflict(&mut self) {
        if let (Some(za), Some(ra)) = (self.zoom_direction.axis(), self.rotate_direction.axis()) {
            if za == ra {
                self.rotate_direction = MoveDirection::None;
            }
        }
    }
}

/// Hold-to-zoom/rotate controller. A confirmation threshold of
/// accumulated unsigned movement picks the gesture before anything is
/// emitted.
pub struct ZoomRotateController {
    config: ZoomRotateConfig,
    hold: TapHoldRecognizer,
    movement: MouseMovementRecognizer,
    phase: ZoomRotatePhase,
    mode: Option<GestureMode>,
    accumulated_zoom: f64,
    accumulated_rotate: f64,
    output: Arc<dyn SyntheticOutput>,
    scheduler: Arc<FrameScheduler>,
}

impl ZoomRotateController {
    pub fn new(output: Arc<dyn SyntheticOutput>, scheduler: Arc<FrameScheduler>) -> Self {
        Self {
            config: ZoomRotateConfig::default(),
            hold: TapHoldRecognizer::new(),
            movement: MouseMovementRecognizer::new(),
            phase: ZoomRotatePhase::Inactive,
            mode: None,
            accumulated_zoom: 0.0,
            accumulated_rotate: 0.0,
            output,
            scheduler,
        }
    }

    pub fn key(&self) -> FeatureKey {
        FeatureKey::ZoomRotate
    }

    pub fn phase(&self) -> ZoomRotatePhase {
        self.phase
    }

    pub fn taps_required(&self) -> u8 {
        self.config.taps_required
    }

    /// Swap in a fresh configuration (direction conflicts already
    /// resolved by the settings layer). A changed activator or tap count
    /// resets the recognizers and abandons any gesture in progress.
    pub fn apply_config(&mut self, config: ZoomRotateConfig) {
        if config.activator != self.config.activator
            || config.taps_required != self.config.taps_required
        {
            self.hold
                .set_combination(config.activator.clone(), config.taps_required);
            self.movement.cancel();
            self.reset_gesture();
        }
        self.movement.set_sample_rate(config.sample_rate);
        self.config = config;
    }

    pub fn on_event(&mut self, event: &RawEvent) -> ControlOutcome {
        if self.phase == ZoomRotatePhase::Ending && !self.hold.is_holding() {
            self.reset_gesture();
        }

        let hold_outcome = self.hold.on_event(event);
        let mut decision = hold_outcome.decision;
        let mut claimed = false;
        match hold_outcome.level {
            Some(true) => {
                debug!("zoom/rotate hold engaged");
                let _ = self.movement.set_active(true);
                claimed = true;
            }
            Some(false) => {
                let tail = self.movement.set_active(false);
                if let Some(sample) = tail {
                    if !sample.is_zero() && self.phase == ZoomRotatePhase::Changed {
                        self.emit_change(&sample);
                    }
                }
                self.begin_ending();
            }
            None => {}
        }

        if event.is_motion() {
            let (motion_decision, sample) = self.movement.on_motion(event);
            decision = decision.merge(motion_decision);
            if let Some(sample) = sample {
                self.advance(&sample);
            }
        }

        ControlOutcome {
            decision,
            claimed_exclusive: claimed,
        }
    }

    /// Best-effort reset from a sibling claiming the gesture; idempotent.
    pub fn cancel(&mut self) {
        let was_mid_gesture = matches!(
            self.phase,
            ZoomRotatePhase::Begun | ZoomRotatePhase::Changed
        );
        let mode = self.mode;
        self.hold.cancel();
        self.movement.cancel();
        self.reset_gesture();
        if was_mid_gesture {
            let output = Arc::clone(&self.output);
            self.scheduler.schedule(
                FeatureKey::ZoomRotate,
                vec![Box::new(move || match mode {
                    Some(GestureMode::Rotate) => output.rotate(GesturePhase::Cancelled, 0.0),
                    _ => output.magnify(GesturePhase::Cancelled, 0.0),
                })],
            );
        }
    }

    fn reset_gesture(&mut self) {
        self.phase = ZoomRotatePhase::Inactive;
        self.mode = None;
        self.accumulated_zoom = 0.0;
        self.accumulated_rotate = 0.0;
    }

    fn advance(&mut self, sample: &MovementSample) {
        if !self.hold.is_holding() {
            self.begin_ending();
            return;
        }
        match self.phase {
            ZoomRotatePhase::Inactive => {
                if sample.magnitude() <= MOVEMENT_DEAD_ZONE {
                    return;
                }
                self.phase = ZoomRotatePhase::AboutToBegin;
                self.accumulate(sample);
                self.try_confirm();
            }
            ZoomRotatePhase::AboutToBegin => {
                self.accumulate(sample);
                self.try_confirm();
            }
            ZoomRotatePhase::Begun | ZoomRotatePhase::Changed => {
                self.phase = ZoomRotatePhase::Changed;
                self.emit_change(sample);
            }
            ZoomRotatePhase::Ending => self.reset_gesture(),
        }
    }

    fn accumulate(&mut self, sample: &MovementSample) {
        self.accumulated_zoom += self.config.zoom_direction.project(sample).abs();
        self.accumulated_rotate += self.config.rotate_direction.project(sample).abs();
    }

    fn try_confirm(&mut self) {
        let Some(mode) = self.confirmed_mode() else {
            return;
        };
        debug!("zoom/rotate confirmed as {:?}", mode);
        self.mode = Some(mode);
        self.phase = ZoomRotatePhase::Begun;
        let output = Arc::clone(&self.output);
        self.scheduler.schedule(
            FeatureKey::ZoomRotate,
            vec![Box::new(move || match mode {
                GestureMode::Zoom => output.magnify(GesturePhase::Began, 0.0),
                GestureMode::Rotate => output.rotate(GesturePhase::Began, 0.0),
            })],
        );
    }

    /// The gesture whose configured axis first crosses the confirmation
    /// threshold. Zoom wins a same-sample tie.
    fn confirmed_mode(&self) -> Option<GestureMode> {
        if self.config.zoom_direction != MoveDirection::None
            && self.accumulated_zoom >= ZOOM_CONFIRM_THRESHOLD
        {
            return Some(GestureMode::Zoom);
        }
        if self.config.rotate_direction != MoveDirection::None
            && self.accumulated_rotate >= ZOOM_CONFIRM_THRESHOLD
        {
            return Some(GestureMode::Rotate);
        }
        None
    }

    fn emit_change(&mut self, sample: &MovementSample) {
        let Some(mode) = self.mode else {
            return;
        };
        let output = Arc::clone(&self.output);
        let speed = self.config.speed;
        match mode {
            GestureMode::Zoom => {
                let magnification =
                    self.config.zoom_direction.project(sample) * MAGNIFY_PER_UNIT * speed;
                self.scheduler.schedule(
                    FeatureKey::ZoomRotate,
                    vec![Box::new(move || {
                        output.magnify(GesturePhase::Changed, magnification)
                    })],
                );
            }
            GestureMode::Rotate => {
                let degrees =
                    self.config.rotate_direction.project(sample) * DEGREES_PER_UNIT * speed;
                self.scheduler.schedule(
                    FeatureKey::ZoomRotate,
                    vec![Box::new(move || output.rotate(GesturePhase::Changed, degrees))],
                );
            }
        }
    }

    fn begin_ending(&mut self) {
        match self.phase {
            ZoomRotatePhase::Inactive | ZoomRotatePhase::Ending => return,
            ZoomRotatePhase::AboutToBegin => {
                // Never confirmed: nothing was emitted, nothing to end.
                self.reset_gesture();
                return;
            }
            ZoomRotatePhase::Begun | ZoomRotatePhase::Changed => {}
        }
        debug!("zoom/rotate phase {} -> {}", self.phase, ZoomRotatePhase::Ending);
        self.phase = ZoomRotatePhase::Ending;
        let mode = self.mode;
        let output = Arc::clone(&self.output);
        self.scheduler.schedule(
            FeatureKey::ZoomRotate,
            vec![Box::new(move || match mode {
                Some(GestureMode::Rotate) => output.rotate(GesturePhase::Ended, 0.0),
                _ => output.magnify(GesturePhase::Ended, 0.0),
            })],
        );
    }
}
