// Gestrs Dock Swipe Emulation
// Hold-to-swipe: accumulated movement progress becomes a 4-finger swipe

use std::sync::Arc;

use log::debug;

use crate::chord::KeyCombination;
use crate::feature::{ControlOutcome, FeatureKey, MOVEMENT_DEAD_ZONE};
use crate::input::RawEvent;
use crate::output::{GesturePhase, SwipeDirection, SyntheticOutput};
use crate::recognizer::{MouseMovementRecognizer, MovementSample, TapHoldRecognizer};
use crate::scheduler::FrameScheduler;
use crate::throttle::DEFAULT_SAMPLE_RATE_HZ;

/// Swipe intensity per unit of accumulated progress at speed 1.0.
pub const SWIPE_INTENSITY_PER_UNIT: f64 = 0.01;

/// Phase machine of the dock-swipe feature, parameterized by accumulated
/// progress rather than raw deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum DockSwipePhase {
    Inactive,
    ShouldBegin,
    Begin,
    Changed,
    ShouldEnd,
}

/// Configuration snapshot consumed by the dock-swipe controller.
#[derive(Debug, Clone, PartialEq)]
pub struct DockSwipeConfig {
    pub activator: Option<KeyCombination>,
    pub taps_required: u8,
    pub speed: f64,
    pub sample_rate: f64,
}

impl Default for DockSwipeConfig {
    fn default() -> Self {
        Self {
            activator: None,
            taps_required: 1,
            speed: 1.0,
            sample_rate: DEFAULT_SAMPLE_RATE_HZ,
        }
    }
}

/// Hold-to-swipe controller emulating 4-finger trackpad swipes.
pub struct DockSwipeController {
    config: DockSwipeConfig,
    hold: TapHoldRecognizer,
    movement: MouseMovementRecognizer,
    phase: DockSwipePhase,
    progress_x: f64,
    progress_y: f64,
    direction: Option<SwipeDirection>,
    output: Arc<dyn SyntheticOutput>,
    scheduler: Arc<FrameScheduler>,
}

impl DockSwipeController {
    pub fn new(output: Arc<dyn SyntheticOutput>, scheduler: Arc<FrameScheduler>) -> Self {
        Self {
            config: DockSwipeConfig::default(),
            hold: TapHoldRecognizer::new(),
            movement: MouseMovementRecognizer::new(),
            phase: DockSwipePhase::Inactive,
            progress_x: 0.0,
            progress_y: 0.0,
            direction: None,
            output,
            scheduler,
        }
    }

    pub fn key(&self) -> FeatureKey {
        FeatureKey::DockSwipe
    }

    pub fn phase(&self) -> DockSwipePhase {
        self.phase
    }

    pub fn taps_required(&self) -> u8 {
        self.config.taps_required
    }

    /// Swap in a fresh configuration. A changed activator or tap count
    /// resets the recognizers and abandons any gesture in progress.
    pub fn apply_config(&mut self, config: DockSwipeConfig) {
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
        if self.phase == DockSwipePhase::ShouldEnd && !self.hold.is_holding() {
            self.reset_gesture();
        }

        let hold_outcome = self.hold.on_event(event);
        let mut decision = hold_outcome.decision;
        let mut claimed = false;
        match hold_outcome.level {
            Some(true) => {
                debug!("dock swipe hold engaged");
                let _ = self.movement.set_active(true);
                claimed = true;
            }
            Some(false) => {
                if let Some(tail) = self.movement.set_active(false) {
                    if !tail.is_zero() {
                        self.progress_x += tail.dx;
                        self.progress_y += tail.dy;
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
            DockSwipePhase::Begin | DockSwipePhase::Changed
        );
        let direction = self.direction;
        self.hold.cancel();
        self.movement.cancel();
        self.reset_gesture();
        if was_mid_gesture {
            if let Some(direction) = direction {
                let output = Arc::clone(&self.output);
                self.scheduler.schedule(
                    FeatureKey::DockSwipe,
                    vec![Box::new(move || {
                        output.swipe(GesturePhase::Cancelled, direction, 0.0)
                    })],
                );
            }
        }
    }

    fn reset_gesture(&mut self) {
        self.phase = DockSwipePhase::Inactive;
        self.progress_x = 0.0;
        self.progress_y = 0.0;
        self.direction = None;
    }

    fn advance(&mut self, sample: &MovementSample) {
        if !self.hold.is_holding() {
            self.begin_ending();
            return;
        }
        self.progress_x += sample.dx;
        self.progress_y += sample.dy;

        match self.phase {
            DockSwipePhase::Inactive => {
                if sample.magnitude() > MOVEMENT_DEAD_ZONE {
                    self.phase = DockSwipePhase::ShouldBegin;
                    let output = Arc::clone(&self.output);
                    let direction = self.dominant_direction();
                    self.scheduler.schedule(
                        FeatureKey::DockSwipe,
                        vec![Box::new(move || {
                            output.swipe(GesturePhase::MayBegin, direction, 0.0)
                        })],
                    );
                }
            }
            DockSwipePhase::ShouldBegin => {
                let direction = self.dominant_direction();
                self.direction = Some(direction);
                self.phase = DockSwipePhase::Begin;
                debug!("dock swipe begins toward {}", direction);
                let output = Arc::clone(&self.output);
                let intensity = self.intensity();
                self.scheduler.schedule(
                    FeatureKey::DockSwipe,
                    vec![Box::new(move || {
                        output.swipe(GesturePhase::Began, direction, intensity)
                    })],
                );
            }
            DockSwipePhase::Begin | DockSwipePhase::Changed => {
                self.phase = DockSwipePhase::Changed;
                // Direction locks at begin; progress keeps scaling intensity.
                let direction = self.direction.unwrap_or_else(|| self.dominant_direction());
                let output = Arc::clone(&self.output);
                let intensity = self.intensity();
                self.scheduler.schedule(
                    FeatureKey::DockSwipe,
                    vec![Box::new(move || {
                        output.swipe(GesturePhase::Changed, direction, intensity)
                    })],
                );
            }
            DockSwipePhase::ShouldEnd => self.reset_gesture(),
        }
    }

    /// Dominant axis and sign of the accumulated progress.
    fn dominant_direction(&self) -> SwipeDirection {
        if self.progress_x.abs() >= self.progress_y.abs() {
            if self.progress_x >= 0.0 {
                SwipeDirection::Right
            } else {
                SwipeDirection::Left
            }
        } else if self.progress_y >= 0.0 {
            SwipeDirection::Down
        } else {
            SwipeDirection::Up
        }
    }

    fn intensity(&self) -> f64 {
        let progress = self.progress_x.abs().max(self.progress_y.abs());
        progress * SWIPE_INTENSITY_PER_UNIT * self.config.speed
    }

    fn begin_ending(&mut self) {
        match self.phase {
            DockSwipePhase::Inactive | DockSwipePhase::ShouldEnd => return,
            DockSwipePhase::ShouldBegin => {
                self.reset_gesture();
                return;
            }
            DockSwipePhase::Begin | DockSwipePhase::Changed => {}
        }
        debug!("dock swipe phase {} -> {}", self.phase, DockSwipePhase::ShouldEnd);
        self.phase = DockSwipePhase::ShouldEnd;
        let direction = self.direction.unwrap_or_else(|| self.dominant_direction());
        let intensity = self.intensity();
        let output = Arc::clone(&self.output);
        self.scheduler.schedule(
            FeatureKey::DockSwipe,
            vec![Box::new(move || {
                output.swipe(GesturePhase::Ended, direction, intensity)
            })],
        );
    }
}
