// Gestrs Scroll Emulation
// Hold-to-scroll: movement becomes a phased scroll + companion gesture
// stream, with an optional frame-paced inertia tail

use std::sync::Arc;

use log::debug;

use crate::chord::KeyCombination;
use crate::feature::{ControlOutcome, FeatureKey, MOVEMENT_DEAD_ZONE};
use crate::input::RawEvent;
use crate::output::{GesturePhase, SyntheticOutput};
use crate::recognizer::{MouseMovementRecognizer, MovementSample, TapHoldRecognizer};
use crate::scheduler::{FrameScheduler, FrameTask};
use crate::throttle::DEFAULT_SAMPLE_RATE_HZ;

/// Per-frame decay of the inertia tail.
pub const MOMENTUM_DECAY: f64 = 0.85;
/// Inertia stops when the frame delta falls below this magnitude.
pub const MOMENTUM_MIN_MAGNITUDE: f64 = 0.5;
/// Hard cap on inertia frames, one per display tick.
pub const MOMENTUM_MAX_FRAMES: usize = 60;

/// Phase machine of the scroll feature. Advances one state per movement
/// sample while the hold is engaged; a dropped hold forces
/// `EverythingShouldEnd` from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ScrollPhase {
    Inactive,
    ScrollShouldBegin,
    ScrollBegun,
    GestureShouldBegin,
    GestureRestarting,
    GestureBegun,
    EverythingShouldEnd,
}

/// Configuration snapshot consumed by the scroll controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollConfig {
    pub activator: Option<KeyCombination>,
    pub taps_required: u8,
    pub speed: f64,
    pub inertia: bool,
    pub sample_rate: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            activator: None,
            taps_required: 1,
            speed: 1.0,
            inertia: true,
            sample_rate: DEFAULT_SAMPLE_RATE_HZ,
        }
    }
}

/// Hold-to-scroll controller: a tap-hold recognizer gates a movement
/// recognizer whose samples drive the phase machine; emissions are paced
/// through the frame scheduler.
pub struct ScrollController {
    config: ScrollConfig,
    hold: TapHoldRecognizer,
    movement: MouseMovementRecognizer,
    phase: ScrollPhase,
    last_velocity: MovementSample,
    output: Arc<dyn SyntheticOutput>,
    scheduler: Arc<FrameScheduler>,
}

impl ScrollController {
    pub fn new(output: Arc<dyn SyntheticOutput>, scheduler: Arc<FrameScheduler>) -> Self {
        Self {
            config: ScrollConfig::default(),
            hold: TapHoldRecognizer::new(),
            movement: MouseMovementRecognizer::new(),
            phase: ScrollPhase::Inactive,
            last_velocity: MovementSample::ZERO,
            output,
            scheduler,
        }
    }

    pub fn key(&self) -> FeatureKey {
        FeatureKey::Scroll
    }

    pub fn phase(&self) -> ScrollPhase {
        self.phase
    }

    pub fn is_engaged(&self) -> bool {
        self.hold.is_holding()
    }

    pub fn taps_required(&self) -> u8 {
        self.config.taps_required
    }

    /// Swap in a fresh configuration. A changed activator or tap count
    /// resets the recognizers and abandons any gesture in progress.
    pub fn apply_config(&mut self, config: ScrollConfig) {
        if config.activator != self.config.activator
            || config.taps_required != self.config.taps_required
        {
            self.hold
                .set_combination(config.activator.clone(), config.taps_required);
            self.movement.cancel();
            self.phase = ScrollPhase::Inactive;
            self.last_velocity = MovementSample::ZERO;
        }
        self.movement.set_sample_rate(config.sample_rate);
        self.config = config;
    }

    /// Process one raw event.
    pub fn on_event(&mut self, event: &RawEvent) -> ControlOutcome {
        // A forced ending returns to idle on the next event.
        if self.phase == ScrollPhase::EverythingShouldEnd && !self.hold.is_holding() {
            self.phase = ScrollPhase::Inactive;
        }

        let hold_outcome = self.hold.on_event(event);
        let mut decision = hold_outcome.decision;
        let mut claimed = false;
        match hold_outcome.level {
            Some(true) => {
                debug!("scroll hold engaged");
                let _ = self.movement.set_active(true);
                claimed = true;
            }
            Some(false) => {
                if let Some(tail) = self.movement.set_active(false) {
                    if !tail.is_zero() {
                        self.last_velocity = self.scaled(&tail);
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
        let was_mid_gesture = !matches!(
            self.phase,
            ScrollPhase::Inactive | ScrollPhase::EverythingShouldEnd
        );
        self.hold.cancel();
        self.movement.cancel();
        self.phase = ScrollPhase::Inactive;
        self.last_velocity = MovementSample::ZERO;
        if was_mid_gesture {
            let output = Arc::clone(&self.output);
            self.scheduler.schedule(
                FeatureKey::Scroll,
                vec![Box::new(move || {
                    output.gesture(GesturePhase::Cancelled);
                    output.scroll(GesturePhase::Cancelled, 0.0, 0.0);
                })],
            );
        }
    }

    fn scaled(&self, sample: &MovementSample) -> MovementSample {
        MovementSample::new(sample.dx * self.config.speed, sample.dy * self.config.speed)
    }

    fn advance(&mut self, sample: &MovementSample) {
        if !self.hold.is_holding() {
            self.begin_ending();
            return;
        }
        let scaled = self.scaled(sample);
        let output = Arc::clone(&self.output);

        let next = match self.phase {
            ScrollPhase::Inactive => {
                if sample.magnitude() <= MOVEMENT_DEAD_ZONE {
                    return;
                }
                self.scheduler.schedule(
                    FeatureKey::Scroll,
                    vec![Box::new(move || output.scroll(GesturePhase::MayBegin, 0.0, 0.0))],
                );
                ScrollPhase::ScrollShouldBegin
            }
            ScrollPhase::ScrollShouldBegin => {
                self.scheduler.schedule(
                    FeatureKey::Scroll,
                    vec![Box::new(move || {
                        output.scroll(GesturePhase::Began, scaled.dx, scaled.dy)
                    })],
                );
                ScrollPhase::ScrollBegun
            }
            ScrollPhase::ScrollBegun => {
                self.scheduler.schedule(
                    FeatureKey::Scroll,
                    vec![Box::new(move || {
                        output.gesture(GesturePhase::MayBegin);
                        output.scroll(GesturePhase::Changed, scaled.dx, scaled.dy);
                    })],
                );
                ScrollPhase::GestureShouldBegin
            }
            ScrollPhase::GestureShouldBegin => {
                self.scheduler.schedule(
                    FeatureKey::Scroll,
                    vec![Box::new(move || {
                        output.gesture(GesturePhase::Began);
                        output.scroll(GesturePhase::Changed, scaled.dx, scaled.dy);
                    })],
                );
                ScrollPhase::GestureRestarting
            }
            ScrollPhase::GestureRestarting => {
                self.scheduler.schedule(
                    FeatureKey::Scroll,
                    vec![Box::new(move || {
                        output.gesture(GesturePhase::Changed);
                        output.scroll(GesturePhase::Changed, scaled.dx, scaled.dy);
                    })],
                );
                ScrollPhase::GestureBegun
            }
            ScrollPhase::GestureBegun => {
                // Steady state: every sample becomes one paced emission.
                self.scheduler.schedule(
                    FeatureKey::Scroll,
                    vec![Box::new(move || {
                        output.scroll(GesturePhase::Changed, scaled.dx, scaled.dy)
                    })],
                );
                ScrollPhase::GestureBegun
            }
            ScrollPhase::EverythingShouldEnd => ScrollPhase::Inactive,
        };
        if next != ScrollPhase::Inactive {
            self.last_velocity = scaled;
        }
        if next != self.phase {
            debug!("scroll phase {} -> {}", self.phase, next);
            self.phase = next;
        }
    }

    fn begin_ending(&mut self) {
        if self.phase == ScrollPhase::Inactive || self.phase == ScrollPhase::EverythingShouldEnd {
            return;
        }
        debug!("scroll phase {} -> {}", self.phase, ScrollPhase::EverythingShouldEnd);
        self.phase = ScrollPhase::EverythingShouldEnd;

        let mut tasks: Vec<FrameTask> = Vec::new();
        let output = Arc::clone(&self.output);
        tasks.push(Box::new(move || {
            output.gesture(GesturePhase::Ended);
            output.scroll(GesturePhase::Ended, 0.0, 0.0);
        }));
        if self.config.inertia {
            tasks.extend(momentum_tail(&self.output, self.last_velocity));
        }
        self.scheduler.schedule(FeatureKey::Scroll, tasks);
        self.last_velocity = MovementSample::ZERO;
    }
}

/// Build the frame-paced inertia tail: a decaying momentum sequence from
/// the final scroll velocity.
fn momentum_tail(
    output: &Arc<dyn SyntheticOutput>,
    velocity: MovementSample,
) -> Vec<FrameTask> {
    let mut tasks: Vec<FrameTask> = Vec::new();
    let mut v = velocity;
    if v.magnitude() < MOMENTUM_MIN_MAGNITUDE {
        return tasks;
    }

    let o = Arc::clone(output);
    tasks.push(Box::new(move || o.momentum_scroll(GesturePhase::Began, v.dx, v.dy)));
    for _ in 0..MOMENTUM_MAX_FRAMES {
        v = MovementSample::new(v.dx * MOMENTUM_DECAY, v.dy * MOMENTUM_DECAY);
        if v.magnitude() < MOMENTUM_MIN_MAGNITUDE {
            break;
        }
        let o = Arc::clone(output);
        let frame = v;
        tasks.push(Box::new(move || {
            o.momentum_scroll(GesturePhase::Changed, frame.dx, frame.dy)
        }));
    }
    let o = Arc::clone(output);
    tasks.push(Box::new(move || o.momentum_scroll(GesturePhase::Ended, 0.0, 0.0)));
    tasks
}
