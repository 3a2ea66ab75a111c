// Gestrs Input Layer
// Raw intercepted events and the pass-through/consume decision

use std::time::Instant;

use crate::key::ChordKey;

/// Hardware event kinds the engine subscribes to at the interception
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum EventKind {
    KeyDown,
    KeyUp,
    ButtonDown,
    ButtonUp,
    ButtonDrag,
    MouseMoved,
}

/// All event kinds the engine wants intercepted.
pub const INTEREST_SET: &[EventKind] = &[
    EventKind::KeyDown,
    EventKind::KeyUp,
    EventKind::ButtonDown,
    EventKind::ButtonUp,
    EventKind::ButtonDrag,
    EventKind::MouseMoved,
];

/// Modifier-key bitmask as reported by the interception boundary.
/// Informational only: recognizers track held keys from edges themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifierMask(pub u32);

impl ModifierMask {
    pub const CTRL: u32 = 1 << 0;
    pub const SHIFT: u32 = 1 << 1;
    pub const ALT: u32 = 1 << 2;
    pub const META: u32 = 1 << 3;
    pub const FN: u32 = 1 << 4;

    pub fn contains(&self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// One intercepted hardware event.
///
/// Every event carries its own timestamp; recognizers derive all timing
/// from event timestamps rather than reading the clock, which keeps the
/// pipeline deterministic under test.
#[derive(Debug, Clone, Copy)]
pub struct RawEvent {
    pub kind: EventKind,
    /// Keyboard or button code; zero for pure motion events.
    pub code: u16,
    pub mask: ModifierMask,
    pub dx: f64,
    pub dy: f64,
    pub time: Instant,
}

impl RawEvent {
    pub fn key_down(code: u16, time: Instant) -> Self {
        Self {
            kind: EventKind::KeyDown,
            code,
            mask: ModifierMask::default(),
            dx: 0.0,
            dy: 0.0,
            time,
        }
    }

    pub fn key_up(code: u16, time: Instant) -> Self {
        Self {
            kind: EventKind::KeyUp,
            ..Self::key_down(code, time)
        }
    }

    pub fn button_down(code: u16, time: Instant) -> Self {
        Self {
            kind: EventKind::ButtonDown,
            ..Self::key_down(code, time)
        }
    }

    pub fn button_up(code: u16, time: Instant) -> Self {
        Self {
            kind: EventKind::ButtonUp,
            ..Self::key_down(code, time)
        }
    }

    pub fn motion(dx: f64, dy: f64, time: Instant) -> Self {
        Self {
            kind: EventKind::MouseMoved,
            code: 0,
            mask: ModifierMask::default(),
            dx,
            dy,
            time,
        }
    }

    pub fn drag(code: u16, dx: f64, dy: f64, time: Instant) -> Self {
        Self {
            kind: EventKind::ButtonDrag,
            code,
            mask: ModifierMask::default(),
            dx,
            dy,
            time,
        }
    }

    /// The chord key this event presses or releases, if any.
    pub fn chord_key(&self) -> Option<ChordKey> {
        match self.kind {
            EventKind::KeyDown | EventKind::KeyUp => Some(ChordKey::Key(self.code)),
            EventKind::ButtonDown | EventKind::ButtonUp => Some(ChordKey::Button(self.code)),
            EventKind::ButtonDrag | EventKind::MouseMoved => None,
        }
    }

    pub fn is_press(&self) -> bool {
        matches!(self.kind, EventKind::KeyDown | EventKind::ButtonDown)
    }

    pub fn is_release(&self) -> bool {
        matches!(self.kind, EventKind::KeyUp | EventKind::ButtonUp)
    }

    /// Whether this event carries motion deltas.
    pub fn is_motion(&self) -> bool {
        matches!(self.kind, EventKind::MouseMoved | EventKind::ButtonDrag)
    }
}

/// The total outcome of live event processing: either the event continues
/// to the rest of the system unchanged, or it is suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDecision {
    PassThrough,
    Consume,
}

impl EventDecision {
    /// Combine votes from several recognizers: any consume wins.
    pub fn merge(self, other: EventDecision) -> EventDecision {
        if self == EventDecision::Consume || other == EventDecision::Consume {
            EventDecision::Consume
        } else {
            EventDecision::PassThrough
        }
    }
}

/// Command surface of the OS-level interception capability. The platform
/// layer implements this; the engine only enables or disables it.
pub trait EventTap {
    fn enable(&mut self);
    fn disable(&mut self);
    fn is_enabled(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::BTN_MIDDLE;

    #[test]
    fn test_chord_key_extraction() {
        let now = Instant::now();
        assert_eq!(
            RawEvent::key_down(30, now).chord_key(),
            Some(ChordKey::Key(30))
        );
        assert_eq!(
            RawEvent::button_up(BTN_MIDDLE, now).chord_key(),
            Some(ChordKey::Button(BTN_MIDDLE))
        );
        assert_eq!(RawEvent::motion(1.0, 2.0, now).chord_key(), None);
    }

    #[test]
    fn test_edge_classification() {
        let now = Instant::now();
        assert!(RawEvent::key_down(30, now).is_press());
        assert!(!RawEvent::key_down(30, now).is_release());
        assert!(RawEvent::button_up(BTN_MIDDLE, now).is_release());
        assert!(RawEvent::motion(1.0, 0.0, now).is_motion());
        assert!(RawEvent::drag(BTN_MIDDLE, 1.0, 0.0, now).is_motion());
    }

    #[test]
    fn test_decision_merge() {
        use EventDecision::*;
        assert_eq!(PassThrough.merge(PassThrough), PassThrough);
        assert_eq!(PassThrough.merge(Consume), Consume);
        assert_eq!(Consume.merge(PassThrough), Consume);
        assert_eq!(Consume.merge(Consume), Consume);
    }

    #[test]
    fn test_modifier_mask() {
        let mask = ModifierMask(ModifierMask::CTRL | ModifierMask::SHIFT);
        assert!(mask.contains(ModifierMask::CTRL));
        assert!(!mask.contains(ModifierMask::ALT));
        assert!(ModifierMask::default().is_empty());
    }
}
