// Gestrs Chord Model
// Key combinations and activators: which inputs must be held, which single
// input triggers, and how many repeated triggers are required

use std::collections::HashSet;
use std::fmt;

use smallvec::SmallVec;

use crate::key::{canonical_modifier, is_modifier_code, modifier_alias, ChordKey};

/// A set of held modifiers plus exactly one non-modifier trigger.
///
/// Modifiers are stored canonicalized (left/right collapsed), sorted and
/// deduplicated, so equality and hashing are order-independent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombination {
    modifiers: SmallVec<[ChordKey; 4]>,
    activator: ChordKey,
}

impl KeyCombination {
    /// Create a combination from explicit modifiers and a trigger.
    ///
    /// Modifier entries that are not actually modifier keys are dropped;
    /// duplicates (including left/right variants of the same modifier)
    /// collapse to one entry.
    pub fn new(modifiers: impl IntoIterator<Item = ChordKey>, activator: ChordKey) -> Self {
        let mut canon: SmallVec<[ChordKey; 4]> = modifiers
            .into_iter()
            .filter(|k| k.is_modifier())
            .map(|k| ChordKey::Key(canonical_modifier(k.code())))
            .collect();
        canon.sort();
        canon.dedup();
        Self {
            modifiers: canon,
            activator,
        }
    }

    /// Create a combination with no modifiers.
    pub fn bare(activator: ChordKey) -> Self {
        Self::new([], activator)
    }

    /// Classify an arbitrary set of pressed inputs into modifiers and a
    /// single activator. Returns `None` when no non-modifier input is
    /// present.
    ///
    /// When more than one non-modifier input is pressed, the lowest code
    /// wins (buttons compare after keys), giving a deterministic
    /// tie-break instead of depending on iteration order.
    pub fn from_pressed(pressed: impl IntoIterator<Item = ChordKey>) -> Option<Self> {
        let mut modifiers: SmallVec<[ChordKey; 4]> = SmallVec::new();
        let mut candidates: Vec<ChordKey> = Vec::new();
        for key in pressed {
            if key.is_modifier() {
                modifiers.push(key);
            } else {
                candidates.push(key);
            }
        }
        let activator = candidates.into_iter().min()?;
        Some(Self::new(modifiers, activator))
    }

    pub fn modifiers(&self) -> &[ChordKey] {
        &self.modifiers
    }

    pub fn activator(&self) -> ChordKey {
        self.activator
    }

    /// Whether the currently held keyboard keys satisfy exactly this
    /// combination's modifier set: every configured modifier is down and
    /// no other modifier key is.
    pub fn modifiers_satisfied(&self, held_keys: &HashSet<u16>) -> bool {
        let held: HashSet<u16> = held_keys
            .iter()
            .copied()
            .filter(|&code| is_modifier_code(code))
            .map(canonical_modifier)
            .collect();
        let wanted: HashSet<u16> = self.modifiers.iter().map(|k| k.code()).collect();
        held == wanted
    }
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}-", modifier_alias(modifier.code()))?;
        }
        write!(f, "{}", self.activator)
    }
}

/// A key combination plus the number of repeated triggers required to
/// activate a feature. Equality of activators is the basis for conflict
/// detection between features.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Activator {
    combination: KeyCombination,
    taps_required: u8,
}

impl Activator {
    /// Create an activator. A tap count of zero is clamped to one.
    pub fn new(combination: KeyCombination, taps_required: u8) -> Self {
        Self {
            combination,
            taps_required: taps_required.max(1),
        }
    }

    pub fn combination(&self) -> &KeyCombination {
        &self.combination
    }

    pub fn taps_required(&self) -> u8 {
        self.taps_required
    }

    /// The same combination with one more tap required: the effective
    /// activator of a feature that "doubles" this one.
    pub fn doubled(&self) -> Self {
        Self {
            combination: self.combination.clone(),
            taps_required: self.taps_required.saturating_add(1),
        }
    }
}

impl fmt::Display for Activator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.taps_required > 1 {
            write!(f, "{} x{}", self.combination, self.taps_required)
        } else {
            write!(f, "{}", self.combination)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{BTN_MIDDLE, BTN_SIDE};

    #[test]
    fn test_combination_equality_order_independent() {
        let a = KeyCombination::new(
            [ChordKey::Key(29), ChordKey::Key(42)],
            ChordKey::Button(BTN_MIDDLE),
        );
        let b = KeyCombination::new(
            [ChordKey::Key(42), ChordKey::Key(29)],
            ChordKey::Button(BTN_MIDDLE),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_combination_collapses_sides() {
        // RIGHT_CTRL configures the same combination as LEFT_CTRL
        let left = KeyCombination::new([ChordKey::Key(29)], ChordKey::Key(30));
        let right = KeyCombination::new([ChordKey::Key(97)], ChordKey::Key(30));
        assert_eq!(left, right);
    }

    #[test]
    fn test_from_pressed_classification() {
        let combo = KeyCombination::from_pressed([
            ChordKey::Key(29),
            ChordKey::Button(BTN_MIDDLE),
            ChordKey::Key(42),
        ])
        .unwrap();
        assert_eq!(combo.modifiers().len(), 2);
        assert_eq!(combo.activator(), ChordKey::Button(BTN_MIDDLE));
    }

    #[test]
    fn test_from_pressed_requires_non_modifier() {
        assert!(KeyCombination::from_pressed([ChordKey::Key(29), ChordKey::Key(42)]).is_none());
        assert!(KeyCombination::from_pressed([]).is_none());
    }

    #[test]
    fn test_from_pressed_lowest_code_wins() {
        // Two non-modifier candidates: deterministic tie-break on lowest code
        let combo = KeyCombination::from_pressed([
            ChordKey::Key(31),
            ChordKey::Key(30),
            ChordKey::Key(29),
        ])
        .unwrap();
        assert_eq!(combo.activator(), ChordKey::Key(30));

        // Keys order before buttons regardless of insertion order
        let combo = KeyCombination::from_pressed([
            ChordKey::Button(BTN_SIDE),
            ChordKey::Key(30),
        ])
        .unwrap();
        assert_eq!(combo.activator(), ChordKey::Key(30));
    }

    #[test]
    fn test_modifiers_satisfied_exact_match() {
        let combo = KeyCombination::new([ChordKey::Key(29)], ChordKey::Button(BTN_MIDDLE));

        let mut held = HashSet::new();
        held.insert(29u16);
        assert!(combo.modifiers_satisfied(&held));

        // Right-hand variant satisfies the canonical modifier
        let mut held = HashSet::new();
        held.insert(97u16);
        assert!(combo.modifiers_satisfied(&held));

        // Extra modifier held: no match
        held.insert(42u16);
        assert!(!combo.modifiers_satisfied(&held));

        // Nothing held: no match
        assert!(!combo.modifiers_satisfied(&HashSet::new()));
    }

    #[test]
    fn test_bare_combination_rejects_held_modifiers() {
        let combo = KeyCombination::bare(ChordKey::Button(BTN_MIDDLE));
        assert!(combo.modifiers_satisfied(&HashSet::new()));

        let mut held = HashSet::new();
        held.insert(29u16);
        assert!(!combo.modifiers_satisfied(&held));

        // Non-modifier keys held elsewhere don't interfere
        let mut held = HashSet::new();
        held.insert(30u16);
        assert!(combo.modifiers_satisfied(&held));
    }

    #[test]
    fn test_activator_equality() {
        let combo = KeyCombination::bare(ChordKey::Button(BTN_MIDDLE));
        let a = Activator::new(combo.clone(), 1);
        let b = Activator::new(combo.clone(), 1);
        let c = Activator::new(combo, 2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_activator_doubled() {
        let combo = KeyCombination::bare(ChordKey::Button(BTN_MIDDLE));
        let parent = Activator::new(combo.clone(), 1);
        let direct = Activator::new(combo, 2);
        assert_eq!(parent.doubled(), direct);
    }

    #[test]
    fn test_activator_clamps_zero_taps() {
        let combo = KeyCombination::bare(ChordKey::Key(30));
        assert_eq!(Activator::new(combo, 0).taps_required(), 1);
    }

    #[test]
    fn test_combination_display() {
        let combo = KeyCombination::new(
            [ChordKey::Key(125), ChordKey::Key(42)],
            ChordKey::Button(BTN_MIDDLE),
        );
        let s = combo.to_string();
        assert!(s.contains("Cmd"));
        assert!(s.contains("Shift"));
        assert!(s.ends_with("MiddleButton"));
    }
}
