// Gestrs Conflict / Validity Checking
// Pure functions over the chord model and the settings snapshot

use crate::chord::Activator;
use crate::feature::FeatureKey;
use crate::settings::Settings;

/// Reasons an activator is unusable. Surfaced to configuration
/// validation only; live event processing never produces these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActivatorInvalidReason {
    /// Left/right mouse buttons without a modifier are reserved for
    /// normal clicking.
    #[error("primary mouse buttons need at least one modifier")]
    PrimaryButtonNeedsModifier,

    /// Keyboard-key activators require the opt-in keystroke listener.
    #[error("keyboard activators require keyboard listening to be enabled")]
    NeedsKeyboardListener,
}

const ALL_FEATURES: [FeatureKey; 3] = [
    FeatureKey::Scroll,
    FeatureKey::ZoomRotate,
    FeatureKey::DockSwipe,
];

/// Whether a feature is enabled in the settings snapshot.
pub fn is_enabled(feature: FeatureKey, settings: &Settings) -> bool {
    match feature {
        FeatureKey::Scroll => settings.scroll.enabled,
        FeatureKey::ZoomRotate => settings.zoom.enabled,
        FeatureKey::DockSwipe => settings.swipe.enabled,
    }
}

/// The activator a feature actually listens for, with derived tap counts
/// folded in: a zoom feature reusing the scroll activator as a
/// double-tap gets the scroll combination with one more tap required.
pub fn effective_activator(feature: FeatureKey, settings: &Settings) -> Option<Activator> {
    match feature {
        FeatureKey::Scroll => settings.scroll_activator(),
        FeatureKey::ZoomRotate => {
            if settings.zoom.double_tap_of_scroll {
                settings.scroll_activator().map(|a| a.doubled())
            } else {
                settings.zoom_activator()
            }
        }
        FeatureKey::DockSwipe => settings.swipe_activator(),
    }
}

/// Whether any other enabled feature's effective activator equals this
/// feature's. Disabled features never conflict.
pub fn has_conflict(feature: FeatureKey, settings: &Settings) -> bool {
    if !is_enabled(feature, settings) {
        return false;
    }
    let Some(own) = effective_activator(feature, settings) else {
        return false;
    };
    ALL_FEATURES.iter().any(|&other| {
        other != feature
            && is_enabled(other, settings)
            && effective_activator(other, settings).as_ref() == Some(&own)
    })
}

/// All conflicting pairs among enabled features, each pair reported once.
pub fn conflicts(settings: &Settings) -> Vec<(FeatureKey, FeatureKey)> {
    let mut pairs = Vec::new();
    for (i, &a) in ALL_FEATURES.iter().enumerate() {
        for &b in &ALL_FEATURES[i + 1..] {
            if !is_enabled(a, settings) || !is_enabled(b, settings) {
                continue;
            }
            let (Some(aa), Some(ab)) = (
                effective_activator(a, settings),
                effective_activator(b, settings),
            ) else {
                continue;
            };
            if aa == ab {
                pairs.push((a, b));
            }
        }
    }
    pairs
}

/// Validate one activator against the settings snapshot.
pub fn validate(activator: &Activator, settings: &Settings) -> Result<(), ActivatorInvalidReason> {
    let combination = activator.combination();
    let trigger = combination.activator();
    if trigger.is_primary_button() && combination.modifiers().is_empty() {
        return Err(ActivatorInvalidReason::PrimaryButtonNeedsModifier);
    }
    if !trigger.is_button() && !settings.keyboard_listening {
        return Err(ActivatorInvalidReason::NeedsKeyboardListener);
    }
    Ok(())
}

/// Validate a feature's effective activator; `None` means no finding
/// (including "no activator configured", which leaves the feature idle
/// rather than invalid).
pub fn validate_feature(feature: FeatureKey, settings: &Settings) -> Option<ActivatorInvalidReason> {
    let activator = effective_activator(feature, settings)?;
    validate(&activator, settings).err()
}
