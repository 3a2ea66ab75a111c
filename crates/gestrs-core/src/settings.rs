// Gestrs Settings Module
// User-configurable per-feature settings loaded from a TOML file

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::chord::{Activator, KeyCombination};
use crate::config::{parse_activator_string, ActivatorParseError};
use crate::feature::MoveDirection;
use crate::throttle::DEFAULT_SAMPLE_RATE_HZ;

/// Settings for the scroll-emulation feature.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollSettings {
    pub enabled: bool,
    pub activator: Option<KeyCombination>,
    pub taps_required: u8,
    pub speed: f64,
    pub inertia: bool,
    pub sample_rate: f64,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            activator: None,
            taps_required: 1,
            speed: 1.0,
            inertia: true,
            sample_rate: DEFAULT_SAMPLE_RATE_HZ,
        }
    }
}

/// Settings for the zoom/rotate-emulation feature.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomSettings {
    pub enabled: bool,
    pub activator: Option<KeyCombination>,
    pub taps_required: u8,
    pub zoom_direction: MoveDirection,
    pub rotate_direction: MoveDirection,
    pub speed: f64,
    pub sample_rate: f64,
    /// Reuse the scroll activator with one extra tap instead of a
    /// dedicated activator.
    pub double_tap_of_scroll: bool,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            enabled: false,
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

/// Settings for the 4-finger-swipe-emulation feature.
#[derive(Debug, Clone, PartialEq)]
pub struct SwipeSettings {
    pub enabled: bool,
    pub activator: Option<KeyCombination>,
    pub taps_required: u8,
    pub speed: f64,
    pub sample_rate: f64,
}

impl Default for SwipeSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            activator: None,
            taps_required: 1,
            speed: 1.0,
            sample_rate: DEFAULT_SAMPLE_RATE_HZ,
        }
    }
}

/// Engine settings loaded from a TOML file (default:
/// ~/.config/gestrs/settings.toml).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    /// Keystroke capture is opt-in; keyboard activators are invalid
    /// while this is off.
    pub keyboard_listening: bool,
    pub scroll: ScrollSettings,
    pub zoom: ZoomSettings,
    pub swipe: SwipeSettings,
}

/// Errors that can occur when loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("invalid activator in [{section}]: {source}")]
    InvalidActivator {
        section: &'static str,
        source: ActivatorParseError,
    },

    #[error("invalid direction in [{section}]: '{value}'")]
    InvalidDirection {
        section: &'static str,
        value: String,
    },
}

/// TOML representation for deserializing settings.
#[derive(Debug, Clone, serde::Deserialize, Default)]
struct SettingsToml {
    #[serde(default)]
    keyboard_listening: Option<bool>,

    #[serde(default)]
    scroll: Option<ScrollToml>,

    #[serde(default)]
    zoom: Option<ZoomToml>,

    #[serde(default)]
    swipe: Option<SwipeToml>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct ScrollToml {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    activator: Option<String>,
    #[serde(default)]
    taps: Option<u8>,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    inertia: Option<bool>,
    #[serde(default)]
    sample_rate: Option<f64>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct ZoomToml {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    activator: Option<String>,
    #[serde(default)]
    taps: Option<u8>,
    #[serde(default)]
    zoom_direction: Option<String>,
    #[serde(default)]
    rotate_direction: Option<String>,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    sample_rate: Option<f64>,
    #[serde(default)]
    double_tap_of_scroll: Option<bool>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct SwipeToml {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    activator: Option<String>,
    #[serde(default)]
    taps: Option<u8>,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    sample_rate: Option<f64>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml(&content)
    }

    /// Load settings from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let parsed: SettingsToml =
            toml::from_str(content).map_err(|e| SettingsError::TomlParse(e.to_string()))?;

        let mut settings = Self::new();
        settings.keyboard_listening = parsed.keyboard_listening.unwrap_or(false);

        if let Some(scroll) = parsed.scroll {
            let defaults = ScrollSettings::default();
            settings.scroll = ScrollSettings {
                enabled: scroll.enabled.unwrap_or(defaults.enabled),
                activator: parse_optional_activator(scroll.activator.as_deref(), "scroll")?,
                taps_required: scroll.taps.unwrap_or(defaults.taps_required).max(1),
                speed: scroll.speed.unwrap_or(defaults.speed),
                inertia: scroll.inertia.unwrap_or(defaults.inertia),
                sample_rate: scroll.sample_rate.unwrap_or(defaults.sample_rate),
            };
        }

        if let Some(zoom) = parsed.zoom {
            let defaults = ZoomSettings::default();
            let mut zoom_settings = ZoomSettings {
                enabled: zoom.enabled.unwrap_or(defaults.enabled),
                activator: parse_optional_activator(zoom.activator.as_deref(), "zoom")?,
                taps_required: zoom.taps.unwrap_or(defaults.taps_required).max(1),
                zoom_direction: parse_direction(zoom.zoom_direction.as_deref(), "zoom")?,
                rotate_direction: parse_direction(zoom.rotate_direction.as_deref(), "zoom")?,
                speed: zoom.speed.unwrap_or(defaults.speed),
                sample_rate: zoom.sample_rate.unwrap_or(defaults.sample_rate),
                double_tap_of_scroll: zoom
                    .double_tap_of_scroll
                    .unwrap_or(defaults.double_tap_of_scroll),
            };
            // Zoom and rotate cannot share an axis; zoom keeps it.
            if let (Some(za), Some(ra)) = (
                zoom_settings.zoom_direction.axis(),
                zoom_settings.rotate_direction.axis(),
            ) {
                if za == ra {
                    zoom_settings.rotate_direction = MoveDirection::None;
                }
            }
            settings.zoom = zoom_settings;
        }

        if let Some(swipe) = parsed.swipe {
            let defaults = SwipeSettings::default();
            settings.swipe = SwipeSettings {
                enabled: swipe.enabled.unwrap_or(defaults.enabled),
                activator: parse_optional_activator(swipe.activator.as_deref(), "swipe")?,
                taps_required: swipe.taps.unwrap_or(defaults.taps_required).max(1),
                speed: swipe.speed.unwrap_or(defaults.speed),
                sample_rate: swipe.sample_rate.unwrap_or(defaults.sample_rate),
            };
        }

        Ok(settings)
    }

    /// The default settings path (~/.config/gestrs/settings.toml).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gestrs").join("settings.toml"))
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load_default() -> Result<Self, SettingsError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        Ok(Self::new())
    }

    /// The scroll feature's configured activator.
    pub fn scroll_activator(&self) -> Option<Activator> {
        self.scroll
            .activator
            .clone()
            .map(|combination| Activator::new(combination, self.scroll.taps_required))
    }

    /// The zoom feature's configured activator, before double-tap
    /// derivation (see `conflict::effective_activator`).
    pub fn zoom_activator(&self) -> Option<Activator> {
        self.zoom
            .activator
            .clone()
            .map(|combination| Activator::new(combination, self.zoom.taps_required))
    }

    /// The swipe feature's configured activator.
    pub fn swipe_activator(&self) -> Option<Activator> {
        self.swipe
            .activator
            .clone()
            .map(|combination| Activator::new(combination, self.swipe.taps_required))
    }
}

fn parse_optional_activator(
    value: Option<&str>,
    section: &'static str,
) -> Result<Option<KeyCombination>, SettingsError> {
    match value {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_activator_string(s)
            .map(Some)
            .map_err(|source| SettingsError::InvalidActivator { section, source }),
    }
}

fn parse_direction(
    value: Option<&str>,
    section: &'static str,
) -> Result<MoveDirection, SettingsError> {
    match value {
        None => Ok(MoveDirection::None),
        Some(s) => MoveDirection::from_str(s).map_err(|_| SettingsError::InvalidDirection {
            section,
            value: s.to_string(),
        }),
    }
}

/// Shared handle over an immutable settings snapshot.
///
/// Writers (the UI thread) publish a whole new snapshot; readers clone
/// the inner `Arc` under a short read lock and never block the writer
/// for longer than the pointer swap.
#[derive(Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<Arc<Settings>>>,
}

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(settings))),
        }
    }

    /// The current snapshot.
    pub fn load(&self) -> Arc<Settings> {
        Arc::clone(&self.inner.read())
    }

    /// Publish a new snapshot.
    pub fn store(&self, settings: Settings) {
        *self.inner.write() = Arc::new(settings);
    }
}

/// Default settings content for a new installation.
pub fn default_settings_content() -> &'static str {
    r#"# Gestrs Settings
# Place this file at: ~/.config/gestrs/settings.toml

# Keystroke capture is opt-in. Keyboard-key activators only work when
# this is enabled; button activators always work.
keyboard_listening = false

[scroll]
enabled = true
# Hold this to scroll with mouse movement. Primary buttons (LeftButton,
# RightButton) need at least one modifier.
activator = "MiddleButton"
taps = 1
speed = 1.0
inertia = true
sample_rate = 70.0

[zoom]
enabled = false
# Either a dedicated activator, or double_tap_of_scroll = true to use a
# double-tap of the scroll activator.
# activator = "Cmd-MiddleButton"
double_tap_of_scroll = false
# Which movement direction zooms in / rotates counterclockwise.
# Zoom and rotate must use different axes.
zoom_direction = "up"
rotate_direction = "left"
speed = 1.0

[swipe]
enabled = false
# activator = "Button4"
speed = 1.0
"#
}
