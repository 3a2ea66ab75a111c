// Gestrs Key Model
// Keyboard keys and pointer buttons, codes from Linux input-event-codes.h

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Pointer button codes (BTN_* range).
pub const BTN_LEFT: u16 = 0x110;
pub const BTN_RIGHT: u16 = 0x111;
pub const BTN_MIDDLE: u16 = 0x112;
pub const BTN_SIDE: u16 = 0x113;
pub const BTN_EXTRA: u16 = 0x114;
pub const BTN_FORWARD: u16 = 0x115;
pub const BTN_BACK: u16 = 0x116;
pub const BTN_TASK: u16 = 0x117;

/// Keyboard modifier codes recognized by the fixed modifier table.
/// Left- and right-hand variants both classify as modifiers; comparisons
/// go through [`canonical_modifier`] so the sides are interchangeable.
pub const MODIFIER_CODES: &[u16] = &[
    29,    // LEFT_CTRL
    97,    // RIGHT_CTRL
    42,    // LEFT_SHIFT
    54,    // RIGHT_SHIFT
    56,    // LEFT_ALT
    100,   // RIGHT_ALT
    125,   // LEFT_META
    126,   // RIGHT_META
    0x1d0, // FN
];

/// A single physical input that can be held down: a keyboard key or a
/// pointer button. Equality and hashing are by (tag, code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChordKey {
    Key(u16),
    Button(u16),
}

impl ChordKey {
    /// The raw hardware code, regardless of tag.
    pub fn code(&self) -> u16 {
        match self {
            ChordKey::Key(code) | ChordKey::Button(code) => *code,
        }
    }

    pub fn is_button(&self) -> bool {
        matches!(self, ChordKey::Button(_))
    }

    /// Whether this input classifies as a modifier in the fixed table.
    /// Buttons are never modifiers.
    pub fn is_modifier(&self) -> bool {
        match self {
            ChordKey::Key(code) => is_modifier_code(*code),
            ChordKey::Button(_) => false,
        }
    }

    /// Left and right mouse buttons are reserved for normal clicking and
    /// need at least one modifier to be usable as an activator.
    pub fn is_primary_button(&self) -> bool {
        matches!(self, ChordKey::Button(code) if *code == BTN_LEFT || *code == BTN_RIGHT)
    }
}

impl fmt::Display for ChordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChordKey::Key(code) => write!(f, "{}", key_name(*code)),
            ChordKey::Button(code) => write!(f, "{}", button_name(*code)),
        }
    }
}

/// Check a raw keyboard code against the fixed modifier table.
pub fn is_modifier_code(code: u16) -> bool {
    MODIFIER_CODES.contains(&code)
}

/// Collapse left/right modifier variants to one canonical code so that a
/// combination configured with "Ctrl" matches either control key.
/// Non-modifier codes pass through unchanged.
pub fn canonical_modifier(code: u16) -> u16 {
    match code {
        97 => 29,   // RIGHT_CTRL -> LEFT_CTRL
        54 => 42,   // RIGHT_SHIFT -> LEFT_SHIFT
        100 => 56,  // RIGHT_ALT -> LEFT_ALT
        126 => 125, // RIGHT_META -> LEFT_META
        other => other,
    }
}

/// Resolve a modifier alias (as written in activator strings) to its
/// canonical chord key. Aliases are case-sensitive, following keyboard
/// remapper config conventions.
pub fn modifier_from_alias(alias: &str) -> Option<ChordKey> {
    let code = match alias {
        "Ctrl" | "C" | "Control" => 29,
        "Shift" => 42,
        "Alt" | "A" | "Opt" | "Option" => 56,
        "Super" | "Win" | "Command" | "Cmd" | "Meta" => 125,
        "Fn" => 0x1d0,
        _ => return None,
    };
    Some(ChordKey::Key(code))
}

/// The primary alias used when formatting a modifier code back to text.
pub fn modifier_alias(code: u16) -> &'static str {
    match canonical_modifier(code) {
        29 => "Ctrl",
        42 => "Shift",
        56 => "Alt",
        125 => "Cmd",
        0x1d0 => "Fn",
        _ => "UNKNOWN",
    }
}

/// Display name for a keyboard code.
pub fn key_name(code: u16) -> &'static str {
    match code {
        1 => "ESC",
        2 => "1",
        3 => "2",
        4 => "3",
        5 => "4",
        6 => "5",
        7 => "6",
        8 => "7",
        9 => "8",
        10 => "9",
        11 => "0",
        14 => "BACKSPACE",
        15 => "TAB",
        16 => "Q",
        17 => "W",
        18 => "E",
        19 => "R",
        20 => "T",
        21 => "Y",
        22 => "U",
        23 => "I",
        24 => "O",
        25 => "P",
        28 => "ENTER",
        29 => "LEFT_CTRL",
        30 => "A",
        31 => "S",
        32 => "D",
        33 => "F",
        34 => "G",
        35 => "H",
        36 => "J",
        37 => "K",
        38 => "L",
        42 => "LEFT_SHIFT",
        44 => "Z",
        45 => "X",
        46 => "C",
        47 => "V",
        48 => "B",
        49 => "N",
        50 => "M",
        54 => "RIGHT_SHIFT",
        56 => "LEFT_ALT",
        57 => "SPACE",
        58 => "CAPSLOCK",
        59 => "F1",
        60 => "F2",
        61 => "F3",
        62 => "F4",
        63 => "F5",
        64 => "F6",
        65 => "F7",
        66 => "F8",
        67 => "F9",
        68 => "F10",
        87 => "F11",
        88 => "F12",
        97 => "RIGHT_CTRL",
        100 => "RIGHT_ALT",
        102 => "HOME",
        103 => "UP",
        104 => "PAGE_UP",
        105 => "LEFT",
        106 => "RIGHT",
        107 => "END",
        108 => "DOWN",
        109 => "PAGE_DOWN",
        110 => "INSERT",
        111 => "DELETE",
        125 => "LEFT_META",
        126 => "RIGHT_META",
        0x1d0 => "FN",
        _ => "UNKNOWN",
    }
}

/// Display name for a pointer button code.
pub fn button_name(code: u16) -> &'static str {
    match code {
        BTN_LEFT => "LeftButton",
        BTN_RIGHT => "RightButton",
        BTN_MIDDLE => "MiddleButton",
        BTN_SIDE => "Button4",
        BTN_EXTRA => "Button5",
        BTN_FORWARD => "Button6",
        BTN_BACK => "Button7",
        BTN_TASK => "Button8",
        _ => "UnknownButton",
    }
}

/// Try to resolve a key name to a chord key.
pub fn key_from_name(name: &str) -> Option<ChordKey> {
    static NAME_TO_CODE: OnceLock<HashMap<&'static str, u16>> = OnceLock::new();
    let map = NAME_TO_CODE.get_or_init(|| {
        let mut map = HashMap::new();
        for code in 1u16..=0x1d0 {
            let name = key_name(code);
            if name != "UNKNOWN" {
                map.insert(name, code);
            }
        }
        map.insert("ESCAPE", 1);
        map
    });
    let upper = name.to_uppercase();
    map.get(upper.as_str()).map(|&code| ChordKey::Key(code))
}

/// Try to resolve a button name ("MiddleButton", "Button4", ...) to a
/// chord key.
pub fn button_from_name(name: &str) -> Option<ChordKey> {
    let code = match name {
        "LeftButton" | "Button1" => BTN_LEFT,
        "RightButton" | "Button2" => BTN_RIGHT,
        "MiddleButton" | "Button3" => BTN_MIDDLE,
        "Button4" => BTN_SIDE,
        "Button5" => BTN_EXTRA,
        "Button6" => BTN_FORWARD,
        "Button7" => BTN_BACK,
        "Button8" => BTN_TASK,
        _ => return None,
    };
    Some(ChordKey::Button(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chord_key_equality() {
        assert_eq!(ChordKey::Key(30), ChordKey::Key(30));
        assert_ne!(ChordKey::Key(30), ChordKey::Key(31));
        // Same code, different tag: never equal
        assert_ne!(ChordKey::Key(0x110), ChordKey::Button(0x110));
    }

    #[test]
    fn test_modifier_classification() {
        assert!(ChordKey::Key(29).is_modifier()); // LEFT_CTRL
        assert!(ChordKey::Key(97).is_modifier()); // RIGHT_CTRL
        assert!(!ChordKey::Key(30).is_modifier()); // A
        assert!(!ChordKey::Button(BTN_MIDDLE).is_modifier());
    }

    #[test]
    fn test_primary_button() {
        assert!(ChordKey::Button(BTN_LEFT).is_primary_button());
        assert!(ChordKey::Button(BTN_RIGHT).is_primary_button());
        assert!(!ChordKey::Button(BTN_MIDDLE).is_primary_button());
        assert!(!ChordKey::Key(30).is_primary_button());
    }

    #[test]
    fn test_canonical_modifier() {
        assert_eq!(canonical_modifier(97), 29);
        assert_eq!(canonical_modifier(29), 29);
        assert_eq!(canonical_modifier(54), 42);
        assert_eq!(canonical_modifier(30), 30);
    }

    #[test]
    fn test_modifier_from_alias() {
        assert_eq!(modifier_from_alias("Ctrl"), Some(ChordKey::Key(29)));
        assert_eq!(modifier_from_alias("Cmd"), Some(ChordKey::Key(125)));
        assert_eq!(modifier_from_alias("ctrl"), None); // case-sensitive
        assert_eq!(modifier_from_alias("NotAMod"), None);
    }

    #[test]
    fn test_key_from_name() {
        assert_eq!(key_from_name("a"), Some(ChordKey::Key(30)));
        assert_eq!(key_from_name("ENTER"), Some(ChordKey::Key(28)));
        assert_eq!(key_from_name("Escape"), Some(ChordKey::Key(1)));
        assert_eq!(key_from_name("NotAKey"), None);
    }

    #[test]
    fn test_button_from_name() {
        assert_eq!(
            button_from_name("MiddleButton"),
            Some(ChordKey::Button(BTN_MIDDLE))
        );
        assert_eq!(button_from_name("Button4"), Some(ChordKey::Button(BTN_SIDE)));
        assert_eq!(button_from_name("Button9"), None);
    }

    #[test]
    fn test_display_round_trip() {
        let key = ChordKey::Button(BTN_MIDDLE);
        assert_eq!(button_from_name(&key.to_string()), Some(key));
        let key = ChordKey::Key(30);
        assert_eq!(key_from_name(&key.to_string()), Some(key));
    }
}
