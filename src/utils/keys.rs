//! Parsing of `send_keys` input into chords, named keys and plain text

use serde::{Deserialize, Serialize};

/// Keyboard modifier with its CDP `Input.dispatchKeyEvent` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modifier {
    Alt,
    Control,
    Meta,
    Shift,
}

impl Modifier {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "alt" | "option" => Some(Modifier::Alt),
            "control" | "ctrl" => Some(Modifier::Control),
            "meta" | "command" | "cmd" => Some(Modifier::Meta),
            "shift" => Some(Modifier::Shift),
            _ => None,
        }
    }

    pub fn flag(self) -> i64 {
        match self {
            Modifier::Alt => 1,
            Modifier::Control => 2,
            Modifier::Meta => 4,
            Modifier::Shift => 8,
        }
    }
}

/// A single key press with optional held modifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyChord {
    pub modifiers: Vec<Modifier>,
    pub key: String,
}

impl KeyChord {
    pub fn named(key: impl Into<String>) -> Self {
        Self {
            modifiers: Vec::new(),
            key: key.into(),
        }
    }

    /// Combined modifier bitmask for CDP key events
    pub fn modifier_flags(&self) -> i64 {
        self.modifiers.iter().fold(0, |flags, m| flags | m.flag())
    }

    /// Text produced by the key when pressed without modifiers, if any
    pub fn text(&self) -> Option<String> {
        if self.modifier_flags() & !Modifier::Shift.flag() != 0 {
            return None;
        }
        match self.key.as_str() {
            "Enter" => Some("\r".to_string()),
            "Tab" => Some("\t".to_string()),
            "Space" => Some(" ".to_string()),
            key if key.chars().count() == 1 => Some(key.to_string()),
            _ => None,
        }
    }
}

/// How a `send_keys` string is delivered to the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInput {
    /// Modifier combination sent as one chord
    Chord(KeyChord),
    /// A single named key pressed once
    Named(KeyChord),
    /// Plain text typed character by character
    Text(String),
}

const NAMED_KEYS: &[&str] = &[
    "Enter",
    "Tab",
    "Escape",
    "Backspace",
    "Delete",
    "ArrowUp",
    "ArrowDown",
    "ArrowLeft",
    "ArrowRight",
    "Home",
    "End",
    "PageUp",
    "PageDown",
    "Space",
    "Insert",
    "F1",
    "F2",
    "F3",
    "F4",
    "F5",
    "F6",
    "F7",
    "F8",
    "F9",
    "F10",
    "F11",
    "F12",
];

fn named_key(name: &str) -> Option<&'static str> {
    let name = name.trim();
    let aliased = match name.to_lowercase().as_str() {
        "esc" => "Escape",
        "return" => "Enter",
        "del" => "Delete",
        "up" => "ArrowUp",
        "down" => "ArrowDown",
        "left" => "ArrowLeft",
        "right" => "ArrowRight",
        _ => name,
    };
    NAMED_KEYS
        .iter()
        .copied()
        .find(|k| k.eq_ignore_ascii_case(aliased))
}

impl KeyInput {
    pub fn parse(keys: &str) -> Self {
        if let Some(chord) = Self::parse_chord(keys) {
            return KeyInput::Chord(chord);
        }
        if let Some(key) = named_key(keys) {
            return KeyInput::Named(KeyChord::named(key));
        }
        KeyInput::Text(keys.to_string())
    }

    fn parse_chord(keys: &str) -> Option<KeyChord> {
        let parts: Vec<&str> = keys.split('+').collect();
        let (key, modifiers) = parts.split_last()?;
        if modifiers.is_empty() || key.trim().is_empty() {
            return None;
        }
        let modifiers = modifiers
            .iter()
            .map(|m| Modifier::parse(m))
            .collect::<Option<Vec<_>>>()?;
        let key = match named_key(key) {
            Some(named) => named.to_string(),
            None => key.trim().to_string(),
        };
        Some(KeyChord { modifiers, key })
    }
}
