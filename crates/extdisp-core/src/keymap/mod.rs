//! Classification of platform key names for the keyboard translator.
//!
//! Keys arrive from the UI as X keysym names (`Return`, `Control_L`, `F5`,
//! `a`) together with the character they produce, if any.  [`classify_key`]
//! sorts them into the four buckets the translator acts on.  The order of the
//! checks matters: `space` produces a printable character but must still be
//! sent as a named key, so named keys are matched first.

use crate::domain::modifiers::Modifier;

/// Navigation, whitespace and editing keys that are forwarded by name.
pub const NAMED_KEYS: &[&str] = &[
    "Return",
    "BackSpace",
    "Tab",
    "space",
    "Up",
    "Down",
    "Left",
    "Right",
    "Home",
    "End",
    "Page_Up",
    "Page_Down",
    "Delete",
    "Insert",
];

/// Highest function key number forwarded by name.
pub const MAX_FUNCTION_KEY: u8 = 24;

/// What the keyboard translator should do with a key-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyClass {
    /// Send a single named key press.
    Named(String),
    /// Latch and press a modifier.
    Modifier(Modifier),
    /// Type the character, or send it as a chord when ctrl / alt are held.
    Printable(char),
    /// Nothing to send.
    Unmapped,
}

/// Classifies a key by its platform name and the character it produces.
pub fn classify_key(name: &str, character: Option<char>) -> KeyClass {
    if NAMED_KEYS.contains(&name) || is_function_key(name) {
        return KeyClass::Named(name.to_string());
    }

    if let Some(modifier) = Modifier::from_key_name(name) {
        return KeyClass::Modifier(modifier);
    }

    match character {
        Some(c) if !c.is_control() => KeyClass::Printable(c),
        _ => KeyClass::Unmapped,
    }
}

/// Returns `true` for `F1` through `F24`.
pub fn is_function_key(name: &str) -> bool {
    name.strip_prefix('F')
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse::<u8>().ok())
        .map_or(false, |n| (1..=MAX_FUNCTION_KEY).contains(&n))
}
