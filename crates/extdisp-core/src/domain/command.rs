//! Backend commands: the atomic synthetic input actions sent to the target
//! display.
//!
//! Both translators in `extdisp-app` produce a stream of [`BackendCommand`]
//! values.  The synthetic input backend is responsible for turning each one
//! into whatever the transport needs (an `xdotool` invocation, an XTest call,
//! a uinput write).  The command vocabulary is deliberately small so that any
//! transport can satisfy it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::modifiers::Modifier;

/// A logical pointer button.
///
/// The UI reports buttons using the platform numbering (1 = primary,
/// 2 = middle, 3 = secondary); [`PointerButton::from_platform`] converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    /// Maps a platform button number to a logical button.
    ///
    /// Returns `None` for numbers outside 1..=3 (extra buttons and wheel
    /// pseudo-buttons are not produced by the touch surface).
    pub fn from_platform(number: u32) -> Option<Self> {
        match number {
            1 => Some(Self::Primary),
            2 => Some(Self::Middle),
            3 => Some(Self::Secondary),
            _ => None,
        }
    }

    /// X11 core protocol button number.
    pub fn x11_number(self) -> u8 {
        match self {
            Self::Primary => 1,
            Self::Middle => 2,
            Self::Secondary => 3,
        }
    }
}

/// Direction of a wheel scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    /// X11 wheel pseudo-button for this direction under `mapping`.
    pub fn x11_button(self, mapping: WheelMapping) -> u8 {
        match (mapping, self) {
            (WheelMapping::Traditional, Self::Up) | (WheelMapping::Natural, Self::Down) => 4,
            (WheelMapping::Traditional, Self::Down) | (WheelMapping::Natural, Self::Up) => 5,
        }
    }
}

/// How scroll directions land on the X11 wheel buttons.
///
/// `Natural` sends button 4 for a pinch-in (scroll down) so the content
/// follows the fingers, which is how the touchpad has always behaved on the
/// target.  `Traditional` uses the core protocol meaning of 4 = up, 5 = down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelMapping {
    #[default]
    Natural,
    Traditional,
}

/// A key press, optionally combined with modifiers (`ctrl+alt+t`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyChord {
    /// Modifiers in the order they are written in the chord.
    pub modifiers: Vec<Modifier>,
    /// Key name as understood by the backend (`Return`, `F5`, `a`).
    pub key: String,
}

impl KeyChord {
    /// A bare key with no modifiers.
    pub fn key(name: impl Into<String>) -> Self {
        Self {
            modifiers: Vec::new(),
            key: name.into(),
        }
    }

    /// A key combined with the given modifiers.
    pub fn with_modifiers(modifiers: Vec<Modifier>, name: impl Into<String>) -> Self {
        Self {
            modifiers,
            key: name.into(),
        }
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier.canonical_name())?;
        }
        f.write_str(&self.key)
    }
}

/// One atomic synthetic input action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendCommand {
    /// Move the pointer relative to its current position.
    MoveRelative { dx: i32, dy: i32 },
    /// Press and release a button `repeat` times (2 = double click).
    Click { button: PointerButton, repeat: u8 },
    /// Press a button and keep it held.
    ButtonDown { button: PointerButton },
    /// Release a held button.
    ButtonUp { button: PointerButton },
    /// Turn the wheel by `ticks` notches.
    Scroll { direction: ScrollDirection, ticks: u8 },
    /// Press and release a named key or chord.
    KeyPress { chord: KeyChord },
    /// Press a modifier and keep it held.
    KeyDown { modifier: Modifier },
    /// Release a held modifier.
    KeyUp { modifier: Modifier },
    /// Type literal text, preserving case.
    TypeText { text: String },
}

impl BackendCommand {
    /// A single click of `button`.
    pub fn click(button: PointerButton) -> Self {
        Self::Click { button, repeat: 1 }
    }

    /// Returns `true` for any click command, regardless of button or repeat.
    pub fn is_click(&self) -> bool {
        matches!(self, Self::Click { .. })
    }

    /// Returns `true` for relative pointer motion.
    pub fn is_move(&self) -> bool {
        matches!(self, Self::MoveRelative { .. })
    }
}

impl fmt::Display for BackendCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MoveRelative { dx, dy } => write!(f, "move {dx},{dy}"),
            Self::Click { button, repeat } if *repeat > 1 => {
                write!(f, "click {button:?} x{repeat}")
            }
            Self::Click { button, .. } => write!(f, "click {button:?}"),
            Self::ButtonDown { button } => write!(f, "button down {button:?}"),
            Self::ButtonUp { button } => write!(f, "button up {button:?}"),
            Self::Scroll { direction, ticks } => write!(f, "scroll {direction:?} x{ticks}"),
            Self::KeyPress { chord } => write!(f, "key {chord}"),
            Self::KeyDown { modifier } => write!(f, "key down {}", modifier.canonical_name()),
            Self::KeyUp { modifier } => write!(f, "key up {}", modifier.canonical_name()),
            Self::TypeText { text } => write!(f, "type {text:?}"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
