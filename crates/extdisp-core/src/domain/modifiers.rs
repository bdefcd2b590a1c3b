//! Modifier keys and the latch that tracks which ones are held on the target.
//!
//! # Latch vs. snapshot
//!
//! Two different notions of "modifier state" exist and must not be mixed up:
//!
//! - The **latch** ([`ModifierSet`]) records which modifiers *we* have sent a
//!   key-down for and not yet released on the target display.  It exists so
//!   that auto-repeat of a held Ctrl key does not flood the backend with
//!   duplicate key-down commands.
//!
//! - The **snapshot** ([`ModifierSnapshot`]) is what the local platform says
//!   is held at the moment a key event arrives.  It is only used to decide
//!   whether a printable key should be sent as a chord (`ctrl+c`) or typed.

use serde::{Deserialize, Serialize};

/// One of the four modifier identities.  Left and right variants collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Ctrl,
    Alt,
    Shift,
    Super,
}

impl Modifier {
    /// All modifiers, in chord order.
    pub const ALL: [Modifier; 4] = [Modifier::Ctrl, Modifier::Alt, Modifier::Shift, Modifier::Super];

    /// The name the backend understands (`ctrl`, `alt`, `shift`, `super`).
    pub fn canonical_name(self) -> &'static str {
        match self {
            Self::Ctrl => "ctrl",
            Self::Alt => "alt",
            Self::Shift => "shift",
            Self::Super => "super",
        }
    }

    /// Maps a platform key name (`Control_L`, `Super_R`, ...) to a modifier.
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "Control_L" | "Control_R" => Some(Self::Ctrl),
            "Alt_L" | "Alt_R" => Some(Self::Alt),
            "Shift_L" | "Shift_R" => Some(Self::Shift),
            "Super_L" | "Super_R" => Some(Self::Super),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        match self {
            Self::Ctrl => ModifierSnapshot::CTRL,
            Self::Alt => ModifierSnapshot::ALT,
            Self::Shift => ModifierSnapshot::SHIFT,
            Self::Super => ModifierSnapshot::SUPER,
        }
    }
}

/// Modifier state reported by the platform alongside a key event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierSnapshot(pub u8);

impl ModifierSnapshot {
    pub const CTRL: u8 = 1 << 0;
    pub const ALT: u8 = 1 << 1;
    pub const SHIFT: u8 = 1 << 2;
    pub const SUPER: u8 = 1 << 3;

    /// Builds a snapshot from individual flags.
    pub fn from_flags(ctrl: bool, alt: bool, shift: bool, super_key: bool) -> Self {
        let mut bits = 0u8;
        if ctrl { bits |= Self::CTRL; }
        if alt { bits |= Self::ALT; }
        if shift { bits |= Self::SHIFT; }
        if super_key { bits |= Self::SUPER; }
        Self(bits)
    }

    /// Returns `true` if Ctrl is held.
    pub fn ctrl(&self) -> bool {
        self.0 & Self::CTRL != 0
    }

    /// Returns `true` if Alt is held.
    pub fn alt(&self) -> bool {
        self.0 & Self::ALT != 0
    }

    /// Returns `true` if Shift is held.
    pub fn shift(&self) -> bool {
        self.0 & Self::SHIFT != 0
    }

    /// Returns `true` if Super is held.
    pub fn super_key(&self) -> bool {
        self.0 & Self::SUPER != 0
    }
}

/// Latched state of the four modifiers on the target display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierSet {
    latched: u8,
}

impl ModifierSet {
    /// Creates a set with nothing latched.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latches `modifier`.
    ///
    /// Returns `true` if it was not latched before, i.e. the caller should
    /// send a key-down.  Returns `false` for a redundant (repeat) down.
    pub fn latch(&mut self, modifier: Modifier) -> bool {
        let was_latched = self.is_latched(modifier);
        self.latched |= modifier.bit();
        !was_latched
    }

    /// Clears the latch for `modifier`, returning whether it was latched.
    pub fn release(&mut self, modifier: Modifier) -> bool {
        let was_latched = self.is_latched(modifier);
        self.latched &= !modifier.bit();
        was_latched
    }

    /// Returns `true` if `modifier` is currently latched.
    pub fn is_latched(&self, modifier: Modifier) -> bool {
        self.latched & modifier.bit() != 0
    }

    /// Iterates over the latched modifiers in chord order.
    pub fn latched(&self) -> impl Iterator<Item = Modifier> + '_ {
        Modifier::ALL.into_iter().filter(|m| self.is_latched(*m))
    }

    /// Forgets every latch (used when the target session is torn down).
    pub fn clear(&mut self) {
        self.latched = 0;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
