//! KeyboardTranslator: turns key events from the UI into backend commands.
//!
//! Key-down events are classified with [`classify_key`]:
//!
//! | Class      | Command sent                                              |
//! |------------|-----------------------------------------------------------|
//! | Named      | one key press (`Return`, `F5`, ...)                       |
//! | Modifier   | key-down of `ctrl`/`alt`/`shift`/`super`, once per latch  |
//! | Printable  | chord (`ctrl+alt+c`, `ctrl+c`, `alt+c`) or literal typing |
//! | Unmapped   | nothing                                                   |
//!
//! Key-up events only matter for modifiers.  The latch is cleared and a
//! key-up is sent even if the modifier was never latched, so a release can
//! always un-stick a modifier on the target.

use std::sync::Arc;

use extdisp_core::{
    classify_key, BackendCommand, KeyChord, KeyClass, Modifier, ModifierSet, ModifierSnapshot,
};
use tracing::debug;

use super::synthetic_input::{dispatch, SyntheticInput};

/// A key as reported by the UI: its platform name and produced character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyIdentity {
    pub name: String,
    pub character: Option<char>,
}

impl KeyIdentity {
    pub fn new(name: impl Into<String>, character: Option<char>) -> Self {
        Self {
            name: name.into(),
            character,
        }
    }

    /// A key that produces no character (`Return`, `Shift_L`, ...).
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }
}

/// Keyboard translator owning the modifier latch state.
pub struct KeyboardTranslator {
    backend: Arc<dyn SyntheticInput>,
    latched: ModifierSet,
}

impl KeyboardTranslator {
    pub fn new(backend: Arc<dyn SyntheticInput>) -> Self {
        Self {
            backend,
            latched: ModifierSet::new(),
        }
    }

    /// Handles a key-down.  Always returns `true` (the event is consumed).
    pub fn on_key_down(&mut self, key: &KeyIdentity, snapshot: ModifierSnapshot) -> bool {
        match classify_key(&key.name, key.character) {
            KeyClass::Named(name) => {
                self.send(BackendCommand::KeyPress {
                    chord: KeyChord::key(name),
                });
            }
            KeyClass::Modifier(modifier) => {
                if self.latched.latch(modifier) {
                    self.send(BackendCommand::KeyDown { modifier });
                }
            }
            KeyClass::Printable(c) => self.send(printable_command(c, snapshot)),
            KeyClass::Unmapped => debug!(key = %key.name, "unhandled key"),
        }
        true
    }

    /// Handles a key-up.  Always returns `true`.
    pub fn on_key_up(&mut self, key: &KeyIdentity) -> bool {
        if let Some(modifier) = Modifier::from_key_name(&key.name) {
            self.latched.release(modifier);
            self.send(BackendCommand::KeyUp { modifier });
        }
        true
    }

    /// Sends a key-up for every latched modifier and clears the latch.
    ///
    /// Called when input forwarding stops so nothing stays held on the target.
    pub fn release_all(&mut self) {
        let held: Vec<Modifier> = self.latched.latched().collect();
        self.latched.clear();
        for modifier in held {
            self.send(BackendCommand::KeyUp { modifier });
        }
    }

    /// Returns `true` if `modifier` is latched.
    pub fn is_latched(&self, modifier: Modifier) -> bool {
        self.latched.is_latched(modifier)
    }

    fn send(&self, command: BackendCommand) {
        dispatch(self.backend.as_ref(), command);
    }
}

/// Chooses between a chord and literal typing for a printable character.
fn printable_command(c: char, snapshot: ModifierSnapshot) -> BackendCommand {
    let modifiers = match (snapshot.ctrl(), snapshot.alt()) {
        (true, true) => vec![Modifier::Ctrl, Modifier::Alt],
        (true, false) => vec![Modifier::Ctrl],
        (false, true) => vec![Modifier::Alt],
        (false, false) => {
            return BackendCommand::TypeText {
                text: c.to_string(),
            }
        }
    };
    let key: String = c.to_lowercase().collect();
    BackendCommand::KeyPress {
        chord: KeyChord::with_modifiers(modifiers, key),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
