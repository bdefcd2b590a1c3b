//! Domain entities for External Displays.
//!
//! This module contains pure logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! The innermost layer of the application.  Domain code has **no** imports
//! from OS APIs, D-Bus, child processes or UI toolkits, so it can be compiled
//! and tested on any machine without a display attached.
//!
//! The translators and the lifecycle controller in `extdisp-app` are built on
//! top of these types; the domain never depends on them.

/// The vocabulary of synthetic input actions.
pub mod command;

/// Gesture tuning parameters and the delta / scroll arithmetic.
pub mod gesture;

/// Modifier latch state for the keyboard translator.
pub mod modifiers;

/// The system services that make up the external display pipeline.
pub mod service;
