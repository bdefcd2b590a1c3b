//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration from the XDG config
//! directory, falls back to defaults on first run, and converts the file's
//! sections into the types the application layer consumes.

pub mod config;
