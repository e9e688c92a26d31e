//! # Feature: Command Cooldowns
//!
//! Stops a user from re-running the same command inside its cooldown window.
//! Keys are (command, user) pairs; the window defaults to 3 seconds and a
//! command descriptor may override it.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod tracker;

pub use tracker::{CooldownCheck, CooldownTracker, DEFAULT_COOLDOWN};
