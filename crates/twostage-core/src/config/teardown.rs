//! Teardown behaviour of wrapped objects.

use serde::{Deserialize, Serialize};

/// Controls how the pre-destruct phase reacts to misbehaving hooks.
///
/// Every pre-destruct hook always fires, even after an earlier one failed.
/// These settings only decide how failures are captured and how much of
/// the phase is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownConfig {
    /// Report panics raised by pre-destruct hooks as failures.
    ///
    /// When off, the remaining hooks still fire and the first panic resumes
    /// once the phase is over. A thread that is already unwinding always
    /// catches.
    #[serde(default = "default_true")]
    pub catch_panics: bool,
    /// Emit a `trace` event for every hook fired, in both phases.
    #[serde(default)]
    pub trace_hooks: bool,
}

impl Default for TeardownConfig {
    fn default() -> Self {
        Self {
            catch_panics: true,
            trace_hooks: false,
        }
    }
}

fn default_true() -> bool {
    true
}
