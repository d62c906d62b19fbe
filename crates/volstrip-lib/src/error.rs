//! Unified error type for the volstrip-lib crate.
//!
//! [`VolstripError`] wraps module-specific errors (`MixerError`, `InputError`)
//! and domain-specific error kinds (`Display`, `Config`, `Color`). `From`
//! impls allow `?` to propagate across module boundaries seamlessly.

use std::fmt;

use crate::input::InputError;
use crate::mixer::MixerError;

/// Unified error type for volstrip-lib operations.
#[derive(Debug)]
pub enum VolstripError {
    /// Mixer backend error (open, read/write, change polling).
    Mixer(MixerError),
    /// Input device error (open, event read, device removal).
    Input(InputError),
    /// LED strip write error.
    Display(String),
    /// Standard I/O error (config persistence).
    Io(std::io::Error),
    /// Configuration validation error.
    Config(String),
    /// Color parsing error.
    Color(String),
}

impl fmt::Display for VolstripError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolstripError::Mixer(e) => write!(f, "{e}"),
            VolstripError::Input(e) => write!(f, "{e}"),
            VolstripError::Display(e) => write!(f, "Display error: {e}"),
            VolstripError::Io(e) => write!(f, "I/O error: {e}"),
            VolstripError::Config(e) => write!(f, "Config error: {e}"),
            VolstripError::Color(e) => write!(f, "Color error: {e}"),
        }
    }
}

impl std::error::Error for VolstripError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VolstripError::Mixer(e) => Some(e),
            VolstripError::Input(e) => Some(e),
            VolstripError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MixerError> for VolstripError {
    fn from(e: MixerError) -> Self {
        VolstripError::Mixer(e)
    }
}

impl From<InputError> for VolstripError {
    fn from(e: InputError) -> Self {
        VolstripError::Input(e)
    }
}

impl From<std::io::Error> for VolstripError {
    fn from(e: std::io::Error) -> Self {
        VolstripError::Io(e)
    }
}

/// Crate-level Result alias using [`VolstripError`].
pub type Result<T> = std::result::Result<T, VolstripError>;
