//! Commands produced by input sources and consumed by the coordinator.

use std::fmt;

/// A single user-intent command. Produced by one input source, applied
/// exactly once by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    VolumeUp,
    VolumeDown,
    ToggleMute,
    Quit,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::VolumeUp => write!(f, "volume-up"),
            Command::VolumeDown => write!(f, "volume-down"),
            Command::ToggleMute => write!(f, "toggle-mute"),
            Command::Quit => write!(f, "quit"),
        }
    }
}
