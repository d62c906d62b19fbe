//! Input abstractions — key devices and the rotary encoder.
//!
//! A [`InputDevice`] yields raw key-release events with a bounded wait so its
//! worker thread can observe cancellation between events. The rotary encoder
//! is callback-driven: its edge interrupts fire on a foreign context, so the
//! registered handlers must do nothing but enqueue a command and return.

use std::fmt;
use std::time::Duration;

use crate::command::Command;

#[derive(Debug)]
pub enum InputError {
    /// The device went away (unplugged, connection dropped).
    Removed(String),
    /// Any other backend failure.
    Backend(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Removed(name) => write!(f, "Input device removed: {name}"),
            InputError::Backend(e) => write!(f, "Input error: {e}"),
        }
    }
}

impl std::error::Error for InputError {}

pub type Result<T> = std::result::Result<T, InputError>;

/// A raw key-release event, identified by its Linux input key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress(pub u16);

/// Key code bindings. Defaults follow the Linux input event codes for the
/// dedicated volume keys, with quit on keypad 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMap {
    pub volume_up: u16,
    pub volume_down: u16,
    pub mute: u16,
    pub quit: u16,
}

impl Default for KeyMap {
    fn default() -> Self {
        KeyMap {
            volume_up: 115,   // KEY_VOLUMEUP
            volume_down: 114, // KEY_VOLUMEDOWN
            mute: 113,        // KEY_MUTE
            quit: 79,         // KEY_KP1
        }
    }
}

impl KeyMap {
    /// Map a key release to a command, if bound.
    pub fn command_for(&self, key: KeyPress) -> Option<Command> {
        match key.0 {
            c if c == self.volume_up => Some(Command::VolumeUp),
            c if c == self.volume_down => Some(Command::VolumeDown),
            c if c == self.mute => Some(Command::ToggleMute),
            c if c == self.quit => Some(Command::Quit),
            _ => None,
        }
    }

    /// The key codes a device must expose to qualify as a volume input.
    pub fn required_keys(&self) -> [u16; 3] {
        [self.volume_up, self.volume_down, self.mute]
    }
}

/// A source of key-release events (remote, keyboard, anything evdev-like).
pub trait InputDevice: Send {
    /// Human-readable device name, for logging.
    fn name(&self) -> &str;

    /// Block up to `timeout` for the next key release.
    ///
    /// Returns `Ok(None)` on timeout so callers can check for cancellation.
    /// An error terminates this device's event sequence for good.
    fn next_key(&mut self, timeout: Duration) -> Result<Option<KeyPress>>;
}

/// Handler invoked from the encoder's interrupt context.
pub type RotaryHandler = Box<dyn Fn() + Send + 'static>;

/// A two-channel rotary encoder delivering direction callbacks.
pub trait RotaryEncoder {
    /// Register the clockwise / counter-clockwise handlers. The handlers run
    /// on an interrupt context and must only enqueue work.
    fn set_handlers(
        &mut self,
        clockwise: RotaryHandler,
        counter_clockwise: RotaryHandler,
    ) -> crate::error::Result<()>;
}

// ── Test doubles ──

pub mod mock {
    use super::*;
    use std::collections::VecDeque;

    /// Scripted input device. Yields the queued keys one per `next_key`
    /// call, then times out forever (or errors, if `fail_after` is set).
    pub struct ScriptedInput {
        name: String,
        keys: VecDeque<KeyPress>,
        /// When true, `next_key` errors once the script runs out.
        pub fail_after: bool,
    }

    impl ScriptedInput {
        pub fn new(name: &str, keys: &[u16]) -> Self {
            ScriptedInput {
                name: name.into(),
                keys: keys.iter().map(|&c| KeyPress(c)).collect(),
                fail_after: false,
            }
        }
    }

    impl InputDevice for ScriptedInput {
        fn name(&self) -> &str {
            &self.name
        }

        fn next_key(&mut self, timeout: Duration) -> Result<Option<KeyPress>> {
            match self.keys.pop_front() {
                Some(key) => Ok(Some(key)),
                None if self.fail_after => Err(InputError::Removed(self.name.clone())),
                None => {
                    // Simulate the blocking wait without burning CPU.
                    std::thread::sleep(timeout.min(Duration::from_millis(10)));
                    Ok(None)
                }
            }
        }
    }

    /// Rotary encoder double that lets tests fire the registered handlers.
    #[derive(Default)]
    pub struct StubRotary {
        clockwise: Option<RotaryHandler>,
        counter_clockwise: Option<RotaryHandler>,
    }

    impl StubRotary {
        pub fn new() -> Self {
            Self::default()
        }

        /// Simulate a clockwise pulse from the interrupt context.
        pub fn pulse_clockwise(&self) {
            if let Some(ref h) = self.clockwise {
                h();
            }
        }

        /// Simulate a counter-clockwise pulse.
        pub fn pulse_counter_clockwise(&self) {
            if let Some(ref h) = self.counter_clockwise {
                h();
            }
        }
    }

    impl RotaryEncoder for StubRotary {
        fn set_handlers(
            &mut self,
            clockwise: RotaryHandler,
            counter_clockwise: RotaryHandler,
        ) -> crate::error::Result<()> {
            self.clockwise = Some(clockwise);
            self.counter_clockwise = Some(counter_clockwise);
            Ok(())
        }
    }
}
