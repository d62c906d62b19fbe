//! evdev key device backend.
//!
//! Implements [`InputDevice`] over a Linux evdev node. Reads are driven by a
//! `poll(2)` on the device descriptor so the bounded-wait contract holds even
//! though evdev reads themselves are blocking.

use std::collections::VecDeque;
use std::os::unix::io::AsRawFd;
use std::time::Duration;

use evdev::{Device, InputEventKind, Key};

use crate::input::{InputDevice, InputError, KeyMap, KeyPress, Result};

/// A key input source backed by one evdev node.
pub struct EvdevInput {
    device: Device,
    name: String,
    /// Releases decoded but not yet handed out; one fetch can yield several.
    pending: VecDeque<KeyPress>,
}

impl EvdevInput {
    pub fn new(device: Device) -> Self {
        let name = device.name().unwrap_or("unnamed device").to_owned();
        EvdevInput {
            device,
            name,
            pending: VecDeque::new(),
        }
    }

    fn classify(&self, e: std::io::Error) -> InputError {
        if e.raw_os_error() == Some(libc::ENODEV) {
            InputError::Removed(self.name.clone())
        } else {
            InputError::Backend(format!("{}: {e}", self.name))
        }
    }
}

impl InputDevice for EvdevInput {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_key(&mut self, timeout: Duration) -> Result<Option<KeyPress>> {
        if let Some(key) = self.pending.pop_front() {
            return Ok(Some(key));
        }

        let mut fds = [libc::pollfd {
            fd: self.device.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        }];
        let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        let ready = unsafe { libc::poll(fds.as_mut_ptr(), 1, timeout_ms) };
        if ready < 0 {
            let e = std::io::Error::last_os_error();
            if e.kind() == std::io::ErrorKind::Interrupted {
                return Ok(None);
            }
            return Err(self.classify(e));
        }
        if ready == 0 {
            return Ok(None);
        }
        if fds[0].revents & (libc::POLLHUP | libc::POLLERR | libc::POLLNVAL) != 0 {
            return Err(InputError::Removed(self.name.clone()));
        }

        let events = self.device.fetch_events().map_err(|e| self.classify(e))?;
        for event in events {
            // Value 0 is a key release; presses and autorepeats are ignored.
            if let InputEventKind::Key(key) = event.kind() {
                if event.value() == 0 {
                    self.pending.push_back(KeyPress(key.code()));
                }
            }
        }
        Ok(self.pending.pop_front())
    }
}

/// Scan `/dev/input` for devices exposing every key the map binds to volume
/// control. Devices that fail to open are skipped.
pub fn find_key_devices(map: &KeyMap) -> Vec<EvdevInput> {
    let required: Vec<Key> = map.required_keys().iter().map(|&c| Key::new(c)).collect();
    let mut found = Vec::new();
    for (path, device) in evdev::enumerate() {
        let Some(keys) = device.supported_keys() else {
            continue;
        };
        if required.iter().all(|key| keys.contains(*key)) {
            log::info!(
                "using input device {} ({})",
                device.name().unwrap_or("unnamed device"),
                path.display()
            );
            found.push(EvdevInput::new(device));
        }
    }
    found
}
