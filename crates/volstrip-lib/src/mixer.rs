//! Mixer abstraction — trait over the hardware volume control plus state types.
//!
//! The real backend (`hw::alsa`) talks to an ALSA simple mixer element; tests
//! use [`mock::MockMixer`]. Multiple handles to the same control may exist
//! (the coordinator writes through one, the change listener polls another),
//! which is why the trait is object-plain and the mock shares state between
//! cloned handles.

use std::fmt;
use std::time::Duration;

#[derive(Debug)]
pub enum MixerError {
    /// The named control does not exist on the selected card.
    NoSuchControl(String),
    /// The mixer connection was closed by the hardware (hang-up).
    Disconnected,
    /// Any other backend failure.
    Backend(String),
}

impl fmt::Display for MixerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MixerError::NoSuchControl(name) => write!(f, "No such mixer control: '{name}'"),
            MixerError::Disconnected => write!(f, "Mixer connection closed"),
            MixerError::Backend(e) => write!(f, "Mixer error: {e}"),
        }
    }
}

impl std::error::Error for MixerError {}

pub type Result<T> = std::result::Result<T, MixerError>;

/// Raw volume range of a control. Discovered once at startup; immutable after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeRange {
    pub min: i64,
    pub max: i64,
}

impl VolumeRange {
    /// Construct a range, rejecting `min >= max`.
    pub fn new(min: i64, max: i64) -> Result<Self> {
        if min >= max {
            return Err(MixerError::Backend(format!(
                "invalid volume range {min}..{max}"
            )));
        }
        Ok(VolumeRange { min, max })
    }

    pub fn span(&self) -> i64 {
        self.max - self.min
    }

    pub fn clamp(&self, volume: i64) -> i64 {
        volume.clamp(self.min, self.max)
    }
}

/// In-memory mirror of the control's current state. Exclusively owned and
/// mutated by the coordinator; the renderer only ever sees a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeState {
    pub volume: i64,
    pub muted: bool,
}

/// Outcome of a timed wait on the mixer's change notification descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixerEvent {
    /// The control changed (volume or switch), possibly by another process.
    Changed,
    /// The wait elapsed with no notification.
    TimedOut,
    /// The hardware closed the connection. Treated as an implicit quit.
    Closed,
}

/// Whether a mute write reached the hardware. Controls without a playback
/// switch report `Unsupported`; the caller ignores the write (not an error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteSupport {
    Applied,
    Unsupported,
}

/// A handle on one hardware mixer control.
pub trait MixerHandle {
    /// Control name, for logging.
    fn name(&self) -> &str;

    /// Raw playback volume range.
    fn range(&self) -> Result<VolumeRange>;

    /// Current raw playback volume.
    fn volume(&self) -> Result<i64>;

    /// Set the raw playback volume on all channels.
    fn set_volume(&mut self, volume: i64) -> Result<()>;

    /// Current mute state, or `None` if the control has no mute switch.
    fn mute(&self) -> Result<Option<bool>>;

    /// Set the mute switch. Returns [`MuteSupport::Unsupported`] when the
    /// control cannot mute; the hardware is left untouched in that case.
    fn set_mute(&mut self, muted: bool) -> Result<MuteSupport>;

    /// Block until the control changes, the timeout elapses, or the
    /// connection is closed.
    fn wait_for_change(&mut self, timeout: Duration) -> Result<MixerEvent>;
}

/// Read a [`VolumeState`] snapshot from a handle. A control without a mute
/// switch reads as unmuted.
pub fn read_state(mixer: &impl MixerHandle) -> Result<VolumeState> {
    Ok(VolumeState {
        volume: mixer.volume()?,
        muted: mixer.mute()?.unwrap_or(false),
    })
}

// ── Test mock ──

pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Condvar, Mutex};

    struct Shared {
        volume: Mutex<i64>,
        /// `None` models a control without a mute switch.
        muted: Mutex<Option<bool>>,
        range: VolumeRange,
        /// Scripted wait_for_change outcomes, signalled to waiting threads.
        events: Mutex<VecDeque<MixerEvent>>,
        event_signal: Condvar,
        /// Recorded hardware writes: volume values and mute flags, in order.
        volume_writes: Mutex<Vec<i64>>,
        mute_writes: Mutex<Vec<bool>>,
    }

    /// In-memory mixer for unit and integration tests.
    ///
    /// Cloned handles share the same underlying control state, matching the
    /// real world where the coordinator and the change listener each hold a
    /// handle onto one hardware control. Use [`push_event`] to script
    /// `wait_for_change` and [`external_set_volume`] to simulate another
    /// process editing the mixer.
    ///
    /// [`push_event`]: MockMixer::push_event
    /// [`external_set_volume`]: MockMixer::external_set_volume
    #[derive(Clone)]
    pub struct MockMixer {
        name: String,
        shared: Arc<Shared>,
    }

    impl MockMixer {
        pub fn new(range: VolumeRange, volume: i64, muted: Option<bool>) -> Self {
            MockMixer {
                name: "Mock".into(),
                shared: Arc::new(Shared {
                    volume: Mutex::new(volume),
                    muted: Mutex::new(muted),
                    range,
                    events: Mutex::new(VecDeque::new()),
                    event_signal: Condvar::new(),
                    volume_writes: Mutex::new(Vec::new()),
                    mute_writes: Mutex::new(Vec::new()),
                }),
            }
        }

        /// A mutable control: range 0..100, volume 40, unmuted.
        pub fn with_defaults() -> Self {
            Self::new(VolumeRange { min: 0, max: 100 }, 40, Some(false))
        }

        /// A control without a mute switch.
        pub fn without_mute(volume: i64) -> Self {
            Self::new(VolumeRange { min: 0, max: 100 }, volume, None)
        }

        /// Queue a `wait_for_change` outcome and wake any waiting listener.
        pub fn push_event(&self, event: MixerEvent) {
            self.shared.events.lock().unwrap().push_back(event);
            self.shared.event_signal.notify_all();
        }

        /// Simulate another process changing the volume: updates shared state
        /// and queues a `Changed` notification.
        pub fn external_set_volume(&self, volume: i64) {
            *self.shared.volume.lock().unwrap() = volume;
            self.push_event(MixerEvent::Changed);
        }

        /// Simulate another process flipping the mute switch.
        pub fn external_set_mute(&self, muted: bool) {
            *self.shared.muted.lock().unwrap() = Some(muted);
            self.push_event(MixerEvent::Changed);
        }

        /// Volume values written through [`MixerHandle::set_volume`], in order.
        pub fn volume_writes(&self) -> Vec<i64> {
            self.shared.volume_writes.lock().unwrap().clone()
        }

        /// Mute flags written through [`MixerHandle::set_mute`], in order.
        pub fn mute_writes(&self) -> Vec<bool> {
            self.shared.mute_writes.lock().unwrap().clone()
        }
    }

    impl MixerHandle for MockMixer {
        fn name(&self) -> &str {
            &self.name
        }

        fn range(&self) -> Result<VolumeRange> {
            Ok(self.shared.range)
        }

        fn volume(&self) -> Result<i64> {
            Ok(*self.shared.volume.lock().unwrap())
        }

        fn set_volume(&mut self, volume: i64) -> Result<()> {
            *self.shared.volume.lock().unwrap() = volume;
            self.shared.volume_writes.lock().unwrap().push(volume);
            Ok(())
        }

        fn mute(&self) -> Result<Option<bool>> {
            Ok(*self.shared.muted.lock().unwrap())
        }

        fn set_mute(&mut self, muted: bool) -> Result<MuteSupport> {
            let mut guard = self.shared.muted.lock().unwrap();
            match *guard {
                Some(_) => {
                    *guard = Some(muted);
                    self.shared.mute_writes.lock().unwrap().push(muted);
                    Ok(MuteSupport::Applied)
                }
                None => Ok(MuteSupport::Unsupported),
            }
        }

        fn wait_for_change(&mut self, timeout: Duration) -> Result<MixerEvent> {
            let mut events = self.shared.events.lock().unwrap();
            if events.is_empty() {
                let (guard, _) = self
                    .shared
                    .event_signal
                    .wait_timeout(events, timeout)
                    .map_err(|e| MixerError::Backend(format!("mock mutex poisoned: {e}")))?;
                events = guard;
            }
            Ok(events.pop_front().unwrap_or(MixerEvent::TimedOut))
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_rejects_inverted_bounds() {
        assert!(VolumeRange::new(10, 10).is_err());
        assert!(VolumeRange::new(10, 5).is_err());
        assert!(VolumeRange::new(-100, 900).is_ok());
    }

    #[test]
    fn range_span_and_clamp() {
        let r = VolumeRange::new(-100, 900).unwrap();
        assert_eq!(r.span(), 1000);
        assert_eq!(r.clamp(-500), -100);
        assert_eq!(r.clamp(1000), 900);
        assert_eq!(r.clamp(0), 0);
    }

    #[test]
    fn read_state_defaults_missing_mute_to_unmuted() {
        let m = mock::MockMixer::without_mute(30);
        let state = read_state(&m).unwrap();
        assert_eq!(
            state,
            VolumeState {
                volume: 30,
                muted: false
            }
        );
    }
}
