//! Coordinator — single consumer of all input sources, sole owner of the
//! mixer write path and the volume state.
//!
//! Every producer (key device workers, the rotary interrupt handlers, the
//! change listener) pushes an [`Update`] into one mpsc inbox; the coordinator
//! dequeues and applies them strictly in arrival order. Each application is
//! atomic with respect to both the state mirror and the hardware write, which
//! is what rules out lost updates between near-simultaneous sources.
//!
//! Lifecycle is one-directional: `Starting → Running → ShuttingDown →
//! Stopped`. Cancellation is cooperative and idempotent; it is only ever
//! observed between applications, never inside one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::command::Command;
use crate::display::DisplayDriver;
use crate::error::{Result, VolstripError};
use crate::mixer::{self, MixerHandle, MuteSupport, VolumeRange, VolumeState};
use crate::render::{self, RenderConfig};

/// How often the main loop wakes to re-check the shutdown token while the
/// inbox is idle.
const IDLE_TICK: Duration = Duration::from_millis(100);

/// Coordinator lifecycle phase. One-directional, no restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Running,
    ShuttingDown,
    Stopped,
}

/// One inbox message. `Command` carries user intent; `Resync` carries a
/// state snapshot read by the change listener from its own mixer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    Command(Command),
    Resync(VolumeState),
}

/// Outcome of applying one [`Update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Volume written (possibly unchanged after clamping).
    Volume(i64),
    /// Mute switch written.
    Mute(bool),
    /// The control has no mute switch; nothing was written.
    MuteUnsupported,
    /// External snapshot folded into the state mirror.
    Resynced,
    /// Shutdown requested; no hardware was touched.
    Quit,
    /// Update arrived after shutdown began; no effect.
    Dropped,
}

/// Shared cancellation token. Cancelling twice has no additional effect;
/// workers observe it at their next suspension point.
#[derive(Clone, Default)]
pub struct ShutdownToken(Arc<AtomicBool>);

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Observer invoked after every applied state change (volume step, mute
/// toggle, external resync that actually moved the mirror).
pub type StatusHook = Box<dyn FnMut(VolumeState) + Send>;

/// Owns the mixer write handle, the display, and the current state mirror.
pub struct Coordinator<M: MixerHandle, D: DisplayDriver> {
    mixer: M,
    display: D,
    config: RenderConfig,
    step: f64,
    range: VolumeRange,
    state: VolumeState,
    phase: Phase,
    status: Option<StatusHook>,
}

impl<M: MixerHandle, D: DisplayDriver> Coordinator<M, D> {
    /// Query the hardware once, render the first frame, and transition to
    /// `Running`. Fails before any worker could have been spawned, so a bad
    /// control name or a dead strip surfaces as a startup error.
    pub fn start(mixer: M, display: D, config: RenderConfig, step: f64) -> Result<Self> {
        config.validate().map_err(VolstripError::Config)?;

        let raw = mixer.range()?;
        let range = VolumeRange::new(raw.min, raw.max)?;
        let state = mixer::read_state(&mixer)?;

        let mut coordinator = Coordinator {
            mixer,
            display,
            config,
            step,
            range,
            state,
            phase: Phase::Starting,
            status: None,
        };
        coordinator.redraw()?;
        coordinator.phase = Phase::Running;
        Ok(coordinator)
    }

    pub fn state(&self) -> VolumeState {
        self.state
    }

    pub fn range(&self) -> VolumeRange {
        self.range
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Register the status observer. The run loop calls it on the consumer
    /// thread, so a hook that rewrites a terminal line needs no locking.
    pub fn set_status_hook(&mut self, hook: StatusHook) {
        self.status = Some(hook);
    }

    fn notify(&mut self) {
        let state = self.state;
        if let Some(hook) = self.status.as_mut() {
            hook(state);
        }
    }

    /// Raw units one volume step moves, rounded so up/down are symmetric.
    fn step_delta(&self) -> i64 {
        (self.range.span() as f64 * self.step).round() as i64
    }

    fn redraw(&mut self) -> Result<()> {
        let frame = render::render(self.state, self.range, &self.config);
        self.display.write(&frame)
    }

    /// Apply one update. Atomic: state mutation, hardware write, and redraw
    /// complete before the next update is looked at. Never called
    /// concurrently with itself — the run loop is the only call site outside
    /// tests.
    pub fn apply(&mut self, update: Update) -> Result<Applied> {
        if self.phase != Phase::Running {
            return Ok(Applied::Dropped);
        }
        match update {
            Update::Command(Command::VolumeUp) => self.nudge(1),
            Update::Command(Command::VolumeDown) => self.nudge(-1),
            Update::Command(Command::ToggleMute) => self.toggle_mute(),
            Update::Command(Command::Quit) => {
                self.phase = Phase::ShuttingDown;
                Ok(Applied::Quit)
            }
            Update::Resync(snapshot) => {
                let snapshot = VolumeState {
                    volume: self.range.clamp(snapshot.volume),
                    muted: snapshot.muted,
                };
                if snapshot != self.state {
                    self.state = snapshot;
                    self.redraw()?;
                    self.notify();
                }
                Ok(Applied::Resynced)
            }
        }
    }

    fn nudge(&mut self, direction: i64) -> Result<Applied> {
        let target = self
            .range
            .clamp(self.state.volume + direction * self.step_delta());
        // A clamped no-op write is still a valid write.
        self.mixer.set_volume(target)?;
        self.state.volume = target;
        self.redraw()?;
        self.notify();
        Ok(Applied::Volume(target))
    }

    fn toggle_mute(&mut self) -> Result<Applied> {
        let target = !self.state.muted;
        match self.mixer.set_mute(target)? {
            MuteSupport::Applied => {
                self.state.muted = target;
                self.redraw()?;
                self.notify();
                Ok(Applied::Mute(target))
            }
            MuteSupport::Unsupported => {
                log::debug!("mixer '{}' has no mute switch, ignoring", self.mixer.name());
                Ok(Applied::MuteUnsupported)
            }
        }
    }

    /// Main loop: dequeue updates until a `Quit` is applied, the token is
    /// cancelled externally (Ctrl+C), or every producer has hung up.
    ///
    /// On exit the phase is `Stopped` and the token is cancelled, so worker
    /// threads unwind at their next suspension point.
    pub fn run(&mut self, inbox: &Receiver<Update>, shutdown: &ShutdownToken) -> Result<()> {
        let result = self.pump(inbox, shutdown);
        // The phase must read Stopped even when the loop died on an error.
        self.phase = Phase::Stopped;
        result
    }

    fn pump(&mut self, inbox: &Receiver<Update>, shutdown: &ShutdownToken) -> Result<()> {
        while !shutdown.is_cancelled() {
            match inbox.recv_timeout(IDLE_TICK) {
                Ok(update) => {
                    if matches!(self.apply(update)?, Applied::Quit) {
                        shutdown.cancel();
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    log::warn!("all input sources gone, shutting down");
                    shutdown.cancel();
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::display::mock::MockDisplay;
    use crate::mixer::MixerEvent;
    use crate::mixer::mock::MockMixer;
    use std::sync::mpsc;

    fn test_coordinator(
        mixer: MockMixer,
    ) -> Coordinator<MockMixer, MockDisplay> {
        Coordinator::start(mixer, MockDisplay::new(), RenderConfig::default(), 0.03).unwrap()
    }

    #[test]
    fn start_queries_hardware_and_renders_once() {
        let mixer = MockMixer::new(VolumeRange { min: 0, max: 100 }, 40, Some(false));
        let c = test_coordinator(mixer);
        assert_eq!(c.phase(), Phase::Running);
        assert_eq!(
            c.state(),
            VolumeState {
                volume: 40,
                muted: false
            }
        );
        assert_eq!(c.display.frames.len(), 1);
        assert_eq!(c.display.frames[0].len(), 12);
    }

    #[test]
    fn start_fails_if_first_render_fails() {
        let mut display = MockDisplay::new();
        display.fail_writes = true;
        let result = Coordinator::start(
            MockMixer::with_defaults(),
            display,
            RenderConfig::default(),
            0.03,
        );
        assert!(result.is_err());
    }

    #[test]
    fn start_rejects_invalid_render_config() {
        let config = RenderConfig {
            strip_length: 0,
            ..RenderConfig::default()
        };
        let result = Coordinator::start(
            MockMixer::with_defaults(),
            MockDisplay::new(),
            config,
            0.03,
        );
        assert!(matches!(result, Err(VolstripError::Config(_))));
    }

    #[test]
    fn volume_up_steps_and_writes_through() {
        let mixer = MockMixer::with_defaults(); // 0..100, volume 40
        let mut c = test_coordinator(mixer.clone());
        let applied = c.apply(Update::Command(Command::VolumeUp)).unwrap();
        assert_eq!(applied, Applied::Volume(43));
        assert_eq!(c.state().volume, 43);
        assert_eq!(mixer.volume_writes(), vec![43]);
        // Startup frame plus the post-apply frame.
        assert_eq!(c.display.frames.len(), 2);
    }

    #[test]
    fn up_then_down_nets_to_zero() {
        // The no-lost-update property: two opposing steps cancel exactly.
        let mixer = MockMixer::with_defaults();
        let mut c = test_coordinator(mixer);
        let initial = c.state().volume;
        c.apply(Update::Command(Command::VolumeUp)).unwrap();
        c.apply(Update::Command(Command::VolumeDown)).unwrap();
        assert_eq!(c.state().volume, initial);
    }

    #[test]
    fn two_ups_apply_both_steps() {
        // Scenario D: near-simultaneous commands from different sources are
        // both applied once each.
        let mixer = MockMixer::with_defaults();
        let mut c = test_coordinator(mixer.clone());
        c.apply(Update::Command(Command::VolumeUp)).unwrap();
        c.apply(Update::Command(Command::VolumeUp)).unwrap();
        assert_eq!(c.state().volume, 46);
        assert_eq!(mixer.volume_writes(), vec![43, 46]);
    }

    #[test]
    fn volume_clamps_at_max() {
        let mixer = MockMixer::new(VolumeRange { min: 0, max: 100 }, 99, Some(false));
        let mut c = test_coordinator(mixer.clone());
        assert_eq!(
            c.apply(Update::Command(Command::VolumeUp)).unwrap(),
            Applied::Volume(100)
        );
        // Clamped no-op write is still issued.
        assert_eq!(
            c.apply(Update::Command(Command::VolumeUp)).unwrap(),
            Applied::Volume(100)
        );
        assert_eq!(mixer.volume_writes(), vec![100, 100]);
    }

    #[test]
    fn volume_clamps_at_min() {
        let mixer = MockMixer::new(VolumeRange { min: -100, max: 900 }, -95, Some(false));
        let mut c = test_coordinator(mixer);
        c.apply(Update::Command(Command::VolumeDown)).unwrap();
        assert_eq!(c.state().volume, -100);
    }

    #[test]
    fn toggle_mute_flips_and_writes() {
        let mixer = MockMixer::with_defaults();
        let mut c = test_coordinator(mixer.clone());
        assert_eq!(
            c.apply(Update::Command(Command::ToggleMute)).unwrap(),
            Applied::Mute(true)
        );
        assert!(c.state().muted);
        assert_eq!(
            c.apply(Update::Command(Command::ToggleMute)).unwrap(),
            Applied::Mute(false)
        );
        assert!(!c.state().muted);
        assert_eq!(mixer.mute_writes(), vec![true, false]);
    }

    #[test]
    fn toggle_mute_unsupported_is_a_noop() {
        let mixer = MockMixer::without_mute(40);
        let mut c = test_coordinator(mixer.clone());
        let frames_before = c.display.frames.len();
        assert_eq!(
            c.apply(Update::Command(Command::ToggleMute)).unwrap(),
            Applied::MuteUnsupported
        );
        assert!(!c.state().muted, "state mirror untouched");
        assert!(mixer.mute_writes().is_empty(), "hardware untouched");
        assert_eq!(c.display.frames.len(), frames_before, "no redraw");
    }

    #[test]
    fn muted_frame_fills_strip() {
        let mixer = MockMixer::with_defaults();
        let mut c = test_coordinator(mixer);
        c.apply(Update::Command(Command::ToggleMute)).unwrap();
        let frame = c.display.last_frame().unwrap();
        let first = frame[0];
        assert_ne!(first, Rgb::BLACK);
        assert!(frame.iter().all(|px| *px == first));
    }

    #[test]
    fn quit_touches_no_hardware() {
        let mixer = MockMixer::with_defaults();
        let mut c = test_coordinator(mixer.clone());
        let frames_before = c.display.frames.len();
        assert_eq!(
            c.apply(Update::Command(Command::Quit)).unwrap(),
            Applied::Quit
        );
        assert_eq!(c.phase(), Phase::ShuttingDown);
        assert!(mixer.volume_writes().is_empty());
        assert!(mixer.mute_writes().is_empty());
        assert_eq!(c.display.frames.len(), frames_before);
    }

    #[test]
    fn updates_after_quit_are_dropped() {
        let mixer = MockMixer::with_defaults();
        let mut c = test_coordinator(mixer.clone());
        c.apply(Update::Command(Command::Quit)).unwrap();
        assert_eq!(
            c.apply(Update::Command(Command::VolumeUp)).unwrap(),
            Applied::Dropped
        );
        assert!(mixer.volume_writes().is_empty());
    }

    #[test]
    fn resync_folds_external_change_and_redraws() {
        let mixer = MockMixer::with_defaults();
        let mut c = test_coordinator(mixer);
        let applied = c
            .apply(Update::Resync(VolumeState {
                volume: 80,
                muted: true,
            }))
            .unwrap();
        assert_eq!(applied, Applied::Resynced);
        assert_eq!(
            c.state(),
            VolumeState {
                volume: 80,
                muted: true
            }
        );
        assert_eq!(c.display.frames.len(), 2);
    }

    #[test]
    fn resync_with_same_state_skips_redraw() {
        let mixer = MockMixer::with_defaults();
        let mut c = test_coordinator(mixer);
        let state = c.state();
        c.apply(Update::Resync(state)).unwrap();
        assert_eq!(c.display.frames.len(), 1);
    }

    #[test]
    fn resync_clamps_out_of_range_volume() {
        let mixer = MockMixer::with_defaults();
        let mut c = test_coordinator(mixer);
        c.apply(Update::Resync(VolumeState {
            volume: 5000,
            muted: false,
        }))
        .unwrap();
        assert_eq!(c.state().volume, 100);
    }

    #[test]
    fn step_scales_with_range() {
        let mixer = MockMixer::new(VolumeRange { min: -100, max: 900 }, 400, Some(false));
        let mut c = test_coordinator(mixer);
        c.apply(Update::Command(Command::VolumeUp)).unwrap();
        // step 0.03 over a span of 1000 is 30 raw units.
        assert_eq!(c.state().volume, 430);
    }

    #[test]
    fn run_applies_fifo_until_quit_then_stops() {
        let mixer = MockMixer::with_defaults();
        let mut c = test_coordinator(mixer.clone());
        let (tx, rx) = mpsc::channel();
        let shutdown = ShutdownToken::new();

        tx.send(Update::Command(Command::VolumeUp)).unwrap();
        tx.send(Update::Command(Command::VolumeUp)).unwrap();
        tx.send(Update::Command(Command::Quit)).unwrap();
        tx.send(Update::Command(Command::VolumeDown)).unwrap();

        c.run(&rx, &shutdown).unwrap();

        assert_eq!(c.phase(), Phase::Stopped);
        assert!(shutdown.is_cancelled());
        // The trailing VolumeDown was never applied.
        assert_eq!(mixer.volume_writes(), vec![43, 46]);
        assert_eq!(c.state().volume, 46);
    }

    #[test]
    fn status_hook_reports_applied_changes() {
        use std::sync::{Arc, Mutex};

        let mixer = MockMixer::with_defaults();
        let mut c = test_coordinator(mixer);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        c.set_status_hook(Box::new(move |state| sink.lock().unwrap().push(state)));

        c.apply(Update::Command(Command::VolumeUp)).unwrap();
        c.apply(Update::Command(Command::ToggleMute)).unwrap();
        c.apply(Update::Resync(VolumeState {
            volume: 80,
            muted: true,
        }))
        .unwrap();
        // A resync that doesn't move the mirror stays silent, as does quit.
        c.apply(Update::Resync(VolumeState {
            volume: 80,
            muted: true,
        }))
        .unwrap();
        c.apply(Update::Command(Command::Quit)).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                VolumeState {
                    volume: 43,
                    muted: false
                },
                VolumeState {
                    volume: 43,
                    muted: true
                },
                VolumeState {
                    volume: 80,
                    muted: true
                },
            ]
        );
    }

    #[test]
    fn run_marks_stopped_even_when_apply_fails() {
        let mixer = MockMixer::with_defaults();
        let mut c = test_coordinator(mixer);
        c.display.fail_writes = true;
        let (tx, rx) = mpsc::channel();
        let shutdown = ShutdownToken::new();
        tx.send(Update::Command(Command::VolumeUp)).unwrap();

        assert!(c.run(&rx, &shutdown).is_err());
        assert_eq!(c.phase(), Phase::Stopped);
    }

    #[test]
    fn run_stops_when_all_producers_hang_up() {
        let mixer = MockMixer::with_defaults();
        let mut c = test_coordinator(mixer);
        let (tx, rx) = mpsc::channel::<Update>();
        let shutdown = ShutdownToken::new();
        drop(tx);
        c.run(&rx, &shutdown).unwrap();
        assert_eq!(c.phase(), Phase::Stopped);
        assert!(shutdown.is_cancelled());
    }

    #[test]
    fn run_stops_on_external_cancellation() {
        let mixer = MockMixer::with_defaults();
        let mut c = test_coordinator(mixer);
        let (_tx, rx) = mpsc::channel::<Update>();
        let shutdown = ShutdownToken::new();
        shutdown.cancel();
        c.run(&rx, &shutdown).unwrap();
        assert_eq!(c.phase(), Phase::Stopped);
    }

    #[test]
    fn shutdown_token_is_idempotent() {
        let token = ShutdownToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
        let clone = token.clone();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn mixer_event_changed_reaches_coordinator_via_resync() {
        // The listener path: external change → snapshot → resync update.
        let mixer = MockMixer::with_defaults();
        let mut listener_handle = mixer.clone();
        let mut c = test_coordinator(mixer.clone());

        mixer.external_set_volume(70);
        let event = listener_handle
            .wait_for_change(Duration::from_millis(50))
            .unwrap();
        assert_eq!(event, MixerEvent::Changed);
        let snapshot = mixer::read_state(&listener_handle).unwrap();
        c.apply(Update::Resync(snapshot)).unwrap();
        assert_eq!(c.state().volume, 70);
    }
}
