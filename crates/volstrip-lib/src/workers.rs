//! Worker threads — input source adapters, the change listener, and the
//! control loop orchestration.
//!
//! Every worker is a producer onto the coordinator's inbox and nothing else:
//! no worker touches the mixer write path or the state mirror. Workers block
//! with bounded timeouts so cancellation is observed within one poll
//! interval, and each one unwinds on its own when its device dies.

use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::command::Command;
use crate::coordinator::{Coordinator, ShutdownToken, StatusHook, Update};
use crate::display::DisplayDriver;
use crate::error::Result;
use crate::input::{InputDevice, KeyMap, RotaryEncoder};
use crate::mixer::{self, MixerEvent, MixerHandle, VolumeState};
use crate::render::RenderConfig;

/// How long a key worker blocks per wait before re-checking cancellation.
const KEY_POLL: Duration = Duration::from_millis(200);

/// Default bounded wait for the change listener's poll.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// Spawn a worker that translates one device's key releases into commands.
///
/// A read error terminates only this worker; the rest of the system keeps
/// running on its remaining sources.
pub fn spawn_key_worker(
    mut device: Box<dyn InputDevice>,
    map: KeyMap,
    inbox: Sender<Update>,
    shutdown: ShutdownToken,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while !shutdown.is_cancelled() {
            match device.next_key(KEY_POLL) {
                Ok(Some(key)) => {
                    if let Some(command) = map.command_for(key) {
                        log::debug!("{}: {command}", device.name());
                        if inbox.send(Update::Command(command)).is_err() {
                            break;
                        }
                    }
                }
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("input source '{}' terminated: {e}", device.name());
                    break;
                }
            }
        }
    })
}

/// Spawn the change listener on its own mixer handle.
///
/// Blocks in a timed `wait_for_change`; on a real change it re-reads the
/// control and pushes the snapshot through the same inbox every other source
/// uses. Timeouts also re-read, but only enqueue when the snapshot differs
/// from the last one sent — that keeps platforms without edge notifications
/// converging without re-rendering a quiescent strip every poll. A hang-up
/// becomes an implicit quit.
pub fn spawn_change_listener<M>(
    mut mixer: M,
    poll_timeout: Duration,
    inbox: Sender<Update>,
    shutdown: ShutdownToken,
) -> JoinHandle<()>
where
    M: MixerHandle + Send + 'static,
{
    thread::spawn(move || {
        let mut last_sent: Option<VolumeState> = None;
        while !shutdown.is_cancelled() {
            let event = match mixer.wait_for_change(poll_timeout) {
                Ok(event) => event,
                Err(e) => {
                    log::warn!("change listener stopped: {e}");
                    break;
                }
            };
            match event {
                MixerEvent::Closed => {
                    log::warn!("mixer connection closed, requesting shutdown");
                    let _ = inbox.send(Update::Command(Command::Quit));
                    break;
                }
                MixerEvent::Changed | MixerEvent::TimedOut => {
                    let snapshot = match mixer::read_state(&mixer) {
                        Ok(snapshot) => snapshot,
                        Err(e) => {
                            log::warn!("change listener could not read mixer: {e}");
                            break;
                        }
                    };
                    let notified = event == MixerEvent::Changed;
                    if notified || last_sent != Some(snapshot) {
                        if inbox.send(Update::Resync(snapshot)).is_err() {
                            break;
                        }
                        last_sent = Some(snapshot);
                    }
                }
            }
        }
    })
}

/// Wire the rotary encoder's direction callbacks to the inbox.
///
/// The handlers run on the encoder's interrupt context and are reduced to
/// "enqueue a command, return" — they never touch coordinator state.
pub fn attach_rotary(rotary: &mut dyn RotaryEncoder, inbox: &Sender<Update>) -> Result<()> {
    let up = inbox.clone();
    let down = inbox.clone();
    rotary.set_handlers(
        Box::new(move || {
            let _ = up.send(Update::Command(Command::VolumeUp));
        }),
        Box::new(move || {
            let _ = down.send(Update::Command(Command::VolumeDown));
        }),
    )
}

/// Tunables for [`run_control_loop`].
pub struct ControlLoopOptions {
    pub render: RenderConfig,
    /// Volume step as a fraction of the control's range.
    pub step: f64,
    pub keymap: KeyMap,
    /// Bounded wait used by the change listener.
    pub poll_timeout: Duration,
    /// Called after every applied state change; drives the live status line.
    pub status: Option<StatusHook>,
}

impl Default for ControlLoopOptions {
    fn default() -> Self {
        ControlLoopOptions {
            render: RenderConfig::default(),
            step: 0.03,
            keymap: KeyMap::default(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            status: None,
        }
    }
}

/// Run the whole control loop to completion.
///
/// Starts the coordinator (startup errors surface before any worker exists),
/// spawns one worker per key device plus the change listener, wires the
/// rotary encoder, and consumes the inbox until shutdown. All workers are
/// joined before this returns; the final state is reported for the caller's
/// farewell output.
pub fn run_control_loop<M, L, D>(
    mixer: M,
    listener: L,
    display: D,
    devices: Vec<Box<dyn InputDevice>>,
    mut rotary: Option<Box<dyn RotaryEncoder>>,
    options: ControlLoopOptions,
    shutdown: ShutdownToken,
) -> Result<VolumeState>
where
    M: MixerHandle,
    L: MixerHandle + Send + 'static,
    D: DisplayDriver,
{
    let mut coordinator = Coordinator::start(mixer, display, options.render, options.step)?;
    if let Some(hook) = options.status {
        coordinator.set_status_hook(hook);
    }

    let (tx, rx) = mpsc::channel();
    let mut workers = Vec::new();
    for device in devices {
        workers.push(spawn_key_worker(
            device,
            options.keymap,
            tx.clone(),
            shutdown.clone(),
        ));
    }
    if let Some(rotary) = rotary.as_mut() {
        attach_rotary(rotary.as_mut(), &tx)?;
    }
    workers.push(spawn_change_listener(
        listener,
        options.poll_timeout,
        tx.clone(),
        shutdown.clone(),
    ));
    drop(tx);

    let result = coordinator.run(&rx, &shutdown);

    // Covers the error path; harmless after a normal quit.
    shutdown.cancel();
    for worker in workers {
        let _ = worker.join();
    }
    drop(rotary);

    result?;
    Ok(coordinator.state())
}
