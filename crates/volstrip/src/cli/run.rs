//! `run` subcommand — the mirror loop tying mixer, inputs, and strip together.

use std::io::Write;
use std::process::Command as Process;

use volstrip_lib::input::{InputDevice, RotaryEncoder};
use volstrip_lib::mixer::{self, MixerHandle, VolumeRange, VolumeState};
use volstrip_lib::workers::{ControlLoopOptions, run_control_loop};

use super::{Context, Result, hw};

/// Rewrite the in-place status line: mute state and `min:current:max`
/// volume, updated on every applied change.
fn print_status(range: VolumeRange, state: VolumeState) {
    let line = format!(
        "[state]  volume {}:{}:{}{}",
        range.min,
        state.volume,
        range.max,
        if state.muted { " (muted)" } else { "" }
    );
    // Padded past the longest variant so a shrinking line leaves no residue.
    print!("\r{line:<48}");
    let _ = std::io::stdout().flush();
}

/// Turns off terminal echo for the duration of the loop, so key presses
/// meant for the mixer don't spill into the shell. Restored on drop.
struct EchoGuard;

impl EchoGuard {
    fn disable() -> Option<EchoGuard> {
        let ok = Process::new("stty")
            .arg("-echo")
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        ok.then_some(EchoGuard)
    }
}

impl Drop for EchoGuard {
    fn drop(&mut self) {
        let _ = Process::new("stty").arg("echo").status();
    }
}

pub(super) fn cmd_run(ctx: &Context, control: Option<&str>) -> Result<()> {
    let config = ctx.load_config();
    config.validate()?;

    let address = ctx.address(&config);
    let control = control.unwrap_or(&config.mixer.control);

    // Two handles onto the same control: the loop writes through one, the
    // change listener polls the other.
    let mixer = hw::AlsaMixer::open(&address, control)?;
    let listener = hw::AlsaMixer::open(&address, control)?;
    println!("[mixer]  {control} (card '{}')", address.device_string());

    let range = mixer.range()?;
    let state = mixer::read_state(&mixer)?;

    let keymap = config.keymap();
    let devices: Vec<Box<dyn InputDevice>> = hw::find_key_devices(&keymap)
        .into_iter()
        .map(|d| Box::new(d) as Box<dyn InputDevice>)
        .collect();
    if devices.is_empty() {
        log::warn!("no key input devices found; external changes and the rotary encoder still work");
    } else {
        println!(
            "[input]  {} key device{}",
            devices.len(),
            if devices.len() == 1 { "" } else { "s" }
        );
    }

    let rotary: Option<Box<dyn RotaryEncoder>> = if config.rotary.enabled {
        match hw::GpioRotary::open(config.rotary.pin_a, config.rotary.pin_b) {
            Ok(rotary) => {
                println!(
                    "[rotary] GPIO {} / {}",
                    config.rotary.pin_a, config.rotary.pin_b
                );
                Some(Box::new(rotary))
            }
            Err(e) => {
                log::warn!("rotary encoder unavailable: {e}");
                None
            }
        }
    } else {
        None
    };

    let render = config.render_config()?;
    let strip = hw::SpiStrip::open(render.strip_length)?;
    println!("[strip]  {} pixels over SPI", render.strip_length);

    let options = ControlLoopOptions {
        render,
        step: config.mixer.step,
        keymap,
        poll_timeout: config.poll_timeout(),
        status: Some(Box::new(move |state| print_status(range, state))),
    };

    println!();
    println!("Mirroring... (Ctrl+C to stop)");
    print_status(range, state);
    let echo = EchoGuard::disable();

    let result = run_control_loop(
        mixer,
        listener,
        strip,
        devices,
        rotary,
        options,
        ctx.shutdown.clone(),
    );
    drop(echo);

    // The strip handle was consumed by the loop; reopen briefly so a quit
    // doesn't leave the last frame burning.
    match hw::SpiStrip::open(config.strip.length) {
        Ok(mut strip) => {
            if let Err(e) = strip.blank() {
                log::warn!("could not blank the strip: {e}");
            }
        }
        Err(e) => log::warn!("could not reopen the strip to blank it: {e}"),
    }

    let state = result?;
    println!();
    println!(
        "Done. Volume {}{}.",
        state.volume,
        if state.muted { " (muted)" } else { "" }
    );
    Ok(())
}
