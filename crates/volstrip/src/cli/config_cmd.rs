//! `config` subcommand — show current configuration and file path.

use super::{Config, ConfigOutput, Context, Result};

pub(super) fn cmd_config(ctx: &Context) -> Result<()> {
    let path = ctx
        .config_path
        .clone()
        .or_else(Config::config_path);
    let exists = path.as_deref().is_some_and(|p| p.exists());
    let config = ctx.load_config();

    if ctx.json {
        let output = ConfigOutput {
            config_file: path.map(|p| p.display().to_string()),
            config_file_exists: exists,
            settings: config,
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return Ok(());
    }

    match path {
        Some(ref p) if exists => println!("Config file: {}", p.display()),
        Some(ref p) => println!("Config file: {} (not present, using defaults)", p.display()),
        None => println!("Config file: (no config directory, using defaults)"),
    }
    println!();
    println!("Control:      {}", config.mixer.control);
    println!("Step:         {:.0}%", config.mixer.step * 100.0);
    println!("Poll timeout: {} ms", config.mixer.poll_timeout_ms);
    println!("Strip:        {} pixels, {} / {} (muted)", config.strip.length, config.strip.color, config.strip.mute_color);
    println!(
        "Keys:         up={} down={} mute={} quit={}",
        config.keys.volume_up, config.keys.volume_down, config.keys.mute, config.keys.quit
    );
    if config.rotary.enabled {
        println!("Rotary:       GPIO {} / {}", config.rotary.pin_a, config.rotary.pin_b);
    } else {
        println!("Rotary:       disabled");
    }
    Ok(())
}
