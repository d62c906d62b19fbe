//! `controls` subcommand — list the playback controls of one card.

use super::{Context, ControlsOutput, Result, hw};

pub(super) fn cmd_controls(ctx: &Context) -> Result<()> {
    let config = ctx.load_config();
    let address = ctx.address(&config);
    let controls = hw::alsa::list_controls(&address)?;

    if ctx.json {
        let output = ControlsOutput {
            card: address.device_string(),
            count: controls.len(),
            controls,
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return Ok(());
    }

    if controls.is_empty() {
        println!(
            "No playback controls on card '{}'.",
            address.device_string()
        );
        return Ok(());
    }

    println!("Playback controls on '{}':", address.device_string());
    for control in controls {
        println!("  {control}");
    }
    Ok(())
}
