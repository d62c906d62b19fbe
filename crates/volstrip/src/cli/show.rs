//! `show` subcommand — print the current state of a mixer control.

use volstrip_lib::mixer::MixerHandle;

use super::{Context, Result, ShowOutput, hw};

pub(super) fn cmd_show(ctx: &Context, control: Option<&str>) -> Result<()> {
    let config = ctx.load_config();
    let address = ctx.address(&config);
    let control = control.unwrap_or(&config.mixer.control);

    let mixer = hw::AlsaMixer::open(&address, control)?;
    let range = mixer.range()?;
    let volume = mixer.volume()?;
    let muted = mixer.mute()?;
    let percent = (volume - range.min) as f64 / range.span() as f64 * 100.0;

    if ctx.json {
        let output = ShowOutput {
            control: control.to_owned(),
            card: address.device_string(),
            volume,
            min: range.min,
            max: range.max,
            percent,
            muted,
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return Ok(());
    }

    println!("Control: {control} (card '{}')", address.device_string());
    println!("Volume:  {volume} [{}..{}] ({percent:.0}%)", range.min, range.max);
    match muted {
        Some(true) => println!("Muted:   yes"),
        Some(false) => println!("Muted:   no"),
        None => println!("Muted:   (no mute switch)"),
    }
    Ok(())
}
