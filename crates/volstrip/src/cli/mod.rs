//! CLI subcommands — card discovery, control inspection, the mirror loop.

mod cards;
mod config_cmd;
mod controls;
mod run;
mod show;

use std::path::PathBuf;

use clap::Subcommand;
use serde::Serialize;

pub(super) use volstrip_lib::config::Config;
pub(super) use volstrip_lib::coordinator::ShutdownToken;
pub(super) use volstrip_lib::error::Result;
pub(super) use volstrip_lib::hw::{self, CardAddress};

/// Everything the subcommands need from the global arguments.
pub struct Context {
    pub json: bool,
    pub card: Option<i32>,
    pub device: Option<String>,
    pub config_path: Option<PathBuf>,
    pub shutdown: ShutdownToken,
}

impl Context {
    pub(super) fn load_config(&self) -> Config {
        Config::load(self.config_path.as_deref())
    }

    /// Card selection: command line first, then config, then the default card.
    pub(super) fn address(&self, config: &Config) -> CardAddress {
        if let Some(ref device) = self.device {
            return CardAddress::Device(device.clone());
        }
        if let Some(index) = self.card {
            return CardAddress::Index(index);
        }
        if let Some(ref device) = config.mixer.device {
            return CardAddress::Device(device.clone());
        }
        if let Some(index) = config.mixer.card {
            return CardAddress::Index(index);
        }
        CardAddress::Default
    }
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct CardsOutput {
    pub count: usize,
    pub cards: Vec<CardJson>,
}

#[derive(Serialize)]
pub(super) struct CardJson {
    pub index: i32,
    pub name: String,
}

#[derive(Serialize)]
pub(super) struct ControlsOutput {
    pub card: String,
    pub count: usize,
    pub controls: Vec<String>,
}

#[derive(Serialize)]
pub(super) struct ShowOutput {
    pub control: String,
    pub card: String,
    pub volume: i64,
    pub min: i64,
    pub max: i64,
    pub percent: f64,
    /// `null` when the control has no mute switch.
    pub muted: Option<bool>,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the mirror loop (keys and rotary encoder drive the mixer and strip)
    Run {
        /// Mixer control to follow (default: from config)
        control: Option<String>,
    },

    /// List sound cards
    Cards,

    /// List the playback controls of the selected card
    Controls,

    /// Show the current state of a mixer control
    Show {
        /// Mixer control to inspect (default: from config)
        control: Option<String>,
    },

    /// Show current configuration and file path
    Config,
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

pub fn run(cmd: Command, ctx: &Context) -> Result<()> {
    match cmd {
        Command::Run { control } => {
            if ctx.json {
                warn_json_unsupported("run");
            }
            run::cmd_run(ctx, control.as_deref())
        }
        Command::Cards => cards::cmd_cards(ctx),
        Command::Controls => controls::cmd_controls(ctx),
        Command::Show { control } => show::cmd_show(ctx, control.as_deref()),
        Command::Config => config_cmd::cmd_config(ctx),
    }
}
