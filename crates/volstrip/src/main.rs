//! Volstrip CLI — mirror an ALSA mixer control onto an addressable LED strip.

use std::path::PathBuf;

use clap::Parser;
use volstrip_lib::coordinator::ShutdownToken;

mod cli;

#[derive(Parser)]
#[command(
    name = "volstrip",
    version,
    about = "Mirror an ALSA mixer control onto an addressable LED strip"
)]
struct Args {
    /// Output as JSON (for cards, controls, show, config)
    #[arg(long, global = true)]
    json: bool,

    /// ALSA card index
    #[arg(short = 'c', long, global = true, conflicts_with = "device")]
    card: Option<i32>,

    /// ALSA device string (e.g. hw:1)
    #[arg(short = 'd', long, global = true)]
    device: Option<String>,

    /// Path to the config file (default: platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: cli::Command,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let args = Args::parse();

    let shutdown = ShutdownToken::new();
    let handler_token = shutdown.clone();
    ctrlc::set_handler(move || {
        handler_token.cancel();
    })
    .ok();

    let ctx = cli::Context {
        json: args.json,
        card: args.card,
        device: args.device,
        config_path: args.config,
        shutdown,
    };

    if let Err(e) = cli::run(args.command, &ctx) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
