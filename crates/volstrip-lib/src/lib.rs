//! Volstrip — mirror an ALSA mixer control onto an addressable LED strip.

pub mod color;
pub mod command;
pub mod config;
pub mod coordinator;
pub mod display;
pub mod error;
pub mod input;
pub mod mixer;
pub mod render;
pub mod workers;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod hw;

pub use error::VolstripError;
