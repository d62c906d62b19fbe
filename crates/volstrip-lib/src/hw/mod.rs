//! Hardware backends. Linux-only, gated behind the `hardware` feature.
//!
//! Each submodule implements one of the library's hardware traits against a
//! real device: ALSA simple mixer elements, evdev key devices, a GPIO rotary
//! encoder, and a WS2812 strip over SPI.

pub mod alsa;
pub mod evdev;
pub mod rotary;
pub mod strip;

pub use alsa::{AlsaMixer, CardAddress};
pub use evdev::{find_key_devices, EvdevInput};
pub use rotary::GpioRotary;
pub use strip::SpiStrip;
