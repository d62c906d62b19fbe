//! WS2812 LED strip backend, driven over SPI.
//!
//! The WS2812 protocol is bit-banged onto the SPI clock by the `ws2812-spi`
//! crate; 3 MHz gives the timing the strip expects. Frames are always full
//! repaints, so the driver is stateless apart from the bus handle.

use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use smart_leds::{SmartLedsWrite, RGB8};
use ws2812_spi::Ws2812;

use crate::display::DisplayDriver;
use crate::error::{Result, VolstripError};
use crate::render::PixelBuffer;

const SPI_CLOCK_HZ: u32 = 3_000_000;

pub struct SpiStrip {
    link: Ws2812<Spi>,
    length: usize,
}

impl SpiStrip {
    /// Open the strip on SPI0/CE0.
    pub fn open(length: usize) -> Result<Self> {
        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, SPI_CLOCK_HZ, Mode::Mode0)
            .map_err(|e| VolstripError::Display(e.to_string()))?;
        Ok(SpiStrip {
            link: Ws2812::new(spi),
            length,
        })
    }

    /// Turn every pixel off. Used on the way out so a quit doesn't leave the
    /// strip frozen on the last frame.
    pub fn blank(&mut self) -> Result<()> {
        let off = std::iter::repeat(RGB8::default()).take(self.length);
        self.link
            .write(off)
            .map_err(|e| VolstripError::Display(e.to_string()))
    }
}

impl DisplayDriver for SpiStrip {
    fn write(&mut self, pixels: &PixelBuffer) -> Result<()> {
        let frame = pixels.iter().map(|p| RGB8::new(p.r, p.g, p.b));
        self.link
            .write(frame)
            .map_err(|e| VolstripError::Display(e.to_string()))
    }
}
