//! Display abstraction — trait over the LED strip hardware.
//!
//! Writes are synchronous and unretried; a failed write is fatal to the
//! control loop. The real backend (`hw::strip`) drives a WS2812 strip over
//! SPI; tests use [`mock::MockDisplay`].

use crate::error::Result;
use crate::render::PixelBuffer;

/// A sink for rendered frames.
pub trait DisplayDriver {
    /// Write one full frame to the strip.
    fn write(&mut self, pixels: &PixelBuffer) -> Result<()>;
}

// ── Test mock ──

pub mod mock {
    use super::*;
    use crate::error::VolstripError;

    /// Recording display for tests. Keeps every written frame in order;
    /// set `fail_writes` to make the next writes error out.
    #[derive(Default)]
    pub struct MockDisplay {
        pub frames: Vec<PixelBuffer>,
        pub fail_writes: bool,
    }

    impl MockDisplay {
        pub fn new() -> Self {
            Self::default()
        }

        /// The most recently written frame.
        pub fn last_frame(&self) -> Option<&PixelBuffer> {
            self.frames.last()
        }
    }

    impl DisplayDriver for MockDisplay {
        fn write(&mut self, pixels: &PixelBuffer) -> Result<()> {
            if self.fail_writes {
                return Err(VolstripError::Display("mock write failure".into()));
            }
            self.frames.push(pixels.clone());
            Ok(())
        }
    }
}
