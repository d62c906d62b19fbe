//! GPIO rotary encoder backend (Raspberry Pi, via rppal).
//!
//! A two-channel quadrature encoder: channel A drives a falling-edge
//! interrupt, channel B's level at that instant gives the direction. The
//! direction handlers run on rppal's interrupt thread, so they must only
//! enqueue work.

use rppal::gpio::{Gpio, InputPin, Level, Trigger};

use crate::error::{Result, VolstripError};
use crate::input::{InputError, RotaryEncoder, RotaryHandler};

fn backend(e: rppal::gpio::Error) -> VolstripError {
    VolstripError::Input(InputError::Backend(format!("gpio: {e}")))
}

pub struct GpioRotary {
    pin_a: InputPin,
    /// Moved into the interrupt callback on `set_handlers`.
    pin_b: Option<InputPin>,
}

impl GpioRotary {
    /// Claim the two encoder channels with pull-ups enabled.
    pub fn open(pin_a: u8, pin_b: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(backend)?;
        let pin_a = gpio.get(pin_a).map_err(backend)?.into_input_pullup();
        let pin_b = gpio.get(pin_b).map_err(backend)?.into_input_pullup();
        Ok(GpioRotary {
            pin_a,
            pin_b: Some(pin_b),
        })
    }
}

impl RotaryEncoder for GpioRotary {
    fn set_handlers(
        &mut self,
        clockwise: RotaryHandler,
        counter_clockwise: RotaryHandler,
    ) -> Result<()> {
        let Some(pin_b) = self.pin_b.take() else {
            return Err(VolstripError::Input(InputError::Backend(
                "rotary handlers already registered".into(),
            )));
        };
        self.pin_a
            .set_async_interrupt(Trigger::FallingEdge, None, move |_event| {
                match pin_b.read() {
                    Level::High => clockwise(),
                    Level::Low => counter_clockwise(),
                }
            })
            .map_err(backend)
    }
}

impl Drop for GpioRotary {
    fn drop(&mut self) {
        let _ = self.pin_a.clear_async_interrupt();
    }
}
