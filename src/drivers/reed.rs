//! Reed switch bank: three PCF8574 expanders, eight holes each.
//!
//! ```text
//!   hole n ──▶ expander 0x20 + n / 8, pin n % 8
//! ```
//!
//! Contacts close to ground when a plug's magnet is present, so a LOW pin
//! means plugged.  The driver borrows the shared I²C bus per call.

use embedded_hal::i2c::I2c;
use log::warn;

use crate::app::commands::HOLE_COUNT;

const BASE_ADDRESS: u8 = 0x20;
const EXPANDERS: u8 = HOLE_COUNT.div_ceil(8);
const HOLE_MASK: u32 = (1 << HOLE_COUNT) - 1;

#[derive(Debug, Default)]
pub struct ReedBank {
    last: u32,
    errors: u32,
}

impl ReedBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release every pin to its weak pull-up so it can be read.
    pub fn init<I: I2c>(&mut self, bus: &mut I) -> Result<(), I::Error> {
        for i in 0..EXPANDERS {
            bus.write(BASE_ADDRESS + i, &[0xFF])?;
        }
        Ok(())
    }

    /// Plugged bitfield, bit `n` = hole `n`.  On a bus error the previous
    /// value is returned.
    pub fn read<I: I2c>(&mut self, bus: &mut I) -> u32 {
        let mut levels = 0u32;
        for i in 0..EXPANDERS {
            let mut port = [0u8; 1];
            if let Err(e) = bus.read(BASE_ADDRESS + i, &mut port) {
                self.errors = self.errors.wrapping_add(1);
                warn!("Reed: expander {:#04x} read failed: {:?}", BASE_ADDRESS + i, e);
                return self.last;
            }
            levels |= u32::from(port[0]) << (8 * u32::from(i));
        }
        self.last = !levels & HOLE_MASK;
        self.last
    }

    pub fn errors(&self) -> u32 {
        self.errors
    }
}
