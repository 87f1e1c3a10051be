//! Electromagnet pair (MOSFET low-side switches).

use crate::app::commands::Magnet;
use crate::drivers::hw_init;
use crate::pins;

#[derive(Debug, Default)]
pub struct MagnetDriver {
    white: bool,
    blue: bool,
}

impl MagnetDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, magnet: Magnet, on: bool) {
        let (pin, slot) = match magnet {
            Magnet::White => (pins::MAGNET_WHITE_GPIO, &mut self.white),
            Magnet::Blue => (pins::MAGNET_BLUE_GPIO, &mut self.blue),
        };
        hw_init::gpio_write(pin, on);
        *slot = on;
    }

    /// De-energise both coils.
    pub fn release_all(&mut self) {
        self.set(Magnet::White, false);
        self.set(Magnet::Blue, false);
    }

    pub fn is_on(&self, magnet: Magnet) -> bool {
        match magnet {
            Magnet::White => self.white,
            Magnet::Blue => self.blue,
        }
    }
}
