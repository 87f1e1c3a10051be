//! Hall sensor array: one TMAG5273 under each hole.
//!
//! All sensors share address 0x35, so each sits on its own channel of a
//! TCA9548A multiplexer (three muxes, eight channels each):
//!
//! ```text
//!   hole n ──▶ mux 0x70 + n / 8, channel n % 8 ──▶ TMAG5273 @ 0x35
//! ```
//!
//! Only one mux channel is open at a time.  Switching muxes closes the
//! previous one first.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::app::commands::HOLE_COUNT;
use crate::app::ports::HallReading;
use crate::config::MAX_HALL_SETTLE_US;

const MUX_BASE_ADDRESS: u8 = 0x70;
const SENSOR_ADDRESS: u8 = 0x35;

// TMAG5273 registers
const REG_DEVICE_CONFIG_2: u8 = 0x01;
const REG_SENSOR_CONFIG_1: u8 = 0x02;
const REG_X_MSB_RESULT: u8 = 0x12;

/// Continuous conversion.
const MODE_CONTINUOUS: u8 = 0x02;
/// X, Y and Z channels enabled.
const MAG_CH_XYZ: u8 = 0x70;

#[derive(Debug, Default)]
pub struct HallArray {
    /// Hole whose mux channel is currently open.
    selected: Option<u8>,
    errors: u32,
}

impl HallArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put every sensor into continuous XYZ conversion.  Returns the number
    /// of sensors that did not answer.
    pub fn init<I: I2c>(&mut self, bus: &mut I) -> u8 {
        let mut missing = 0;
        for hole in 0..HOLE_COUNT {
            let ok = self.select(bus, hole).is_ok()
                && bus.write(SENSOR_ADDRESS, &[REG_DEVICE_CONFIG_2, MODE_CONTINUOUS]).is_ok()
                && bus.write(SENSOR_ADDRESS, &[REG_SENSOR_CONFIG_1, MAG_CH_XYZ]).is_ok();
            if !ok {
                missing += 1;
                warn!("Hall: sensor under hole {} not responding", hole);
            }
        }
        info!("Hall: {} of {} sensors configured", HOLE_COUNT - missing, HOLE_COUNT);
        missing
    }

    /// Select `hole`, wait `settle_us` (capped), read X/Y/Z.  A bus error
    /// yields a zero reading.
    pub fn read<I: I2c, D: DelayNs>(&mut self, bus: &mut I, delay: &mut D, hole: u8, settle_us: u32) -> HallReading {
        match self.try_read(bus, delay, hole, settle_us) {
            Ok(reading) => reading,
            Err(e) => {
                self.errors = self.errors.wrapping_add(1);
                warn!("Hall: hole {} read failed: {:?}", hole, e);
                HallReading::default()
            }
        }
    }

    fn try_read<I: I2c, D: DelayNs>(
        &mut self,
        bus: &mut I,
        delay: &mut D,
        hole: u8,
        settle_us: u32,
    ) -> Result<HallReading, I::Error> {
        self.select(bus, hole)?;
        delay.delay_us(settle_us.min(MAX_HALL_SETTLE_US));

        let mut raw = [0u8; 6];
        bus.write_read(SENSOR_ADDRESS, &[REG_X_MSB_RESULT], &mut raw)?;
        Ok(HallReading {
            x: i16::from_be_bytes([raw[0], raw[1]]),
            y: i16::from_be_bytes([raw[2], raw[3]]),
            z: i16::from_be_bytes([raw[4], raw[5]]),
        })
    }

    fn select<I: I2c>(&mut self, bus: &mut I, hole: u8) -> Result<(), I::Error> {
        let mux = hole / 8;
        if let Some(prev) = self.selected {
            if prev == hole {
                return Ok(());
            }
            if prev / 8 != mux {
                bus.write(MUX_BASE_ADDRESS + prev / 8, &[0])?;
            }
        }
        self.selected = None;
        bus.write(MUX_BASE_ADDRESS + mux, &[1 << (hole % 8)])?;
        self.selected = Some(hole);
        Ok(())
    }

    pub fn errors(&self) -> u32 {
        self.errors
    }
}
