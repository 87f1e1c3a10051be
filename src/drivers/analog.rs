//! Load cells and photodiode on ADC1.
//!
//! Force readings are raw ADC counts relative to a zero offset captured at
//! boot (no load on either cell).  Conversion to newtons happens on the
//! host.

use crate::app::commands::ForceSensor;
use crate::drivers::hw_init;
use crate::pins;

/// Samples averaged when capturing the zero offset.
const TARE_SAMPLES: u32 = 16;

pub struct ForceSensors {
    white_offset: u16,
    blue_offset: u16,
}

impl Default for ForceSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl ForceSensors {
    pub fn new() -> Self {
        Self { white_offset: 0, blue_offset: 0 }
    }

    /// Average a burst of samples per cell and store them as zero.
    pub fn tare(&mut self) {
        self.white_offset = average(channel(ForceSensor::White));
        self.blue_offset = average(channel(ForceSensor::Blue));
        log::info!(
            "Force: tare white={} blue={}",
            self.white_offset, self.blue_offset
        );
    }

    pub fn read(&self, sensor: ForceSensor) -> i16 {
        let raw = hw_init::adc1_read(channel(sensor));
        let offset = match sensor {
            ForceSensor::White => self.white_offset,
            ForceSensor::Blue => self.blue_offset,
        };
        relative(raw, offset)
    }
}

pub fn read_light() -> u16 {
    hw_init::adc1_read(pins::LIGHT_ADC_CHANNEL)
}

fn channel(sensor: ForceSensor) -> u32 {
    match sensor {
        ForceSensor::White => pins::FORCE_WHITE_ADC_CHANNEL,
        ForceSensor::Blue => pins::FORCE_BLUE_ADC_CHANNEL,
    }
}

fn average(channel: u32) -> u16 {
    let sum: u32 = (0..TARE_SAMPLES).map(|_| u32::from(hw_init::adc1_read(channel))).sum();
    (sum / TARE_SAMPLES) as u16
}

/// 12-bit counts fit i16 either side of any offset.
fn relative(raw: u16, offset: u16) -> i16 {
    (i32::from(raw) - i32::from(offset)) as i16
}
