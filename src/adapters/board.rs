//! Board adapters: bridge the drivers to the node port traits.
//!
//! [`RelayBoard`] owns the relay-side actuators and analog inputs and
//! implements [`ServerHardware`].  [`SensorBoard`] owns the shared I²C
//! bus, the LED SPI bus and a delay source and implements
//! [`ClientHardware`].  These are the only types the node loops see.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use embedded_hal::spi::SpiBus;
use log::{info, warn};

use crate::app::commands::{ForceSensor, Magnet, MotorDirection, Rgb};
use crate::app::ports::{ClientHardware, HallReading, ServerHardware};
use crate::drivers::analog::{self, ForceSensors};
use crate::drivers::hall::HallArray;
use crate::drivers::led_strip::LedStrip;
use crate::drivers::magnet::MagnetDriver;
use crate::drivers::reed::ReedBank;
use crate::drivers::stepper::StepperDriver;

/// Relay board peripherals.
pub struct RelayBoard {
    stepper: StepperDriver,
    magnets: MagnetDriver,
    force: ForceSensors,
}

impl RelayBoard {
    /// Park every actuator and tare the load cells.  Peripherals must
    /// already be configured by `hw_init::init_relay_peripherals`.
    pub fn new() -> Self {
        let mut board = Self {
            stepper: StepperDriver::new(),
            magnets: MagnetDriver::new(),
            force: ForceSensors::new(),
        };
        board.stepper.stop();
        board.magnets.release_all();
        board.force.tare();
        board
    }

    pub fn stepper(&self) -> &StepperDriver {
        &self.stepper
    }

    pub fn magnets(&self) -> &MagnetDriver {
        &self.magnets
    }
}

impl Default for RelayBoard {
    fn default() -> Self {
        Self::new()
    }
}

// ── ServerHardware implementation ─────────────────────────────

impl ServerHardware for RelayBoard {
    fn start_motor(&mut self, direction: MotorDirection, step_interval_us: u32) {
        self.stepper.start(direction, step_interval_us);
    }

    fn stop_motor(&mut self) {
        self.stepper.stop();
    }

    fn set_magnet(&mut self, magnet: Magnet, on: bool) {
        self.magnets.set(magnet, on);
    }

    fn read_light(&mut self) -> u16 {
        analog::read_light()
    }

    fn read_force(&mut self, sensor: ForceSensor) -> i16 {
        self.force.read(sensor)
    }
}

/// Sensor board peripherals.
pub struct SensorBoard<I, S, D> {
    i2c: I,
    spi: S,
    delay: D,
    leds: LedStrip,
    reeds: ReedBank,
    hall: HallArray,
}

impl<I, S, D> SensorBoard<I, S, D>
where
    I: I2c,
    S: SpiBus,
    D: DelayNs,
{
    /// Release the expanders, configure the Hall sensors and blank the strip.
    pub fn new(i2c: I, spi: S, delay: D) -> Self {
        let mut board = Self {
            i2c,
            spi,
            delay,
            leds: LedStrip::new(),
            reeds: ReedBank::new(),
            hall: HallArray::new(),
        };

        if let Err(e) = board.reeds.init(&mut board.i2c) {
            warn!("Reed: expander init failed: {:?}", e);
        }
        let missing = board.hall.init(&mut board.i2c);
        if missing > 0 {
            warn!("Hall: {} sensors missing", missing);
        }
        board.show_leds();
        info!("SensorBoard: ready");
        board
    }

    pub fn leds(&self) -> &LedStrip {
        &self.leds
    }

    /// I²C errors since boot (reed + Hall).
    pub fn bus_errors(&self) -> u32 {
        self.reeds.errors().wrapping_add(self.hall.errors())
    }
}

// ── ClientHardware implementation ─────────────────────────────

impl<I, S, D> ClientHardware for SensorBoard<I, S, D>
where
    I: I2c,
    S: SpiBus,
    D: DelayNs,
{
    fn set_led(&mut self, hole: u8, color: Rgb) {
        self.leds.stage(hole, color);
    }

    fn show_leds(&mut self) {
        if let Err(e) = self.leds.commit(&mut self.spi) {
            warn!("LED: commit failed: {:?}", e);
        }
    }

    fn read_reeds(&mut self) -> u32 {
        self.reeds.read(&mut self.i2c)
    }

    fn read_hall(&mut self, hole: u8, settle_us: u32) -> HallReading {
        self.hall.read(&mut self.i2c, &mut self.delay, hole, settle_us)
    }
}
