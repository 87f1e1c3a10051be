//! GPIO / peripheral pin assignments for the apparatus boards.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Both boards are ESP32-S3 modules; the relay
//! (Server) and sensor (Client) boards use disjoint subsets.

// ---------------------------------------------------------------------------
// Relay board: stepper motor driver (A4988 / DRV8825 STEP-DIR interface)
// ---------------------------------------------------------------------------

/// LEDC output: one rising edge per step.
pub const STEPPER_STEP_GPIO: i32 = 4;
/// Digital output: HIGH = forward, LOW = reverse.
pub const STEPPER_DIR_GPIO: i32 = 5;
/// Digital output: driver enable, active LOW.
pub const STEPPER_EN_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Relay board: electromagnets (MOSFET low-side switches, active HIGH)
// ---------------------------------------------------------------------------

pub const MAGNET_WHITE_GPIO: i32 = 7;
pub const MAGNET_BLUE_GPIO: i32 = 15;

// ---------------------------------------------------------------------------
// Relay board: analog inputs (ADC1)
// ---------------------------------------------------------------------------

/// White load cell amplifier output.  ADC1 channel 0 (GPIO 1).
pub const FORCE_WHITE_ADC_CHANNEL: u32 = 0;
/// Blue load cell amplifier output.  ADC1 channel 1 (GPIO 2).
pub const FORCE_BLUE_ADC_CHANNEL: u32 = 1;
/// Photodiode transimpedance output.  ADC1 channel 2 (GPIO 3).
pub const LIGHT_ADC_CHANNEL: u32 = 2;

// ---------------------------------------------------------------------------
// Relay board: host link (UART1 through the on-board USB bridge)
// ---------------------------------------------------------------------------

pub const HOST_UART_TX_GPIO: i32 = 17;
pub const HOST_UART_RX_GPIO: i32 = 18;

// ---------------------------------------------------------------------------
// Sensor board: I²C bus (reed expanders, Hall multiplexers)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
pub const I2C_FREQ_HZ: u32 = 400_000;

// ---------------------------------------------------------------------------
// Sensor board: WS2812B strip, one pixel per hole, driven from SPI MOSI
// ---------------------------------------------------------------------------

pub const LED_DATA_GPIO: i32 = 11;
/// SPI clock; required by the peripheral, left unconnected.
pub const LED_SPI_SCLK_GPIO: i32 = 12;
/// Three SPI bits per WS2812 bit.
pub const LED_SPI_FREQ_HZ: u32 = 2_400_000;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC resolution for the step pulse.  Duty is fixed at 50 %.
pub const STEPPER_PWM_RESOLUTION_BITS: u32 = 8;
