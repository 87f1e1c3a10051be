//! Adapters: concrete implementations of the port and link traits.
//!
//! | Adapter  | Implements                  | Connects to                |
//! |----------|-----------------------------|----------------------------|
//! | `board`  | ServerHardware              | stepper, magnets, ADC      |
//! |          | ClientHardware              | LED strip, reeds, Hall     |
//! | `time`   | Clock                       | ESP32 high-resolution timer|
//! | `uart`   | SerialPort                  | UART ↔ USB bridge (espidf) |
//! | `espnow` | RadioPort                   | ESP-NOW over Wi-Fi (espidf)|

pub mod board;
#[cfg(target_os = "espidf")]
pub mod espnow;
pub mod time;
#[cfg(target_os = "espidf")]
pub mod uart;
