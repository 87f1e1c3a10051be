//! Board drivers.
//!
//! Relay board (raw ESP-IDF via `hw_init`): `stepper`, `magnet`, `analog`.
//! Sensor board (`embedded-hal` buses): `reed`, `hall`, `led_strip`.

pub mod analog;
pub mod hall;
pub mod hw_init;
pub mod led_strip;
pub mod magnet;
pub mod reed;
pub mod stepper;
