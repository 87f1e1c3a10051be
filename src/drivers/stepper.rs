//! Stepper motor driver (STEP/DIR/EN interface).
//!
//! The step pulse train comes from an LEDC channel, so the motor keeps
//! turning at a fixed rate without loop involvement.  Starting while
//! already running retunes direction and rate in place.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the LEDC step generator and GPIO via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::app::commands::MotorDirection;
use crate::drivers::hw_init;
use crate::pins;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepperState {
    Stopped,
    Running { direction: MotorDirection, step_interval_us: u32 },
}

pub struct StepperDriver {
    state: StepperState,
}

impl Default for StepperDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl StepperDriver {
    pub fn new() -> Self {
        Self { state: StepperState::Stopped }
    }

    pub fn start(&mut self, direction: MotorDirection, step_interval_us: u32) {
        self.set_direction_hw(direction);
        self.set_enabled_hw(true);
        hw_init::step_pulses_start(hw_init::step_frequency_hz(step_interval_us));

        self.state = StepperState::Running { direction, step_interval_us };
    }

    pub fn stop(&mut self) {
        hw_init::step_pulses_stop();
        self.set_enabled_hw(false);
        self.state = StepperState::Stopped;
    }

    fn set_direction_hw(&self, direction: MotorDirection) {
        hw_init::gpio_write(pins::STEPPER_DIR_GPIO, direction == MotorDirection::Forward);
    }

    fn set_enabled_hw(&self, enabled: bool) {
        // Active LOW.
        hw_init::gpio_write(pins::STEPPER_EN_GPIO, !enabled);
    }

    pub fn state(&self) -> StepperState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.state, StepperState::Stopped)
    }
}
