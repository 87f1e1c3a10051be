//! One-shot relay board peripheral initialization.
//!
//! Configures the ADC1 channels (load cells, photodiode), the stepper and
//! magnet GPIOs, and the LEDC step-pulse generator using raw ESP-IDF sys
//! calls.  Called once from the relay binary before the loop starts.
//!
//! On host builds every helper is a no-op (reads return 0) so the drivers
//! built on top of them stay testable.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc)    => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc)   => write!(f, "LEDC step generator config failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
pub fn init_relay_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the node loop; single-threaded.
    unsafe {
        init_adc()?;
        init_gpio_outputs()?;
        init_ledc()?;
    }
    info!("hw_init: relay peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_relay_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// main-loop ADC read path.  `init_adc()` completes before the loop starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };

    for channel in [
        pins::FORCE_WHITE_ADC_CHANNEL,
        pins::FORCE_BLUE_ADC_CHANNEL,
        pins::LIGHT_ADC_CHANNEL,
    ] {
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }
    }

    info!(
        "hw_init: ADC1 configured (CH{}=force white, CH{}=force blue, CH{}=light)",
        pins::FORCE_WHITE_ADC_CHANNEL,
        pins::FORCE_BLUE_ADC_CHANNEL,
        pins::LIGHT_ADC_CHANNEL
    );
    Ok(())
}

/// Raw 12-bit reading; 0 when the conversion fails.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, single-threaded main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return 0;
    }
    raw.max(0) as u16
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> u16 {
    0
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let output_pins = [
        pins::STEPPER_DIR_GPIO,
        pins::STEPPER_EN_GPIO,
        pins::MAGNET_WHITE_GPIO,
        pins::MAGNET_BLUE_GPIO,
    ];

    for &pin in &output_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
        unsafe { gpio_set_level(pin, 0) };
    }

    // Enable is active LOW: park the driver disabled.
    unsafe { gpio_set_level(pins::STEPPER_EN_GPIO, 1) };

    info!("hw_init: GPIO outputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // pin was validated during init_gpio_outputs(). Main-loop only.
    unsafe { gpio_set_level(pin, if high { 1 } else { 0 }); }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── LEDC step-pulse generator ─────────────────────────────────

#[cfg(target_os = "espidf")]
const LEDC_STEP_CHANNEL: u32 = 0;
#[cfg(target_os = "espidf")]
const STEP_DUTY_50: u32 = 1 << (pins::STEPPER_PWM_RESOLUTION_BITS - 1);

/// Initial timer frequency; retuned on every motor start.
#[cfg(target_os = "espidf")]
const STEP_IDLE_FREQ_HZ: u32 = 1_000;

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: STEP_IDLE_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    // SAFETY: Called from single main-task context via init_relay_peripherals().
    let ret = unsafe { ledc_timer_config(&timer) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }

    let ret = unsafe { ledc_channel_config(&ledc_channel_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        channel: LEDC_STEP_CHANNEL,
        timer_sel: ledc_timer_t_LEDC_TIMER_0,
        gpio_num: pins::STEPPER_STEP_GPIO,
        duty: 0,
        hpoint: 0,
        ..Default::default()
    }) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcInitFailed(ret)); }

    info!("hw_init: LEDC step generator on GPIO{}", pins::STEPPER_STEP_GPIO);
    Ok(())
}

/// Step frequency for a step interval, at least 1 Hz.
pub fn step_frequency_hz(step_interval_us: u32) -> u32 {
    (1_000_000 / step_interval_us.max(1)).max(1)
}

/// Emit a 50 % duty square wave at `freq_hz` on the STEP pin.
#[cfg(target_os = "espidf")]
pub fn step_pulses_start(freq_hz: u32) {
    // SAFETY: timer 0 and channel 0 were configured in init_ledc();
    // only the main loop retunes them.
    unsafe {
        ledc_set_freq(ledc_mode_t_LEDC_LOW_SPEED_MODE, ledc_timer_t_LEDC_TIMER_0, freq_hz);
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, LEDC_STEP_CHANNEL, STEP_DUTY_50);
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, LEDC_STEP_CHANNEL);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn step_pulses_start(_freq_hz: u32) {}

/// Hold the STEP pin low.
#[cfg(target_os = "espidf")]
pub fn step_pulses_stop() {
    // SAFETY: see step_pulses_start().
    unsafe {
        ledc_stop(ledc_mode_t_LEDC_LOW_SPEED_MODE, LEDC_STEP_CHANNEL, 0);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn step_pulses_stop() {}
