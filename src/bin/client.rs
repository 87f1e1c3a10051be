//! Apparatus sensor node (Client) entry point.
//!
//! ```text
//! ┌────────┐ ESP-NOW ┌───────────────────────────────────────┐
//! │ Server │◀───────▶│ EspNow ──▶ ClientNode (router, dedup, │
//! └────────┘         │            dispatcher, streams)       │
//!                    │                 │                     │
//!                    │     SensorBoard: I²C (reeds, Hall)    │
//!                    │                  SPI (LED strip)      │
//!                    └───────────────────────────────────────┘
//! ```

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::{Delay, FreeRtos};
use esp_idf_svc::hal::gpio::AnyIOPin;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::spi::{self, SpiBusDriver, SpiDriver};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};

use apparatus::adapters::board::SensorBoard;
use apparatus::adapters::espnow::EspNowRadio;
use apparatus::adapters::time::EspClock;
use apparatus::app::ports::Clock;
use apparatus::config::NodeConfig;
use apparatus::inbound::RADIO_INBOX;
use apparatus::link::{Links, NullSerial};
use apparatus::node::ClientNode;
use apparatus::pins;

const STATS_INTERVAL_US: u32 = 10_000_000;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Apparatus sensor v{}             ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = match NodeConfig::from_build_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Config override rejected ({}), using defaults", e);
            NodeConfig::default()
        }
    };
    info!("Config: {:?}", config);

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // Pin numbers must match pins::I2C_* and pins::LED_*.
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8,
        peripherals.pins.gpio9,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ)),
    )?;
    let spi_driver = SpiDriver::new(
        peripherals.spi2,
        peripherals.pins.gpio12,
        peripherals.pins.gpio11,
        Option::<AnyIOPin>::None,
        &spi::config::DriverConfig::new(),
    )?;
    let spi = SpiBusDriver::new(
        spi_driver,
        &spi::config::Config::new().baudrate(Hertz(pins::LED_SPI_FREQ_HZ)),
    )?;
    info!(
        "I2C on GPIO{}/GPIO{}, LED strip on GPIO{}",
        pins::I2C_SDA_GPIO, pins::I2C_SCL_GPIO, pins::LED_DATA_GPIO
    );

    let board = SensorBoard::new(i2c, spi, Delay::new_default());

    let radio = EspNowRadio::new(
        peripherals.modem,
        sysloop,
        nvs,
        config.radio_channel,
        config.peer_mac,
    )?;

    // ── 4. Node loop ──────────────────────────────────────────
    let mut node = ClientNode::new(config, board, Links::new(NullSerial, radio), EspClock::new());
    let clock = EspClock::new();
    let mut last_stats = clock.now_us();

    info!("Sensor node ready. Entering node loop.");

    loop {
        node.tick(&RADIO_INBOX);

        let now = clock.now_us();
        if now.wrapping_sub(last_stats) >= STATS_INTERVAL_US {
            last_stats = now;
            let s = node.state().stats;
            info!(
                "Stats: dispatched={} replayed={} nacked={} dropped={} telemetry={} send_failures={} \
                 radio_overflow={} bus_errors={}",
                s.dispatched,
                node.state().dedup.replays(),
                s.nacked,
                s.dropped,
                s.telemetry,
                s.send_failures,
                RADIO_INBOX.dropped(),
                node.hardware().bus_errors()
            );
        }

        // One scheduler tick; lets the idle task feed the watchdog.
        FreeRtos::delay_ms(1);
    }
}
