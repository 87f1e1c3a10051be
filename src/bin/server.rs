//! Apparatus relay node (Server) entry point.
//!
//! ```text
//! ┌──────────┐ USB/COBS ┌──────────────────────────────┐ ESP-NOW ┌────────┐
//! │   Host   │◀────────▶│ UsbSerial ─┐        ┌─ EspNow│◀───────▶│ Client │
//! └──────────┘          │            ▼        ▼        │         └────────┘
//!                       │        ServerNode (router,   │
//!                       │        dispatcher, streams)  │
//!                       │            │                 │
//!                       │        RelayBoard (stepper,  │
//!                       │        magnets, ADC)         │
//!                       └──────────────────────────────┘
//! ```

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};

use apparatus::adapters::board::RelayBoard;
use apparatus::adapters::espnow::EspNowRadio;
use apparatus::adapters::time::EspClock;
use apparatus::adapters::uart::UsbSerial;
use apparatus::app::ports::Clock;
use apparatus::config::NodeConfig;
use apparatus::drivers::hw_init;
use apparatus::inbound::RADIO_INBOX;
use apparatus::link::Links;
use apparatus::node::ServerNode;
use apparatus::pins;

const STATS_INTERVAL_US: u32 = 10_000_000;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Apparatus relay v{}              ║", env!("CARGO_PKG_VERSION"));
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
    hw_init::init_relay_peripherals()?;
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // Pin numbers must match pins::HOST_UART_*.
    let serial = UsbSerial::new(
        peripherals.uart1,
        peripherals.pins.gpio17,
        peripherals.pins.gpio18,
        config.serial_baud,
    )?;
    info!("Host link on GPIO{}/GPIO{}", pins::HOST_UART_TX_GPIO, pins::HOST_UART_RX_GPIO);

    let radio = EspNowRadio::new(
        peripherals.modem,
        sysloop,
        nvs,
        config.radio_channel,
        config.peer_mac,
    )?;

    // ── 4. Node loop ──────────────────────────────────────────
    let mut node = ServerNode::new(config, RelayBoard::new(), Links::new(serial, radio), EspClock::new());
    let clock = EspClock::new();
    let mut last_stats = clock.now_us();

    info!("Relay ready. Entering node loop.");

    loop {
        node.tick(&RADIO_INBOX);

        let now = clock.now_us();
        if now.wrapping_sub(last_stats) >= STATS_INTERVAL_US {
            last_stats = now;
            let s = node.state().stats;
            info!(
                "Stats: dispatched={} nacked={} forwarded={} dropped={} telemetry={} send_failures={} \
                 radio_overflow={} serial_frames_dropped={}",
                s.dispatched,
                s.nacked,
                s.forwarded,
                s.dropped,
                s.telemetry,
                s.send_failures,
                RADIO_INBOX.dropped(),
                node.serial_frames_dropped()
            );
        }

        // One scheduler tick; lets the idle task feed the watchdog.
        FreeRtos::delay_ms(1);
    }
}
