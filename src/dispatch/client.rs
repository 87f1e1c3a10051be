//! Sensor node (Client) command handlers.
//!
//! Callers consult [`ClientState::dedup`] first; the handlers here assume
//! they run at most once per sequence number.

use log::info;

use super::Outcome;
use crate::app::commands::ClientCommand;
use crate::app::ports::ClientHardware;
use crate::config::NodeConfig;
use crate::node::context::{ClientState, HoleMeasurement};
use crate::scheduler::{ChangeFilter, PeriodicTimer};

/// Execute one command addressed to the sensor node.
pub fn dispatch<H: ClientHardware>(
    state: &mut ClientState,
    hw: &mut H,
    config: &NodeConfig,
    now: u32,
    msg_type: u8,
    payload: &[u8],
) -> Outcome {
    let command = match ClientCommand::decode(msg_type, payload) {
        Ok(command) => command,
        Err(code) => return Outcome::Nack(code),
    };

    match command {
        ClientCommand::LedSet(update) => {
            update.for_each(|hole, color| hw.set_led(hole, color));
            Outcome::ack()
        }
        ClientCommand::LedShow => {
            hw.show_leds();
            Outcome::ack()
        }
        ClientCommand::HoleStart { hole, mode } => {
            let plugged = hw.read_reeds() & (1 << hole) != 0;
            state.hole = Some(HoleMeasurement {
                hole,
                mode,
                started_us: now,
                timer: PeriodicTimer::start(now, config.hole_poll_period_us),
                plug: ChangeFilter::with_baseline(plugged),
            });
            info!("Hole: measuring hole {} ({:?}), plugged={}", hole, mode, plugged);
            Outcome::ack_with(&[hole, mode as u8])
        }
        ClientCommand::HoleStop => {
            if state.hole.take().is_some() {
                info!("Hole: measurement stopped");
            }
            Outcome::ack()
        }
        ClientCommand::ReedStart { period_us } => {
            let period_us = period_us.max(config.min_reed_period_us);
            if !state.reed.is_active() {
                info!("Reed: streaming every {} us", period_us);
            }
            state.reed.start(now, period_us, ());
            state.reed_filter.reset();
            Outcome::ack_with(&period_us.to_le_bytes())
        }
        ClientCommand::ReedStop => {
            if state.reed.is_active() {
                info!("Reed: stream stopped");
            }
            state.reed.stop();
            Outcome::ack()
        }
    }
}
