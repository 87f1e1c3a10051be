//! Relay node (Server) command handlers.

use log::info;

use super::Outcome;
use crate::app::commands::ServerCommand;
use crate::app::ports::ServerHardware;
use crate::config::NodeConfig;
use crate::node::context::{MotorAction, ServerState};

/// Execute one command addressed to the relay node.
///
/// Motor commands only arm [`ServerState::pending_motor`]; the stepper is
/// driven from the `ApplyPending` loop step.
pub fn dispatch<H: ServerHardware>(
    state: &mut ServerState,
    hw: &mut H,
    config: &NodeConfig,
    now: u32,
    msg_type: u8,
    payload: &[u8],
) -> Outcome {
    let command = match ServerCommand::decode(msg_type, payload) {
        Ok(command) => command,
        Err(code) => return Outcome::Nack(code),
    };

    match command {
        ServerCommand::MotorStart { direction, step_interval_us } => {
            let step_interval_us = step_interval_us.max(config.min_step_interval_us);
            state.pending_motor = Some(MotorAction::Start { direction, step_interval_us });
            let i = step_interval_us.to_le_bytes();
            Outcome::ack_with(&[direction as u8, i[0], i[1], i[2], i[3]])
        }
        ServerCommand::MotorStop => {
            state.pending_motor = Some(MotorAction::Stop);
            Outcome::ack()
        }
        ServerCommand::ForceStart { period_us, selector } => {
            let period_us = period_us.max(config.min_force_period_us);
            if !state.force.is_active() {
                info!("Force: streaming {:?} every {} us", selector, period_us);
            }
            state.force.start(now, period_us, selector);
            let p = period_us.to_le_bytes();
            Outcome::ack_with(&[p[0], p[1], p[2], p[3], selector as u8])
        }
        ServerCommand::ForceStop => {
            if state.force.is_active() {
                info!("Force: stream stopped");
            }
            state.force.stop();
            Outcome::ack()
        }
        ServerCommand::MagnetSet { magnet, on } => {
            hw.set_magnet(magnet, on);
            Outcome::ack_with(&[magnet as u8, u8::from(on)])
        }
        ServerCommand::LightQuery => Outcome::ack_with(&hw.read_light().to_le_bytes()),
    }
}
