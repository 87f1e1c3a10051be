//! Sensor node end to end: commands in over the radio inbox, replies and
//! telemetry out over the radio.

use apparatus::app::commands::Rgb;
use apparatus::app::events::Telemetry;
use apparatus::app::ports::HallReading;
use apparatus::config::NodeConfig;
use apparatus::inbound::InboundQueue;
use apparatus::link::{Links, NullSerial};
use apparatus::node::ClientNode;
use apparatus::protocol::{Address, ErrorCode, msg};

use crate::mock_hw::{ClientLinks, MockClientHw, MockClock, MockRadio, Wire, command, parse};

type Node = ClientNode<MockClientHw, ClientLinks, MockClock>;

fn make_node() -> (Node, InboundQueue<8>) {
    let links = Links::new(NullSerial, MockRadio::default());
    let node = ClientNode::new(NodeConfig::default(), MockClientHw::new(), links, MockClock::at(0));
    (node, InboundQueue::new())
}

fn host_cmd(msg_type: u8, seq: u32, payload: &[u8]) -> Vec<u8> {
    command(msg_type, seq, Address::Host, Address::Client, true, payload)
}

/// Deliver one packet and run a tick.
fn deliver(node: &mut Node, inbox: &InboundQueue<8>, packet: &[u8]) {
    assert!(inbox.push(packet));
    node.tick(inbox);
}

fn take_radio(node: &mut Node) -> Vec<Vec<u8>> {
    std::mem::take(&mut node.links_mut().radio.sent)
}

fn take_parsed(node: &mut Node) -> Vec<Wire> {
    take_radio(node).iter().map(|p| parse(p)).collect()
}

const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };

// ── LEDs ──────────────────────────────────────────────────────

#[test]
fn led_set_stages_until_show() {
    let (mut node, inbox) = make_node();

    deliver(&mut node, &inbox, &host_cmd(msg::LED_SET_N, 1, &[1, 5, 255, 0, 0]));
    assert_eq!(node.hardware().staged[5], RED);
    assert!(node.hardware().shown.is_empty(), "nothing visible before LED_SHOW");

    deliver(&mut node, &inbox, &host_cmd(msg::LED_SHOW, 2, &[]));
    let shown = &node.hardware().shown;
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0][5], RED);
    assert_eq!(shown[0][4], Rgb::default());

    let acks = take_parsed(&mut node);
    assert_eq!(acks.len(), 2);
    assert!(acks.iter().all(|a| a.msg_type == msg::ACK && a.dst == Address::Host.as_u8()));
    assert!(acks.iter().all(|a| a.src == Address::Client.as_u8() && a.checksum_ok));
}

#[test]
fn led_set_accepts_both_layouts() {
    let (mut node, inbox) = make_node();

    // Uniform: three holes, one colour.
    deliver(&mut node, &inbox, &host_cmd(msg::LED_SET_N, 1, &[3, 0, 1, 2, 0, 0, 9]));
    // Per-hole: two (hole, colour) pairs.
    deliver(&mut node, &inbox, &host_cmd(msg::LED_SET_N, 2, &[2, 7, 1, 2, 3, 8, 4, 5, 6]));

    let hw = node.hardware();
    assert_eq!(hw.set_led_calls, 5);
    assert_eq!(hw.staged[2], Rgb { r: 0, g: 0, b: 9 });
    assert_eq!(hw.staged[7], Rgb { r: 1, g: 2, b: 3 });
    assert_eq!(hw.staged[8], Rgb { r: 4, g: 5, b: 6 });
}

#[test]
fn led_set_rejects_bad_shapes() {
    let (mut node, inbox) = make_node();

    deliver(&mut node, &inbox, &host_cmd(msg::LED_SET_N, 1, &[2, 0, 1, 2]));
    deliver(&mut node, &inbox, &host_cmd(msg::LED_SET_N, 2, &[1, 21, 0, 0, 0]));
    deliver(&mut node, &inbox, &host_cmd(msg::LED_SET_N, 3, &[0]));

    for nack in take_parsed(&mut node) {
        assert_eq!(nack.msg_type, msg::NACK);
        assert_eq!(nack.payload, [ErrorCode::BadPayload as u8]);
    }
    assert_eq!(node.hardware().set_led_calls, 0);
}

// ── Duplicate suppression ─────────────────────────────────────

#[test]
fn retransmitted_command_runs_once_with_identical_replies() {
    let (mut node, inbox) = make_node();
    let cmd = host_cmd(msg::LED_SET_N, 42, &[1, 3, 255, 0, 0]);

    deliver(&mut node, &inbox, &cmd);
    deliver(&mut node, &inbox, &cmd);

    assert_eq!(node.hardware().set_led_calls, 1);
    let replies = take_radio(&mut node);
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0], replies[1]);
    assert_eq!(node.state().dedup.replays(), 1);

    // A new sequence number runs again.
    deliver(&mut node, &inbox, &host_cmd(msg::LED_SET_N, 43, &[1, 3, 255, 0, 0]));
    assert_eq!(node.hardware().set_led_calls, 2);
}

#[test]
fn retransmitted_rejection_replays_the_same_nack() {
    let (mut node, inbox) = make_node();
    let cmd = host_cmd(msg::HOLE_START, 5, &[30, 0]);

    deliver(&mut node, &inbox, &cmd);
    deliver(&mut node, &inbox, &cmd);

    let replies = take_radio(&mut node);
    assert_eq!(replies[0], replies[1]);
    assert_eq!(parse(&replies[0]).payload, [ErrorCode::BadPayload as u8]);
}

#[test]
fn hole_start_retransmit_does_not_rearm() {
    let (mut node, inbox) = make_node();
    let cmd = host_cmd(msg::HOLE_START, 8, &[2, 1]);

    deliver(&mut node, &inbox, &cmd);
    let armed_at = node.state().hole.map(|m| m.started_us);

    node.clock_mut().advance(5_000);
    deliver(&mut node, &inbox, &cmd);
    assert_eq!(node.state().hole.map(|m| m.started_us), armed_at);
}

// ── Hole measurement ──────────────────────────────────────────

#[test]
fn single_hole_measurement_reports_first_plug_then_stops() {
    let (mut node, inbox) = make_node();
    node.hardware_mut().hall = HallReading { x: 10, y: -20, z: 300 };

    deliver(&mut node, &inbox, &host_cmd(msg::HOLE_START, 1, &[4, 0]));
    let ack = &take_parsed(&mut node)[0];
    assert_eq!(ack.payload, [4, 0]);

    node.clock_mut().advance(1_000);
    node.tick(&inbox);
    assert!(take_radio(&mut node).is_empty(), "no change, no sample");

    node.hardware_mut().reeds = 1 << 4;
    node.clock_mut().advance(1_000);
    node.tick(&inbox);

    let samples = take_parsed(&mut node);
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].msg_type, msg::DATA_HALL);
    assert_eq!(samples[0].dst, Address::Host.as_u8());
    assert_eq!(
        Telemetry::decode(samples[0].msg_type, &samples[0].payload),
        Some(Telemetry::Hall {
            hole: 4,
            plugged: true,
            reaction_us: 2_000,
            field: HallReading { x: 10, y: -20, z: 300 },
        })
    );
    assert_eq!(node.hardware().hall_reads, [(4, NodeConfig::default().hall_settle_us)]);
    assert!(node.state().hole.is_none());

    node.hardware_mut().reeds = 0;
    node.clock_mut().advance(1_000);
    node.tick(&inbox);
    assert!(take_radio(&mut node).is_empty());
}

#[test]
fn continuous_hole_measurement_reports_every_transition() {
    let (mut node, inbox) = make_node();
    deliver(&mut node, &inbox, &host_cmd(msg::HOLE_START, 1, &[0, 1]));
    take_radio(&mut node);

    for plugged in [true, false, true] {
        node.hardware_mut().reeds = u32::from(plugged);
        node.clock_mut().advance(1_000);
        node.tick(&inbox);
    }
    let states: Vec<_> = take_parsed(&mut node)
        .iter()
        .filter_map(|w| match Telemetry::decode(w.msg_type, &w.payload) {
            Some(Telemetry::Hall { plugged, .. }) => Some(plugged),
            _ => None,
        })
        .collect();
    assert_eq!(states, [true, false, true]);

    deliver(&mut node, &inbox, &host_cmd(msg::HOLE_STOP, 2, &[]));
    assert!(node.state().hole.is_none());
}

#[test]
fn other_holes_do_not_trigger() {
    let (mut node, inbox) = make_node();
    deliver(&mut node, &inbox, &host_cmd(msg::HOLE_START, 1, &[6, 0]));
    take_radio(&mut node);

    node.hardware_mut().reeds = !(1 << 6) & 0x1F_FFFF;
    node.clock_mut().advance(1_000);
    node.tick(&inbox);
    assert!(take_radio(&mut node).is_empty());
}

// ── Reed streaming ────────────────────────────────────────────

#[test]
fn reed_stream_sends_first_sample_then_changes_only() {
    let (mut node, inbox) = make_node();
    deliver(&mut node, &inbox, &host_cmd(msg::REED_START, 1, &10_000u32.to_le_bytes()));
    assert_eq!(take_parsed(&mut node)[0].payload, 10_000u32.to_le_bytes());

    let mut reeds = Vec::new();
    for bits in [0b0, 0b0, 0b101, 0b101, 0b1] {
        node.hardware_mut().reeds = bits;
        node.clock_mut().advance(10_000);
        node.tick(&inbox);
        for w in take_parsed(&mut node) {
            if let Some(Telemetry::Reed { time_us, plugged }) = Telemetry::decode(w.msg_type, &w.payload) {
                reeds.push((time_us, plugged));
            }
        }
    }
    assert_eq!(reeds, [(10_000, 0b0), (30_000, 0b101), (50_000, 0b1)]);

    deliver(&mut node, &inbox, &host_cmd(msg::REED_STOP, 2, &[]));
    take_radio(&mut node);
    node.hardware_mut().reeds = 0b111;
    node.clock_mut().advance(10_000);
    node.tick(&inbox);
    assert!(take_radio(&mut node).is_empty());
}

// ── Routing ───────────────────────────────────────────────────

#[test]
fn corrupted_checksum_is_nacked_back_to_host() {
    let (mut node, inbox) = make_node();
    let mut cmd = host_cmd(msg::LED_SHOW, 77, &[]);
    cmd[10] ^= 0x01;
    deliver(&mut node, &inbox, &cmd);

    let nack = &take_parsed(&mut node)[0];
    assert_eq!(nack.msg_type, msg::NACK);
    assert_eq!(nack.seq, 77);
    assert_eq!(nack.dst, Address::Host.as_u8());
    assert_eq!(nack.payload, [ErrorCode::BadMsg as u8]);
    assert!(node.hardware().shown.is_empty());
}

#[test]
fn relay_commands_are_unknown_here() {
    let (mut node, inbox) = make_node();
    deliver(&mut node, &inbox, &host_cmd(msg::LIGHT_QUERY, 3, &[]));
    assert_eq!(take_parsed(&mut node)[0].payload, [ErrorCode::BadMsg as u8]);
}

#[test]
fn messages_for_other_nodes_are_dropped() {
    let (mut node, inbox) = make_node();
    deliver(&mut node, &inbox, &command(msg::LIGHT_QUERY, 4, Address::Host, Address::Server, true, &[]));
    assert!(take_radio(&mut node).is_empty());
    assert_eq!(node.state().stats.dropped, 1);
}
