//! Relay node end to end: host frames in over serial, replies and
//! telemetry out over serial, radio traffic relayed both ways.

use apparatus::app::commands::{ForceSensor, Magnet, MotorDirection};
use apparatus::app::events::Telemetry;
use apparatus::config::NodeConfig;
use apparatus::inbound::InboundQueue;
use apparatus::link::Links;
use apparatus::node::ServerNode;
use apparatus::protocol::{Address, ErrorCode, msg};

use crate::mock_hw::{
    MockClock, MockRadio, MockSerial, MockServerHw, ServerCall, ServerLinks, Wire, command, frame, unframe,
};

type Node = ServerNode<MockServerHw, ServerLinks, MockClock>;

fn make_node() -> (Node, InboundQueue<8>) {
    let links = Links::new(MockSerial::default(), MockRadio::default());
    let node = ServerNode::new(NodeConfig::default(), MockServerHw::new(), links, MockClock::at(0));
    (node, InboundQueue::new())
}

/// Queue a host command on the serial line.
fn host_sends(node: &mut Node, message: &[u8]) {
    node.links_mut().serial.incoming.extend(frame(message));
}

/// Everything the relay wrote to the host since the last call.
fn take_serial(node: &mut Node) -> Vec<Wire> {
    let bytes = std::mem::take(&mut node.links_mut().serial.written);
    unframe(&bytes)
}

fn host_cmd(msg_type: u8, seq: u32, payload: &[u8]) -> Vec<u8> {
    command(msg_type, seq, Address::Host, Address::Server, true, payload)
}

// ── Force streaming ───────────────────────────────────────────

#[test]
fn force_start_acks_then_streams_every_period() {
    let (mut node, inbox) = make_node();
    node.hardware_mut().force_white = -42;

    let mut payload = 10_000u32.to_le_bytes().to_vec();
    payload.push(0); // white
    host_sends(&mut node, &host_cmd(msg::FORCE_START, 7, &payload));
    node.tick(&inbox);

    let replies = take_serial(&mut node);
    assert_eq!(replies.len(), 1);
    let ack = &replies[0];
    assert_eq!(ack.msg_type, msg::ACK);
    assert_eq!(ack.seq, 7);
    assert_eq!((ack.src, ack.dst), (Address::Server.as_u8(), Address::Host.as_u8()));
    assert_eq!(ack.flags, 0);
    assert_eq!(ack.payload, payload);
    assert!(ack.checksum_ok);

    let mut samples = Vec::new();
    for _ in 0..3 {
        node.clock_mut().advance(10_000);
        node.tick(&inbox);
        samples.extend(take_serial(&mut node));
    }

    assert_eq!(samples.len(), 3);
    for (i, s) in samples.iter().enumerate() {
        assert_eq!(s.msg_type, msg::DATA_FORCE);
        assert_eq!(s.dst, Address::Host.as_u8());
        assert_eq!(
            Telemetry::decode(s.msg_type, &s.payload),
            Some(Telemetry::Force {
                time_us: 10_000 * (i as u32 + 1),
                value: -42,
                sensor: ForceSensor::White,
            })
        );
    }
    // Telemetry carries its own increasing sequence numbers.
    assert!(samples.windows(2).all(|w| w[1].seq > w[0].seq));

    host_sends(&mut node, &host_cmd(msg::FORCE_STOP, 8, &[]));
    node.tick(&inbox);
    assert_eq!(take_serial(&mut node)[0].msg_type, msg::ACK);

    node.clock_mut().advance(50_000);
    node.tick(&inbox);
    assert!(take_serial(&mut node).is_empty(), "no samples after FORCE_STOP");
}

#[test]
fn force_both_emits_white_then_blue() {
    let (mut node, inbox) = make_node();
    node.hardware_mut().force_white = 1;
    node.hardware_mut().force_blue = 2;

    let mut payload = 5_000u32.to_le_bytes().to_vec();
    payload.push(2);
    host_sends(&mut node, &host_cmd(msg::FORCE_START, 1, &payload));
    node.tick(&inbox);
    take_serial(&mut node);

    node.clock_mut().advance(5_000);
    node.tick(&inbox);
    let sensors: Vec<_> = take_serial(&mut node)
        .iter()
        .filter_map(|w| match Telemetry::decode(w.msg_type, &w.payload) {
            Some(Telemetry::Force { sensor, .. }) => Some(sensor),
            _ => None,
        })
        .collect();
    assert_eq!(sensors, [ForceSensor::White, ForceSensor::Blue]);
}

#[test]
fn short_force_period_is_raised_to_the_minimum() {
    let (mut node, inbox) = make_node();
    let mut payload = 10u32.to_le_bytes().to_vec();
    payload.push(1);
    host_sends(&mut node, &host_cmd(msg::FORCE_START, 3, &payload));
    node.tick(&inbox);

    let ack = &take_serial(&mut node)[0];
    let min = NodeConfig::default().min_force_period_us;
    assert_eq!(ack.payload[..4], min.to_le_bytes());
}

#[test]
fn stalled_loop_catches_up_a_bounded_burst() {
    let (mut node, inbox) = make_node();
    let mut payload = 1_000u32.to_le_bytes().to_vec();
    payload.push(0);
    host_sends(&mut node, &host_cmd(msg::FORCE_START, 1, &payload));
    node.tick(&inbox);
    take_serial(&mut node);

    node.clock_mut().advance(100_000);
    node.tick(&inbox);
    let burst = take_serial(&mut node).len();
    assert_eq!(burst, NodeConfig::default().max_catch_up as usize);

    // Re-anchored: the next sample is one period out.
    node.clock_mut().advance(999);
    node.tick(&inbox);
    assert!(take_serial(&mut node).is_empty());
    node.clock_mut().advance(1);
    node.tick(&inbox);
    assert_eq!(take_serial(&mut node).len(), 1);
}

#[test]
fn catch_up_samples_carry_their_scheduled_times() {
    let (mut node, inbox) = make_node();
    let mut payload = 1_000u32.to_le_bytes().to_vec();
    payload.push(0);
    host_sends(&mut node, &host_cmd(msg::FORCE_START, 1, &payload));
    node.tick(&inbox);
    take_serial(&mut node);

    node.clock_mut().advance(3_500);
    node.tick(&inbox);
    let times: Vec<u32> = take_serial(&mut node)
        .iter()
        .map(|s| match Telemetry::decode(s.msg_type, &s.payload) {
            Some(Telemetry::Force { time_us, .. }) => time_us,
            other => panic!("unexpected telemetry {other:?}"),
        })
        .collect();
    assert_eq!(times, [1_000, 2_000, 3_000]);
}

#[test]
fn force_period_beyond_due_check_range_is_rejected() {
    let (mut node, inbox) = make_node();
    let mut payload = 0xFFFF_0000u32.to_le_bytes().to_vec();
    payload.push(0);
    host_sends(&mut node, &host_cmd(msg::FORCE_START, 9, &payload));
    node.tick(&inbox);
    expect_nack(&mut node, 9, ErrorCode::BadPayload);

    for _ in 0..10 {
        node.clock_mut().advance(1_000);
        node.tick(&inbox);
    }
    let samples = take_serial(&mut node);
    assert!(samples.iter().all(|s| s.msg_type != msg::DATA_FORCE));
    assert_eq!(node.state().stats.telemetry, 0);
}

#[test]
fn streaming_survives_clock_wrap() {
    let (mut node, inbox) = make_node();
    node.clock_mut().now = u32::MAX - 15_000;

    let mut payload = 10_000u32.to_le_bytes().to_vec();
    payload.push(0);
    host_sends(&mut node, &host_cmd(msg::FORCE_START, 1, &payload));
    node.tick(&inbox);
    take_serial(&mut node);

    let mut count = 0;
    for _ in 0..40 {
        node.clock_mut().advance(1_000);
        node.tick(&inbox);
        count += take_serial(&mut node).len();
    }
    assert_eq!(count, 4);
}

// ── Motor ─────────────────────────────────────────────────────

#[test]
fn motor_requests_apply_once_last_wins() {
    let (mut node, inbox) = make_node();

    let mut first = vec![0];
    first.extend(500u32.to_le_bytes());
    let mut second = vec![1];
    second.extend(250u32.to_le_bytes());
    host_sends(&mut node, &host_cmd(msg::MOTOR_START, 1, &first));
    host_sends(&mut node, &host_cmd(msg::MOTOR_START, 2, &second));
    node.tick(&inbox);

    assert_eq!(
        node.hardware().motor_calls(),
        [&ServerCall::StartMotor { direction: MotorDirection::Reverse, step_interval_us: 250 }]
    );
    let acks = take_serial(&mut node);
    assert_eq!(acks.iter().map(|w| w.seq).collect::<Vec<_>>(), [1, 2]);
    assert_eq!(acks[1].payload, second);

    node.tick(&inbox);
    assert_eq!(node.hardware().motor_calls().len(), 1, "pending action consumed");

    host_sends(&mut node, &host_cmd(msg::MOTOR_STOP, 3, &[]));
    node.tick(&inbox);
    assert_eq!(node.hardware().calls.last(), Some(&ServerCall::StopMotor));
}

#[test]
fn motor_interval_is_clamped_and_echoed() {
    let (mut node, inbox) = make_node();
    let mut payload = vec![0];
    payload.extend(1u32.to_le_bytes());
    host_sends(&mut node, &host_cmd(msg::MOTOR_START, 9, &payload));
    node.tick(&inbox);

    let min = NodeConfig::default().min_step_interval_us;
    let ack = &take_serial(&mut node)[0];
    assert_eq!(ack.payload[0], 0);
    assert_eq!(ack.payload[1..], min.to_le_bytes());
    assert_eq!(
        node.hardware().calls,
        [ServerCall::StartMotor { direction: MotorDirection::Forward, step_interval_us: min }]
    );
}

// ── Immediate commands ────────────────────────────────────────

#[test]
fn magnet_and_light_act_immediately() {
    let (mut node, inbox) = make_node();
    node.hardware_mut().light = 0x0321;

    host_sends(&mut node, &host_cmd(msg::MAGNET_SET, 1, &[1, 1]));
    host_sends(&mut node, &host_cmd(msg::LIGHT_QUERY, 2, &[]));
    node.tick(&inbox);

    assert_eq!(
        node.hardware().calls,
        [ServerCall::SetMagnet { magnet: Magnet::Blue, on: true }, ServerCall::ReadLight]
    );
    let replies = take_serial(&mut node);
    assert_eq!(replies[0].payload, [1, 1]);
    assert_eq!(replies[1].payload, [0x21, 0x03]);
}

#[test]
fn no_reply_without_ack_flag() {
    let (mut node, inbox) = make_node();
    let m = command(msg::MAGNET_SET, 4, Address::Host, Address::Server, false, &[0, 1]);
    host_sends(&mut node, &m);
    node.tick(&inbox);

    assert_eq!(node.hardware().calls, [ServerCall::SetMagnet { magnet: Magnet::White, on: true }]);
    assert!(take_serial(&mut node).is_empty());
}

// ── Rejections ────────────────────────────────────────────────

fn expect_nack(node: &mut Node, seq: u32, code: ErrorCode) {
    let replies = take_serial(node);
    assert_eq!(replies.len(), 1, "exactly one reply");
    assert_eq!(replies[0].msg_type, msg::NACK);
    assert_eq!(replies[0].seq, seq);
    assert_eq!(replies[0].payload, [code as u8]);
}

#[test]
fn length_mismatch_is_bad_len() {
    let (mut node, inbox) = make_node();
    let mut m = host_cmd(msg::MAGNET_SET, 11, &[0, 1]);
    m[5] = 3; // claims one more payload byte than present
    host_sends(&mut node, &m);
    node.tick(&inbox);

    expect_nack(&mut node, 11, ErrorCode::BadLen);
    assert!(node.hardware().calls.is_empty());
}

#[test]
fn corrupted_checksum_is_bad_msg() {
    let (mut node, inbox) = make_node();
    let mut m = host_cmd(msg::MAGNET_SET, 12, &[0, 1]);
    m[10] ^= 0xFF;
    host_sends(&mut node, &m);
    node.tick(&inbox);

    expect_nack(&mut node, 12, ErrorCode::BadMsg);
    assert!(node.hardware().calls.is_empty());
}

#[test]
fn unknown_type_is_bad_msg_and_bad_shape_is_bad_payload() {
    let (mut node, inbox) = make_node();
    host_sends(&mut node, &host_cmd(0x7E, 13, &[]));
    node.tick(&inbox);
    expect_nack(&mut node, 13, ErrorCode::BadMsg);

    host_sends(&mut node, &host_cmd(msg::MAGNET_SET, 14, &[0]));
    node.tick(&inbox);
    expect_nack(&mut node, 14, ErrorCode::BadPayload);

    host_sends(&mut node, &host_cmd(msg::FORCE_START, 15, &[0, 0, 0, 0, 0]));
    node.tick(&inbox);
    expect_nack(&mut node, 15, ErrorCode::BadPayload);
}

#[test]
fn corrupt_frames_are_dropped_and_the_stream_resyncs() {
    let (mut node, inbox) = make_node();
    node.links_mut().serial.incoming.extend([0x05, 0x11, 0x00]);
    host_sends(&mut node, &host_cmd(msg::LIGHT_QUERY, 20, &[]));
    node.tick(&inbox);

    assert_eq!(node.serial_frames_dropped(), 1);
    let replies = take_serial(&mut node);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].seq, 20);
}

// ── Relay ─────────────────────────────────────────────────────

#[test]
fn host_to_client_is_forwarded_unopened() {
    let (mut node, inbox) = make_node();
    let m = command(msg::LED_SHOW, 30, Address::Host, Address::Client, true, &[]);
    host_sends(&mut node, &m);
    node.tick(&inbox);

    assert_eq!(node.links().radio.sent, [m]);
    assert!(take_serial(&mut node).is_empty());
    assert_eq!(node.state().stats.forwarded, 1);
}

#[test]
fn client_bound_message_over_radio_mtu_is_dropped() {
    let (mut node, inbox) = make_node();
    // 11-byte header + 240-byte payload: one byte over the radio bound.
    let m = command(msg::LED_SET_N, 40, Address::Host, Address::Client, true, &[0u8; 240]);
    assert_eq!(m.len(), 251);
    host_sends(&mut node, &m);
    node.tick(&inbox);

    assert!(node.links().radio.sent.is_empty());
    assert!(take_serial(&mut node).is_empty());
    let stats = node.state().stats;
    assert_eq!(stats.send_failures, 1);
    assert_eq!(stats.forwarded, 0);

    // Exactly at the bound still goes out.
    let m = command(msg::LED_SET_N, 41, Address::Host, Address::Client, true, &[0u8; 239]);
    host_sends(&mut node, &m);
    node.tick(&inbox);
    assert_eq!(node.links().radio.sent, [m]);
    assert_eq!(node.state().stats.forwarded, 1);
}

#[test]
fn client_to_host_is_framed_onto_serial() {
    let (mut node, inbox) = make_node();
    let reply = command(msg::ACK, 30, Address::Client, Address::Host, false, &[]);
    assert!(inbox.push(&reply));
    node.tick(&inbox);

    let out = take_serial(&mut node);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].seq, 30);
    assert_eq!(out[0].src, Address::Client.as_u8());
    assert!(node.links().radio.sent.is_empty());
}

#[test]
fn forwarded_messages_are_not_checksum_checked() {
    let (mut node, inbox) = make_node();
    let mut m = command(msg::LED_SHOW, 31, Address::Host, Address::Client, true, &[]);
    m[10] ^= 0x55;
    host_sends(&mut node, &m);
    node.tick(&inbox);

    assert_eq!(node.links().radio.sent, [m]);
    assert!(take_serial(&mut node).is_empty());
}

#[test]
fn radio_message_back_to_radio_is_dropped() {
    let (mut node, inbox) = make_node();
    let m = command(msg::LED_SHOW, 32, Address::Host, Address::Client, false, &[]);
    assert!(inbox.push(&m));
    node.tick(&inbox);

    assert!(node.links().radio.sent.is_empty());
    assert_eq!(node.state().stats.dropped, 1);
}
