//! Passive sniffing and command delivery through the facade.

use estia_serial::estia_frame::{
    Ack, Frame, FrameKind, Message, Mode, ModeSwitch, DATA_TYPE_MODE_CHANGE,
    DATA_TYPE_OPERATION_SWITCH,
};
use estia_serial::sim::{ManualClock, SimTransport};
use estia_serial::{Clock, EstiaConfig, EstiaSerial, SniffState};

const STATUS_LONG: [u8; 31] = [
    0xa0, 0x00, 0x58, 0x19, 0x08, 0x00, 0x00, 0xfe, 0x00, 0x03, 0xc6, 0xc1, 0x04, 0x12, 0x84, 0x66,
    0x5c, 0x84, 0x66, 0x5c, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x31, 0x58,
];
const STATUS_SHORT: [u8; 21] = [
    0xa0, 0x00, 0x1c, 0x0f, 0x08, 0x00, 0x00, 0xfe, 0x00, 0x00, 0x2b, 0xc2, 0x20, 0x0c, 0x84, 0x66,
    0x5c, 0x12, 0x00, 0x6b, 0xb8,
];
const HEARTBEAT: [u8; 13] = [
    0xa0, 0x00, 0x10, 0x07, 0x08, 0x00, 0x00, 0xfe, 0x00, 0x00, 0x8a, 0xcf, 0xf7,
];

type Engine = EstiaSerial<SimTransport, ManualClock>;

fn setup() -> (Engine, SimTransport, ManualClock) {
    let sim = SimTransport::new();
    let clock = ManualClock::new(0);
    let estia = EstiaSerial::new(sim.clone(), clock.clone(), EstiaConfig::default());
    (estia, sim, clock)
}

/// Run sniff ticks 10 ms apart for `ms`, collecting completed frames.
fn run_for(estia: &mut Engine, clock: &ManualClock, ms: u64) -> Vec<Frame> {
    let end = clock.now_ms() + ms;
    let mut frames = Vec::new();
    while clock.now_ms() < end {
        if estia.sniff() == SniffState::FramePending {
            frames.extend(std::iter::from_fn(|| estia.next_frame()));
        }
        clock.advance(10);
    }
    frames
}

#[test]
fn test_back_to_back_frames_are_separated() {
    let (mut estia, sim, clock) = setup();
    let mut stream = HEARTBEAT.to_vec();
    stream.extend_from_slice(&STATUS_SHORT);
    stream.extend_from_slice(&HEARTBEAT);
    sim.inject(&stream);

    let frames = run_for(&mut estia, &clock, 1_000);
    let kinds: Vec<_> = frames.iter().map(Frame::kind).collect();
    assert_eq!(
        kinds,
        vec![
            Some(FrameKind::Heartbeat),
            Some(FrameKind::StatusUpdate),
            Some(FrameKind::Heartbeat)
        ]
    );

    let (status, fresh) = estia.take_status();
    assert!(fresh);
    assert!(status.hot_water);
    assert!(status.defrost_in_progress);
    assert!(!status.extended_data);
}

#[test]
fn test_bytes_arriving_across_ticks() {
    let (mut estia, sim, clock) = setup();
    let mut frames = Vec::new();
    for chunk in STATUS_LONG.chunks(4) {
        sim.inject(chunk);
        frames.extend(run_for(&mut estia, &clock, 20));
    }
    frames.extend(run_for(&mut estia, &clock, 500));

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].as_bytes(), &STATUS_LONG);
    assert!(estia.status().0.heating);
}

#[test]
fn test_garbage_does_not_disturb_following_frames() {
    let (mut estia, sim, clock) = setup();
    let mut stream = vec![0xa0, 0x00, 0x58, 0x19, 0x01, 0x02];
    stream.extend_from_slice(&STATUS_LONG);
    sim.inject(&stream);

    let frames = run_for(&mut estia, &clock, 1_000);
    let decoded: Vec<_> = frames.iter().map(|f| Message::decode(f.as_bytes())).collect();
    assert_eq!(decoded.len(), 2);
    assert!(decoded[0].is_err());
    assert!(matches!(decoded[1], Ok(Message::Status(_))));
    assert!(estia.take_status().1);
}

#[test]
fn test_truncated_frame_does_not_swallow_ack() {
    let (mut estia, sim, clock) = setup();
    // The ack ends well inside the length the cut status declares
    let mut stream = STATUS_LONG[..10].to_vec();
    stream.extend(Ack::new(DATA_TYPE_MODE_CHANGE).encode().into_bytes());
    sim.inject(&stream);

    let frames = run_for(&mut estia, &clock, 1_000);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].as_bytes(), &STATUS_LONG[..10]);
    assert_eq!(frames[1].kind(), Some(FrameKind::Ack));
    assert_eq!(estia.take_ack(), Some(DATA_TYPE_MODE_CHANGE));
    assert!(!estia.take_status().1);
}

#[test]
fn test_command_waits_for_quiet_line() {
    let (mut estia, sim, clock) = setup();
    sim.inject(&HEARTBEAT);
    estia.switch_mode(Mode::Night, true);

    // Bytes on the line hold the command back
    assert_ne!(estia.sniff(), SniffState::Idle);
    assert!(sim.writes().is_empty());

    run_for(&mut estia, &clock, 500);
    assert_eq!(sim.writes(), vec![ModeSwitch::new(Mode::Night, true).encode().into_bytes()]);
}

#[test]
fn test_unacknowledged_command_dropped_after_three_sends() {
    let (mut estia, sim, clock) = setup();
    estia.set_mode("auto", true);

    run_for(&mut estia, &clock, 10_000);
    assert_eq!(sim.writes().len(), 3);
    assert_eq!(estia.pending_commands(), 0);
}

#[test]
fn test_mismatched_ack_is_published_but_keeps_command() {
    let (mut estia, sim, clock) = setup();
    sim.set_responder(|_| Some(Ack::new(DATA_TYPE_OPERATION_SWITCH).encode().into_bytes()));
    estia.set_mode("auto", true);

    run_for(&mut estia, &clock, 500);
    assert_eq!(estia.take_ack(), Some(DATA_TYPE_OPERATION_SWITCH));
    assert_eq!(estia.pending_commands(), 1);

    sim.set_responder(|_| Some(Ack::new(DATA_TYPE_MODE_CHANGE).encode().into_bytes()));
    run_for(&mut estia, &clock, 2_000);
    assert_eq!(estia.take_ack(), Some(DATA_TYPE_MODE_CHANGE));
    assert_eq!(estia.pending_commands(), 0);
}

#[test]
fn test_commands_are_sent_in_order() {
    let (mut estia, sim, clock) = setup();
    sim.set_responder(|frame| {
        let data_type = Frame::from_bytes(frame.to_vec()).data_type()?;
        Some(Ack::new(data_type).encode().into_bytes())
    });
    estia.set_mode("heating", true);
    estia.set_mode("quiet", false);
    estia.force_defrost(true);

    run_for(&mut estia, &clock, 3_000);
    let kinds: Vec<_> = sim
        .writes()
        .iter()
        .map(|w| Frame::from_bytes(w.clone()).kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            Some(FrameKind::Switch),
            Some(FrameKind::SetMode),
            Some(FrameKind::ForcedDefrost)
        ]
    );
    assert_eq!(estia.pending_commands(), 0);
}
