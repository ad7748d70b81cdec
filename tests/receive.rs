//! Receive path: non-blocking polling and acceptance filtering.
mod helpers;

use ch32_can::{
    filter::{FrameFormat, EXTENDED_FILTER_ID, STANDARD_FILTER_ID},
    regs::Mode,
    timer::{SpinTimer, TIMEOUT_LIMIT},
    timing::BitTiming,
    Can, Settings,
};
use embedded_hal::can::{ExtendedId, Frame, Id, StandardId};
use helpers::*;

fn driver(format: FrameFormat) -> Can<SimCan, SpinTimer> {
    let mut can = Can::new(SimCan::new(), SpinTimer::new(), TIMEOUT_LIMIT);
    can.init(Settings::new(BitTiming::default(), Mode::Normal, format))
        .unwrap();
    can
}

#[test]
fn empty_fifo_yields_nothing_every_time() {
    let mut can = driver(FrameFormat::Standard);
    for _ in 0..100 {
        assert_eq!(can.pending(), 0);
        assert!(can.try_receive().is_none());
    }
}

#[test]
fn standard_filter_only_surfaces_matching_identifier() {
    let mut can = driver(FrameFormat::Standard);
    let sim = can.peripheral_mut();
    assert!(!sim.deliver(WireFrame::standard(0x320, &[1])));
    assert!(sim.deliver(WireFrame::standard(STANDARD_FILTER_ID, &[2, 3])));
    assert!(!sim.deliver(WireFrame::standard(0x316, &[4])));
    assert!(!sim.deliver(WireFrame::extended(u32::from(STANDARD_FILTER_ID), &[5])));
    assert!(sim.deliver(WireFrame::standard(STANDARD_FILTER_ID, &[6])));

    let mut received = Vec::new();
    while let Some(frame) = can.try_receive() {
        received.push(frame);
    }

    assert_eq!(received.len(), 2);
    for frame in &received {
        assert_eq!(
            frame.id(),
            Id::Standard(StandardId::new(STANDARD_FILTER_ID).unwrap())
        );
    }
    assert_eq!(received[0].data(), &[2, 3]);
    assert_eq!(received[1].data(), &[6]);
}

#[test]
fn extended_filter_surfaces_full_identifier() {
    let mut can = driver(FrameFormat::Extended);
    let sim = can.peripheral_mut();
    assert!(!sim.deliver(WireFrame::standard(STANDARD_FILTER_ID, &[1])));
    assert!(!sim.deliver(WireFrame::extended(EXTENDED_FILTER_ID + 1, &[2])));
    assert!(sim.deliver(WireFrame::extended(EXTENDED_FILTER_ID, &[3, 4, 5])));

    let frame = can.try_receive().unwrap();
    assert!(frame.is_extended());
    assert_eq!(
        frame.id(),
        Id::Extended(ExtendedId::new(EXTENDED_FILTER_ID).unwrap())
    );
    assert_eq!(frame.data(), &[3, 4, 5]);
    assert!(can.try_receive().is_none());
}

#[test]
fn one_frame_per_call() {
    let mut can = driver(FrameFormat::Standard);
    for n in 0..3u8 {
        can.peripheral_mut()
            .deliver(WireFrame::standard(STANDARD_FILTER_ID, &[n]));
    }
    assert_eq!(can.pending(), 3);

    assert_eq!(can.try_receive().unwrap().data(), &[0]);
    assert_eq!(can.pending(), 2);
    assert_eq!(can.try_receive().unwrap().data(), &[1]);
    assert_eq!(can.try_receive().unwrap().data(), &[2]);
    assert_eq!(can.pending(), 0);
    assert!(can.try_receive().is_none());
}

#[test]
fn hardware_fifo_bounds_backlog() {
    let mut can = driver(FrameFormat::Standard);
    for n in 0..5u8 {
        can.peripheral_mut()
            .deliver(WireFrame::standard(STANDARD_FILTER_ID, &[n]));
    }
    assert_eq!(can.peripheral().overruns, 2);
    assert_eq!(can.pending(), 3);
}

#[test]
fn oversized_length_code_is_clamped() {
    let mut can = driver(FrameFormat::Standard);
    let mut frame = WireFrame::standard(STANDARD_FILTER_ID, &[1, 2, 3, 4, 5, 6, 7, 8]);
    frame.dlc = 12;
    can.peripheral_mut().deliver(frame);

    let frame = can.try_receive().unwrap();
    assert_eq!(frame.dlc(), 8);
    assert_eq!(frame.data(), &[1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn nothing_arrives_before_init() {
    let mut sim = SimCan::new();
    assert!(!sim.deliver(WireFrame::standard(STANDARD_FILTER_ID, &[1])));
    let mut can = Can::new(sim, SpinTimer::new(), TIMEOUT_LIMIT);
    assert!(can.try_receive().is_none());
}
