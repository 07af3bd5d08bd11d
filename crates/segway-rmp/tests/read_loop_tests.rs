//! 读循环集成测试
//!
//! 通过进程内链路注入帧与接收错误，验证读循环的容错、终止与单飞分发行为。

use parking_lot::Mutex;
use rmp_transport::{ChannelTransport, DeviceEndpoint, ReceiveError, Transport, TransportError};
use segway_rmp::driver::{DriverConfig, ReadLoop, ReadLoopState, RmpContext};
use segway_rmp::protocol::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        std::thread::sleep(Duration::from_millis(1));
    }
}

fn config() -> DriverConfig {
    DriverConfig {
        receive_timeout_ms: 10,
        ..Default::default()
    }
}

struct Harness {
    read_loop: ReadLoop,
    device: DeviceEndpoint,
    ctx: Arc<RmpContext>,
    errors: Arc<Mutex<Vec<String>>>,
}

fn start(ctx: RmpContext) -> Harness {
    let (transport, device) = ChannelTransport::new();
    let (rx, _tx) = transport.connect().unwrap();
    let errors = Arc::new(Mutex::new(Vec::new()));
    {
        let errors = errors.clone();
        ctx.update_handlers(move |handlers| {
            handlers.error = Arc::new(move |msg: &str| errors.lock().push(msg.to_string()));
        });
    }
    let ctx = Arc::new(ctx);
    let read_loop = ReadLoop::start(rx, ctx.clone(), config()).unwrap();
    Harness {
        read_loop,
        device,
        ctx,
        errors,
    }
}

fn cycle(pitch: i16) -> Vec<RmpFrame> {
    vec![
        RmpFrame::new(ID_COMMAND_REQUEST, &[]),
        PitchRollFeedback {
            pitch,
            ..Default::default()
        }
        .to_frame(),
        WheelSpeedFeedback::default().to_frame(),
        WheelPositionFeedback::default().to_frame(),
        DisplacementFeedback::default().to_frame(),
        MotorTorqueFeedback::default().to_frame(),
        ModeBatteryFeedback::default().to_frame(),
        CommandEchoFeedback::default().to_frame(),
    ]
}

#[test]
fn survives_checksum_mismatch_and_no_data() {
    let mut h = start(RmpContext::new());

    h.device.push_error(ReceiveError::ChecksumMismatch).unwrap();
    h.device.push_error(ReceiveError::NoData).unwrap();
    h.device
        .push_frame(
            PitchRollFeedback {
                pitch: 78,
                ..Default::default()
            }
            .to_frame(),
        )
        .unwrap();

    wait_until("valid frame", || h.ctx.snapshot().touched);
    let status = h.ctx.snapshot();
    assert!((status.pitch - 10.0).abs() < 1e-9);
    assert!(h.read_loop.is_running());

    let errors = h.errors.lock().clone();
    let checksum = errors.iter().position(|m| m == "Checksum mismatch...");
    let no_data = errors.iter().position(|m| m == "No data from Segway...");
    assert!(checksum.is_some() && no_data.is_some());
    assert!(checksum < no_data);

    h.read_loop.stop().unwrap();
    assert_eq!(h.read_loop.state(), ReadLoopState::Stopped);
}

#[test]
fn other_failure_terminates_after_that_frame() {
    let h = start(RmpContext::new());

    h.device
        .push_frame(MotorStatusFeedback { status_byte: 0x80 }.to_frame())
        .unwrap();
    h.device
        .push_error(ReceiveError::Other(TransportError::from(
            rmp_transport::DeviceError::from("cable unplugged"),
        )))
        .unwrap();
    h.device.push_frames(cycle(78)).unwrap();

    wait_until("fatal error", || !h.read_loop.is_running());
    assert_eq!(h.read_loop.state(), ReadLoopState::Faulted);

    std::thread::sleep(Duration::from_millis(30));
    let metrics = h.ctx.metrics.snapshot();
    assert_eq!(metrics.frames_received, 1);
    assert_eq!(metrics.fatal_errors, 1);
    assert_eq!(metrics.cycles_completed, 0);
    assert_eq!(h.ctx.snapshot().pitch, 0.0);
    assert!(
        h.errors
            .lock()
            .iter()
            .any(|m| m.contains("cable unplugged"))
    );
}

#[test]
fn busy_handler_drops_cycle_with_single_warning() {
    let (release_tx, release_rx) = crossbeam_channel::unbounded::<()>();
    let (seen_tx, seen_rx) = crossbeam_channel::unbounded::<StatusSnapshot>();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let overlap = Arc::new(AtomicUsize::new(0));

    let ctx = RmpContext::new();
    {
        let in_flight = in_flight.clone();
        let overlap = overlap.clone();
        ctx.update_handlers(move |handlers| {
            handlers.status = Arc::new(move |status: StatusSnapshot| {
                if in_flight.fetch_add(1, Ordering::SeqCst) != 0 {
                    overlap.fetch_add(1, Ordering::SeqCst);
                }
                let _ = seen_tx.send(status);
                let _ = release_rx.recv();
                in_flight.fetch_sub(1, Ordering::SeqCst);
            });
        });
    }
    let h = start(ctx);

    // 第一个周期：回调进入并阻塞
    h.device.push_frames(cycle(78)).unwrap();
    let first = seen_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!((first.pitch - 10.0).abs() < 1e-9);

    // 第二个周期在回调返回前完成：被丢弃
    h.device.push_frames(cycle(156)).unwrap();
    wait_until("second cycle", || {
        h.ctx.metrics.snapshot().cycles_completed == 2
    });

    let dropped: Vec<String> = h
        .errors
        .lock()
        .iter()
        .filter(|m| m.contains("dropped"))
        .cloned()
        .collect();
    assert_eq!(dropped.len(), 1);
    assert_eq!(h.ctx.metrics.snapshot().snapshots_dropped, 1);

    // 释放后下一个周期正常交付
    release_tx.send(()).unwrap();
    wait_until("handler idle", || in_flight.load(Ordering::SeqCst) == 0);
    h.device.push_frames(cycle(234)).unwrap();
    let third = seen_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!((third.pitch - 30.0).abs() < 1e-9);
    release_tx.send(()).unwrap();

    assert!(seen_rx.try_recv().is_err());
    assert_eq!(overlap.load(Ordering::SeqCst), 0);
}

#[test]
fn hooks_see_every_received_frame() {
    struct Tap(crossbeam_channel::Sender<RmpFrame>);

    impl segway_rmp::driver::FrameCallback for Tap {
        fn on_frame_received(&self, frame: &RmpFrame) {
            let _ = self.0.try_send(*frame);
        }
    }

    let (tap_tx, tap_rx) = crossbeam_channel::bounded(64);
    let ctx = RmpContext::new();
    ctx.hooks.write().add_callback(Arc::new(Tap(tap_tx)));
    let h = start(ctx);

    let frames = [
        RmpFrame::on_channel(ID_PITCH_ROLL, CHANNEL_B, &[1, 2]),
        RmpFrame::new(0x0123, &[]),
        MotorStatusFeedback { status_byte: 0 }.to_frame(),
    ];
    h.device.push_frames(frames).unwrap();

    for expected in frames {
        let frame = tap_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(
            (frame.id, frame.channel, frame.data),
            (expected.id, expected.channel, expected.data)
        );
        assert!(frame.timestamp_us > 0, "frame not stamped on receive");
    }
    wait_until("frames counted", || {
        h.ctx.metrics.snapshot().frames_received == 3
    });
    assert_eq!(h.ctx.metrics.snapshot().frames_ignored, 2);
}
