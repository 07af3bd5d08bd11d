//! 仿真驾驶示例
//!
//! 在仿真平台上连接、切换到牵引模式、发送一段速度指令并打印状态。
//!
//! ```bash
//! RUST_LOG=debug cargo run -p segway-rmp --example simulated_drive --features mock
//! ```

use rmp_transport::{SimConfig, SimulatedPlatform};
use segway_rmp::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    segway_rmp::init_logger();

    let (transport, device) = ChannelTransport::new();
    let sim = SimulatedPlatform::spawn(device, SimConfig::default())?;

    let cycles = Arc::new(AtomicU64::new(0));
    let counter = cycles.clone();
    let mut rmp = SegwayRmpBuilder::new()
        .endpoint("sim://rmp200", 460_800)
        .status_handler(move |status: StatusSnapshot| {
            // 每 50 个周期打印一次
            if counter.fetch_add(1, Ordering::Relaxed) % 50 == 0 {
                println!("{}\n", status);
            }
        })
        .build(transport)?;

    rmp.connect(OperationalMode::Tractor, ControllerGainSchedule::Light)?;
    println!("Connected, mode = {:?}", rmp.status().operational_mode);

    // 0.5 m/s 前进 1 秒，然后原地转向 1 秒
    for step in 0..200 {
        let (linear, angular) = if step < 100 { (0.5, 0.0) } else { (0.0, 0.8) };
        rmp.move_velocity(linear, angular)?;
        std::thread::sleep(Duration::from_millis(10));
    }
    rmp.move_velocity(0.0, 0.0)?;

    let status = rmp.status();
    println!(
        "Forward: {:.3} m, turn: {:.3} rad",
        status.integrated_forward_position, status.integrated_turn_position
    );

    rmp.set_operational_mode(OperationalMode::Disabled)?;
    rmp.disconnect()?;

    let metrics = rmp.metrics();
    println!(
        "Cycles: {}, delivered: {}, dropped: {} ({:.1}%), sim cycles: {}",
        metrics.cycles_completed,
        metrics.snapshots_delivered,
        metrics.snapshots_dropped,
        metrics.drop_rate(),
        sim.cycles_emitted()
    );
    Ok(())
}
