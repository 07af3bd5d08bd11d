//! Segway RMP SDK
//!
//! Segway RMP 两轮自平衡底盘的主机侧 Rust SDK。
//!
//! # 架构设计
//!
//! 分层结构，从底层到高层：
//!
//! - **协议层** (`protocol`): 帧定义、命令编码、遥测解析、状态快照
//! - **传输层** (`transport`): 链路抽象（`Transport` / `FrameReceiver` / `FrameSender`）
//! - **驱动层** (`driver`): 读循环、状态聚合、单飞分发、命令接口
//!
//! # 快速开始
//!
//! ```rust
//! use segway_rmp::prelude::*;
//!
//! let (transport, _device) = ChannelTransport::new();
//! let rmp = SegwayRmp::new(transport);
//! assert!(matches!(rmp.move_velocity(0.2, 0.0), Err(DriverError::NotConnected)));
//! ```

pub use rmp_driver as driver;
pub use rmp_protocol as protocol;
pub use rmp_transport as transport;

pub mod prelude;

pub use rmp_driver::{
    DriverConfig, DriverError, MetricsSnapshot, ReadLoopState, SegwayRmp, SegwayRmpBuilder,
    StatusHandler,
};
pub use rmp_protocol::{ControllerGainSchedule, OperationalMode, RmpFrame, StatusSnapshot};
pub use rmp_transport::{ReceiveError, Transport, TransportError};

/// 初始化日志
///
/// 安装 `tracing-subscriber` fmt 订阅者，过滤规则取自 `RUST_LOG`，默认 `info`。
/// 重复调用无副作用。
///
/// ```rust
/// segway_rmp::init_logger();
/// segway_rmp::init_logger();
/// ```
pub fn init_logger() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
