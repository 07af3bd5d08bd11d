//! 驱动层模块
//!
//! 本模块提供 Segway RMP 底盘的主机侧驱动功能，包括：
//! - 读循环线程（接收、解析、聚合遥测帧）
//! - 状态同步（ArcSwap 无锁读取 + 更新通知）
//! - 单飞状态分发（回调繁忙时丢弃新快照）
//! - 命令接口（运动、模式、增益表、平衡锁定、积分器复位）
//! - 钩子系统：收发帧回调

mod aggregator;
mod builder;
pub mod config;
pub mod dispatch;
mod error;
pub mod handlers;
pub mod hooks;
pub mod metrics;
pub mod pipeline;
mod rmp;
pub mod state;
pub mod wait;

pub use aggregator::StatusAggregator;
pub use builder::SegwayRmpBuilder;
pub use config::DriverConfig;
pub use dispatch::Dispatcher;
pub use error::{ConfigOperation, DriverError};
pub use handlers::{Handlers, LogStatusHandler, MessageHandler, StatusHandler};
pub use hooks::{FrameCallback, HookManager};
pub use metrics::{MetricsSnapshot, RmpMetrics};
pub use pipeline::{ReadLoop, read_loop};
pub use rmp::SegwayRmp;
pub use state::{AtomicReadLoopState, ReadLoopState, RmpContext};
pub use wait::{StatusReader, wait_for_mode};
