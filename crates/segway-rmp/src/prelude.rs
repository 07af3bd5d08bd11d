//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use segway_rmp::prelude::*;
//! ```

// 驱动层
pub use crate::driver::{DriverConfig, SegwayRmp, SegwayRmpBuilder, StatusHandler};
pub use crate::driver::{FrameCallback, ReadLoopState};

// 协议层
pub use crate::protocol::{ControllerGainSchedule, OperationalMode, RmpFrame, StatusSnapshot};

// 传输层（常用 Trait 与进程内链路）
pub use crate::transport::{ChannelTransport, DeviceEndpoint, Transport};

// 错误类型
pub use crate::driver::DriverError;
pub use crate::protocol::ProtocolError;
pub use crate::transport::{ReceiveError, TransportError};
