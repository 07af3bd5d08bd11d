//! # RMP Transport Layer
//!
//! 传输层抽象：字节级 I/O、分帧与校验和由具体传输实现负责，
//! 上层只看到已校验的 [`RmpFrame`]。

use std::time::Duration;
use thiserror::Error;

// 重新导出 rmp-protocol 中的 RmpFrame
pub use rmp_protocol::RmpFrame;

pub mod channel;

pub use channel::{ChannelReceiver, ChannelSender, ChannelTransport, DeviceEndpoint};

#[cfg(feature = "mock")]
pub mod sim;

#[cfg(feature = "mock")]
pub use sim::{SimConfig, SimulatedPlatform};

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device Error: {0}")]
    Device(#[from] DeviceError),
    #[error("Transport not configured")]
    NotConfigured,
    #[error("Transport not connected")]
    NotConnected,
    #[error("Transport closed")]
    Closed,
}

/// 设备/后端错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceErrorKind {
    Unknown,
    /// 端点上没有应答的设备
    NotFound,
}

/// 结构化设备错误
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct DeviceError {
    pub kind: DeviceErrorKind,
    pub message: String,
}

impl DeviceError {
    pub fn new(kind: DeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&str> for DeviceError {
    fn from(message: &str) -> Self {
        Self::new(DeviceErrorKind::Unknown, message)
    }
}

/// 帧接收失败分类
///
/// `ChecksumMismatch` 与 `NoData` 可在读循环内恢复，`Other` 为致命错误。
#[derive(Error, Debug)]
pub enum ReceiveError {
    #[error("Checksum mismatch")]
    ChecksumMismatch,
    #[error("No data from device")]
    NoData,
    #[error("Frame retrieval failed: {0}")]
    Other(#[from] TransportError),
}

impl ReceiveError {
    /// 是否可在读循环内恢复
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ReceiveError::ChecksumMismatch | ReceiveError::NoData)
    }
}

/// 接收端
pub trait FrameReceiver {
    /// 阻塞接收一帧
    fn receive(&mut self) -> Result<RmpFrame, ReceiveError>;

    /// 设置接收超时（超时应返回 `ReceiveError::NoData`）
    fn set_receive_timeout(&mut self, _timeout: Duration) {}
}

/// 发送端
pub trait FrameSender {
    fn send(&mut self, frame: RmpFrame) -> Result<(), TransportError>;
}

/// 传输链路
///
/// 连接后分离为独立的接收端和发送端：接收端移入读线程，发送端留在调用线程。
pub trait Transport: Send {
    type Rx: FrameReceiver + Send + 'static;
    type Tx: FrameSender + Send + 'static;

    /// 配置端点与速率（如串口路径与波特率）
    fn configure(&mut self, endpoint: &str, rate: u32) -> Result<(), TransportError>;

    /// 打开链路并分离收发端
    fn connect(self) -> Result<(Self::Rx, Self::Tx), TransportError>;
}
