//! 驱动层错误类型定义

use rmp_transport::{ReceiveError, TransportError};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// 配置类操作（用于错误上下文）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigOperation {
    OperationalMode,
    ControllerGainSchedule,
    BalanceModeLock,
    Integrators,
}

impl ConfigOperation {
    /// 面向用户的操作名称
    pub fn name(self) -> &'static str {
        match self {
            ConfigOperation::OperationalMode => "Operational Mode",
            ConfigOperation::ControllerGainSchedule => "Controller Gain Schedule",
            ConfigOperation::BalanceModeLock => "Balance Mode Lock",
            ConfigOperation::Integrators => "Integrators",
        }
    }
}

impl fmt::Display for ConfigOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 需要连接的操作在 `connect()` 之前被调用
    #[error("Not connected")]
    NotConnected,

    /// 重复连接
    #[error("Already connected")]
    AlreadyConnected,

    /// 配置帧发送失败
    #[error("Error configuring {operation}: {source}")]
    ConfigurationFailed {
        operation: ConfigOperation,
        #[source]
        source: TransportError,
    },

    /// 运动帧发送失败
    #[error("Move failed: {source}")]
    MotionFailed {
        #[source]
        source: TransportError,
    },

    /// 设备未在期限内确认配置
    #[error("Error configuring {operation}: not confirmed within {waited:?}")]
    ConfirmationTimeout {
        operation: ConfigOperation,
        waited: Duration,
    },

    /// 读循环已停止（确认等待被取消）
    #[error("Read loop stopped")]
    ReadLoopStopped,

    /// 帧接收致命失败（读循环因此退出）
    #[error("Frame retrieval failed: {0}")]
    FrameRetrieval(#[from] ReceiveError),

    /// 读循环线程未在期限内退出（仍阻塞在接收调用中）
    #[error("Read loop did not exit within {waited:?}")]
    JoinTimeout { waited: Duration },

    /// 传输层错误（连接阶段）
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// 在读循环线程内部调用 `stop()`
    #[error("Read loop cannot be stopped from its own thread")]
    SelfJoin,

    /// 线程创建失败
    #[error("Failed to spawn thread: {0}")]
    ThreadSpawn(String),
}

impl DriverError {
    /// 包装配置操作的发送错误
    pub fn configuration(operation: ConfigOperation, source: TransportError) -> Self {
        DriverError::ConfigurationFailed { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::configuration(ConfigOperation::OperationalMode, TransportError::Closed);
        let msg = err.to_string();
        assert!(msg.contains("Operational Mode"), "{}", msg);
        assert!(err.source().is_some());

        let err = DriverError::MotionFailed {
            source: TransportError::NotConnected,
        };
        assert!(err.to_string().starts_with("Move failed"));

        let err = DriverError::ConfirmationTimeout {
            operation: ConfigOperation::OperationalMode,
            waited: Duration::from_millis(50),
        };
        assert!(err.to_string().contains("50ms"));

        assert_eq!(DriverError::NotConnected.to_string(), "Not connected");

        let err = DriverError::JoinTimeout {
            waited: Duration::from_millis(50),
        };
        assert_eq!(err.to_string(), "Read loop did not exit within 50ms");
    }

    #[test]
    fn test_config_operation_names() {
        assert_eq!(ConfigOperation::ControllerGainSchedule.to_string(), "Controller Gain Schedule");
        assert_eq!(ConfigOperation::BalanceModeLock.to_string(), "Balance Mode Lock");
        assert_eq!(ConfigOperation::Integrators.to_string(), "Integrators");
    }

    #[test]
    fn test_from_receive_error() {
        let err: DriverError = ReceiveError::ChecksumMismatch.into();
        assert!(matches!(err, DriverError::FrameRetrieval(ReceiveError::ChecksumMismatch)));
    }
}
