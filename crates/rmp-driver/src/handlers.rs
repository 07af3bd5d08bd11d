//! 消费者回调
//!
//! 状态回调与 debug/info/error 消息回调均为实例级对象，
//! 默认实现转发到 `tracing`。

use rmp_protocol::StatusSnapshot;
use std::fmt;
use std::sync::Arc;

/// 状态快照回调
///
/// 每个完整遥测周期最多调用一次，且同一时刻最多只有一个调用在执行
/// （见 [`Dispatcher`](crate::Dispatcher)）。闭包自动实现此 trait。
///
/// ```
/// use rmp_driver::StatusHandler;
/// use rmp_protocol::StatusSnapshot;
///
/// fn accepts(_: impl StatusHandler) {}
/// accepts(|status: StatusSnapshot| println!("{}", status.pitch));
/// ```
pub trait StatusHandler: Send + Sync {
    fn on_status(&self, status: StatusSnapshot);
}

impl<F> StatusHandler for F
where
    F: Fn(StatusSnapshot) + Send + Sync,
{
    fn on_status(&self, status: StatusSnapshot) {
        self(status)
    }
}

/// 默认状态回调：以 info 级别输出状态报告
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStatusHandler;

impl StatusHandler for LogStatusHandler {
    fn on_status(&self, status: StatusSnapshot) {
        tracing::info!("{}", status);
    }
}

/// 文本消息回调
pub type MessageHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// 全部回调
#[derive(Clone)]
pub struct Handlers {
    pub status: Arc<dyn StatusHandler>,
    pub debug: MessageHandler,
    pub info: MessageHandler,
    pub error: MessageHandler,
}

impl Default for Handlers {
    fn default() -> Self {
        Self {
            status: Arc::new(LogStatusHandler),
            debug: Arc::new(|msg: &str| tracing::debug!("{}", msg)),
            info: Arc::new(|msg: &str| tracing::info!("{}", msg)),
            error: Arc::new(|msg: &str| tracing::error!("{}", msg)),
        }
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers").finish_non_exhaustive()
    }
}
