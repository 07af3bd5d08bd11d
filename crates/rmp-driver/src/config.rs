//! 驱动配置
//!
//! 纯数据结构（POD），运行时组件（回调、钩子）由 [`RmpContext`](crate::RmpContext) 管理。

use std::time::Duration;

/// 驱动配置
///
/// # Example
///
/// ```
/// use rmp_driver::DriverConfig;
///
/// // 默认配置：100ms 接收超时，10ms 模式轮询，5s 模式确认超时
/// let config = DriverConfig::default();
///
/// // 恢复无上限的模式确认等待
/// let legacy = DriverConfig {
///     mode_confirm_timeout_ms: None,
///     ..DriverConfig::default()
/// };
/// assert!(legacy.mode_confirm_timeout().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DriverConfig {
    /// 传输层接收超时（毫秒）
    ///
    /// 决定读循环响应 `stop()` 的最长延迟。
    pub receive_timeout_ms: u64,
    /// 模式确认轮询间隔（毫秒）
    pub mode_poll_interval_ms: u64,
    /// 模式确认超时（毫秒），`None` 表示无限等待
    pub mode_confirm_timeout_ms: Option<u64>,
    /// 停止读循环时 join 超时（毫秒）
    pub join_timeout_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            receive_timeout_ms: 100,
            mode_poll_interval_ms: 10,
            mode_confirm_timeout_ms: Some(5000),
            join_timeout_ms: 2000,
        }
    }
}

impl DriverConfig {
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    pub fn mode_poll_interval(&self) -> Duration {
        Duration::from_millis(self.mode_poll_interval_ms)
    }

    pub fn mode_confirm_timeout(&self) -> Option<Duration> {
        self.mode_confirm_timeout_ms.map(Duration::from_millis)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    /// 从 TOML 文本加载配置，缺省字段取默认值
    ///
    /// ```
    /// # #[cfg(feature = "serde")]
    /// # {
    /// use rmp_driver::DriverConfig;
    ///
    /// let config = DriverConfig::from_toml_str("receive_timeout_ms = 20").unwrap();
    /// assert_eq!(config.receive_timeout_ms, 20);
    /// assert_eq!(config.mode_poll_interval_ms, 10);
    /// # }
    /// ```
    #[cfg(feature = "serde")]
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
