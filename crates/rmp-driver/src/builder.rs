//! Builder 模式实现
//!
//! 提供链式构造 `SegwayRmp` 实例的便捷方式。

use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::handlers::{Handlers, StatusHandler};
use crate::hooks::FrameCallback;
use crate::rmp::SegwayRmp;
use crate::state::RmpContext;
use rmp_transport::Transport;
use std::sync::Arc;

/// SegwayRmp Builder（链式构造）
///
/// # Example
///
/// ```
/// use rmp_driver::{DriverConfig, SegwayRmpBuilder};
/// use rmp_protocol::StatusSnapshot;
/// use rmp_transport::ChannelTransport;
///
/// let (transport, device) = ChannelTransport::new();
/// let rmp = SegwayRmpBuilder::new()
///     .endpoint("/dev/ttyUSB0", 460_800)
///     .config(DriverConfig {
///         receive_timeout_ms: 20,
///         ..Default::default()
///     })
///     .status_handler(|status: StatusSnapshot| println!("{}", status))
///     .build(transport)
///     .unwrap();
///
/// assert_eq!(device.configured(), Some(("/dev/ttyUSB0".to_string(), 460_800)));
/// assert_eq!(rmp.config().receive_timeout_ms, 20);
/// ```
#[derive(Default)]
pub struct SegwayRmpBuilder {
    /// 链路端点与速率（串口路径/设备序列号 + 波特率）
    endpoint: Option<(String, u32)>,
    config: Option<DriverConfig>,
    handlers: Handlers,
    hooks: Vec<Arc<dyn FrameCallback>>,
}

impl SegwayRmpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置链路端点（可选，构建时通过 `Transport::configure` 应用）
    pub fn endpoint(mut self, endpoint: impl Into<String>, rate: u32) -> Self {
        self.endpoint = Some((endpoint.into(), rate));
        self
    }

    /// 设置驱动配置（可选）
    pub fn config(mut self, config: DriverConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn status_handler(mut self, handler: impl StatusHandler + 'static) -> Self {
        self.handlers.status = Arc::new(handler);
        self
    }

    pub fn debug_handler(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.handlers.debug = Arc::new(handler);
        self
    }

    pub fn info_handler(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.handlers.info = Arc::new(handler);
        self
    }

    pub fn error_handler(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.handlers.error = Arc::new(handler);
        self
    }

    /// 添加帧钩子
    pub fn hook(mut self, callback: Arc<dyn FrameCallback>) -> Self {
        self.hooks.push(callback);
        self
    }

    /// 构建 SegwayRmp 实例（未连接）
    ///
    /// # Errors
    /// - `DriverError::Transport`: 端点配置失败
    pub fn build<T: Transport>(self, mut transport: T) -> Result<SegwayRmp<T>, DriverError> {
        if let Some((endpoint, rate)) = &self.endpoint {
            transport.configure(endpoint, *rate)?;
        }

        let ctx = RmpContext::with_handlers(self.handlers);
        {
            let mut hooks = ctx.hooks.write();
            for callback in self.hooks {
                hooks.add_callback(callback);
            }
        }

        Ok(SegwayRmp::from_parts(
            transport,
            self.config.unwrap_or_default(),
            ctx,
        ))
    }
}
