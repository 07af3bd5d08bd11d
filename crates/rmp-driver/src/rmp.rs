//! 对外命令接口
//!
//! 提供 `SegwayRmp`，封装读循环线程、状态同步与命令帧发送。

use crate::config::DriverConfig;
use crate::error::{ConfigOperation, DriverError};
use crate::handlers::StatusHandler;
use crate::hooks::HookManager;
use crate::metrics::MetricsSnapshot;
use crate::pipeline::ReadLoop;
use crate::state::{ReadLoopState, RmpContext};
use crate::wait::wait_for_mode;
use parking_lot::{Mutex, RwLock};
use rmp_protocol::{
    ConfigCommand, ControllerGainSchedule, Integrator, MotionCommand, OperationalMode, RmpFrame,
    StatusSnapshot,
};
use rmp_transport::{FrameSender, Transport, TransportError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Segway RMP 驱动（对外 API）
///
/// # 生命周期
///
/// 1. 创建（可选 `configure` 端点与速率）
/// 2. `connect(mode, gain_schedule)`：打开链路、启动读循环、下发初始配置
/// 3. `move_velocity` / 配置命令
/// 4. `disconnect()` 或 drop：停止读循环
///
/// # Example
///
/// ```
/// use rmp_driver::SegwayRmp;
/// use rmp_transport::ChannelTransport;
///
/// let (transport, _device) = ChannelTransport::new();
/// let rmp = SegwayRmp::new(transport);
/// assert!(!rmp.is_connected());
/// assert!(rmp.move_velocity(0.5, 0.0).is_err());
/// ```
pub struct SegwayRmp<T: Transport> {
    /// 未连接的链路（connect 时被消费）
    transport: Mutex<Option<T>>,
    /// 发送端（连接后可用）
    tx: Mutex<Option<T::Tx>>,
    /// 读循环句柄
    read_loop: Option<ReadLoop>,
    /// 共享状态上下文
    ctx: Arc<RmpContext>,
    config: DriverConfig,
    connected: AtomicBool,
}

impl<T: Transport> SegwayRmp<T> {
    /// 使用默认配置创建
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, DriverConfig::default())
    }

    pub fn with_config(transport: T, config: DriverConfig) -> Self {
        Self::from_parts(transport, config, RmpContext::new())
    }

    pub(crate) fn from_parts(transport: T, config: DriverConfig, ctx: RmpContext) -> Self {
        Self {
            transport: Mutex::new(Some(transport)),
            tx: Mutex::new(None),
            read_loop: None,
            ctx: Arc::new(ctx),
            config,
            connected: AtomicBool::new(false),
        }
    }

    /// 配置链路端点与速率（必须在 `connect` 之前）
    pub fn configure(&mut self, endpoint: &str, rate: u32) -> Result<(), DriverError> {
        if self.is_connected() {
            return Err(DriverError::AlreadyConnected);
        }
        let mut transport = self.transport.lock();
        let transport = transport.as_mut().ok_or(TransportError::Closed)?;
        transport.configure(endpoint, rate)?;
        Ok(())
    }

    /// 连接并下发初始配置
    ///
    /// 顺序固定：启动读循环 → 平衡锁定（仅 `Balanced` 解锁）→ 运行模式（等待确认）
    /// → 增益表 → 复位全部积分器。初始配置失败时保持已连接状态。
    pub fn connect(
        &mut self,
        mode: OperationalMode,
        gain_schedule: ControllerGainSchedule,
    ) -> Result<(), DriverError> {
        if self.is_connected() {
            return Err(DriverError::AlreadyConnected);
        }
        let transport = self.transport.lock().take().ok_or(TransportError::Closed)?;
        let (rx, tx) = transport.connect()?;

        *self.tx.lock() = Some(tx);
        self.read_loop = Some(ReadLoop::start(rx, self.ctx.clone(), self.config.clone())?);
        self.connected.store(true, Ordering::Release);
        self.ctx.info("Connected to Segway RMP.");

        self.set_balance_mode_locking(mode != OperationalMode::Balanced)?;
        self.set_operational_mode(mode)?;
        self.set_controller_gain_schedule(gain_schedule)?;
        self.reset_all_integrators()?;
        Ok(())
    }

    /// 发送速度命令
    ///
    /// - `linear_velocity`: 线速度（m/s）
    /// - `angular_velocity`: 角速度（rad/s）
    ///
    /// 超出 16 位范围的计数值会回绕，需要时由调用方先行限幅。
    pub fn move_velocity(
        &self,
        linear_velocity: f64,
        angular_velocity: f64,
    ) -> Result<(), DriverError> {
        self.ensure_connected()?;
        let frame = MotionCommand::from_velocity(linear_velocity, angular_velocity).to_frame();
        self.send_frame(frame)
            .map_err(|source| DriverError::MotionFailed { source })
    }

    /// 设置运行模式，阻塞直到设备回显该模式
    ///
    /// 等待上限由 `DriverConfig::mode_confirm_timeout_ms` 决定；读循环停止时立即返回
    /// `ReadLoopStopped`。
    pub fn set_operational_mode(&self, mode: OperationalMode) -> Result<(), DriverError> {
        self.send_config(
            ConfigOperation::OperationalMode,
            ConfigCommand::operational_mode(mode),
        )?;
        wait_for_mode(
            self.ctx.as_ref(),
            mode,
            self.config.mode_poll_interval(),
            self.config.mode_confirm_timeout(),
            || !self.ctx.loop_state.get().is_running(),
        )
    }

    /// 设置控制增益表（不等待确认）
    pub fn set_controller_gain_schedule(
        &self,
        schedule: ControllerGainSchedule,
    ) -> Result<(), DriverError> {
        self.send_config(
            ConfigOperation::ControllerGainSchedule,
            ConfigCommand::gain_schedule(schedule),
        )
    }

    /// 锁定（true）或解锁（false）平衡模式
    pub fn set_balance_mode_locking(&self, locked: bool) -> Result<(), DriverError> {
        self.send_config(
            ConfigOperation::BalanceModeLock,
            ConfigCommand::balance_mode_lock(locked),
        )
    }

    /// 依次复位左轮、右轮、前向位移、转向位置积分器
    pub fn reset_all_integrators(&self) -> Result<(), DriverError> {
        for integrator in Integrator::ALL {
            self.send_config(
                ConfigOperation::Integrators,
                ConfigCommand::reset_integrator(integrator),
            )?;
        }
        Ok(())
    }

    /// 替换状态回调
    pub fn set_status_handler(&self, handler: impl StatusHandler + 'static) {
        let handler = Arc::new(handler);
        self.ctx.update_handlers(|handlers| handlers.status = handler);
    }

    pub fn set_debug_handler(&self, handler: impl Fn(&str) + Send + Sync + 'static) {
        let handler = Arc::new(handler);
        self.ctx.update_handlers(|handlers| handlers.debug = handler);
    }

    pub fn set_info_handler(&self, handler: impl Fn(&str) + Send + Sync + 'static) {
        let handler = Arc::new(handler);
        self.ctx.update_handlers(|handlers| handlers.info = handler);
    }

    pub fn set_error_handler(&self, handler: impl Fn(&str) + Send + Sync + 'static) {
        let handler = Arc::new(handler);
        self.ctx.update_handlers(|handlers| handlers.error = handler);
    }

    /// 帧钩子管理器
    pub fn hooks(&self) -> Arc<RwLock<HookManager>> {
        self.ctx.hooks.clone()
    }

    /// 最新状态快照（无锁读取）
    ///
    /// 每帧更新：周期进行中读取时，部分字段可能仍来自上一周期。
    /// 需要周期内一致的数据时使用 [`last_cycle`](Self::last_cycle)。
    pub fn status(&self) -> StatusSnapshot {
        self.ctx.snapshot()
    }

    /// 最近一个完整遥测周期的快照
    pub fn last_cycle(&self) -> StatusSnapshot {
        self.ctx.cycle_snapshot()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// 读循环状态（致命接收错误后为 `Faulted`）
    pub fn read_loop_state(&self) -> ReadLoopState {
        self.ctx.loop_state.get()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.ctx.metrics.snapshot()
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// 停止读循环并释放发送端
    ///
    /// 链路在 `connect` 时已被消费，断开后不能再次连接。
    /// 读线程未能按时退出时返回 `JoinTimeout`，驱动保持连接状态，可重试。
    pub fn disconnect(&mut self) -> Result<(), DriverError> {
        if let Some(mut read_loop) = self.read_loop.take()
            && let Err(e) = read_loop.stop()
        {
            self.read_loop = Some(read_loop);
            return Err(e);
        }
        let was_connected = self.connected.swap(false, Ordering::AcqRel);
        *self.tx.lock() = None;
        if was_connected {
            self.ctx.info("Disconnected from Segway RMP.");
        }
        Ok(())
    }

    fn ensure_connected(&self) -> Result<(), DriverError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(DriverError::NotConnected)
        }
    }

    fn send_config(
        &self,
        operation: ConfigOperation,
        command: ConfigCommand,
    ) -> Result<(), DriverError> {
        self.ensure_connected()?;
        self.send_frame(command.to_frame())
            .map_err(|source| DriverError::configuration(operation, source))
    }

    fn send_frame(&self, frame: RmpFrame) -> Result<(), TransportError> {
        // 回调可能再次发送命令，必须在释放发送端锁之后执行
        let sent = match self.tx.lock().as_mut() {
            Some(tx) => tx.send(frame),
            None => Err(TransportError::NotConnected),
        };
        match sent {
            Ok(()) => {
                self.ctx.metrics.frames_sent.fetch_add(1, Ordering::Relaxed);
                let hooks = self.ctx.hooks.read().clone();
                hooks.trigger_all_sent(&frame);
                debug!("TX frame 0x{:04X} {:02X?}", frame.id, frame.data);
                self.ctx
                    .debug(&format!("Sent frame 0x{:04X}: {:02X?}", frame.id, frame.data));
                Ok(())
            },
            Err(e) => {
                self.ctx.metrics.send_failures.fetch_add(1, Ordering::Relaxed);
                Err(e)
            },
        }
    }
}

impl<T: Transport> Drop for SegwayRmp<T> {
    fn drop(&mut self) {
        if let Err(e) = self.disconnect() {
            tracing::error!("Failed to stop read loop on drop: {}", e);
        }
    }
}
