//! 共享状态
//!
//! 读循环（唯一写者）与命令接口、状态回调线程（读者）之间共享的上下文。

use crate::handlers::Handlers;
use crate::hooks::HookManager;
use crate::metrics::RmpMetrics;
use arc_swap::ArcSwap;
use parking_lot::{Condvar, Mutex, RwLock};
use rmp_protocol::StatusSnapshot;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

/// 读循环状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ReadLoopState {
    /// 未启动或已正常停止
    #[default]
    Stopped = 0,
    /// 正在接收
    Running = 1,
    /// 因致命接收错误退出
    Faulted = 2,
}

impl ReadLoopState {
    /// 从 u8 转换，无效值视为 Stopped
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Faulted,
            _ => Self::Stopped,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

/// 读循环状态（原子版本，用于线程间共享）
#[derive(Debug, Default)]
pub struct AtomicReadLoopState {
    inner: AtomicU8,
}

impl AtomicReadLoopState {
    pub fn new(state: ReadLoopState) -> Self {
        Self {
            inner: AtomicU8::new(state.as_u8()),
        }
    }

    pub fn get(&self) -> ReadLoopState {
        ReadLoopState::from_u8(self.inner.load(Ordering::Acquire))
    }

    pub fn set(&self, state: ReadLoopState) {
        self.inner.store(state.as_u8(), Ordering::Release);
    }

    /// 比较并交换，成功返回 true
    pub fn compare_exchange(&self, current: ReadLoopState, new: ReadLoopState) -> bool {
        self.inner
            .compare_exchange(
                current.as_u8(),
                new.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

/// RMP 上下文
///
/// - `status`：读循环发布的最新快照（ArcSwap，无锁读取），每帧更新
/// - `cycle`：最近一个完整遥测周期的快照，仅在周期结束时更新
/// - 更新通知：每次发布或读循环退出时唤醒等待者
/// - 回调、钩子、指标
pub struct RmpContext {
    /// 最新状态快照
    pub status: ArcSwap<StatusSnapshot>,
    /// 最近一个完整周期
    pub cycle: ArcSwap<StatusSnapshot>,
    /// 读循环状态
    pub loop_state: AtomicReadLoopState,
    /// 运行指标
    pub metrics: RmpMetrics,
    /// 帧钩子
    pub hooks: Arc<RwLock<HookManager>>,
    handlers: RwLock<Handlers>,
    generation: Mutex<u64>,
    updated: Condvar,
}

impl RmpContext {
    pub fn new() -> Self {
        Self::with_handlers(Handlers::default())
    }

    pub fn with_handlers(handlers: Handlers) -> Self {
        Self {
            status: ArcSwap::from_pointee(StatusSnapshot::default()),
            cycle: ArcSwap::from_pointee(StatusSnapshot::default()),
            loop_state: AtomicReadLoopState::new(ReadLoopState::Stopped),
            metrics: RmpMetrics::new(),
            hooks: Arc::new(RwLock::new(HookManager::new())),
            handlers: RwLock::new(handlers),
            generation: Mutex::new(0),
            updated: Condvar::new(),
        }
    }

    /// 最新快照的副本
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot::clone(&self.status.load())
    }

    /// 最近一个完整周期的副本（周期内字段一致）
    pub fn cycle_snapshot(&self) -> StatusSnapshot {
        StatusSnapshot::clone(&self.cycle.load())
    }

    /// 发布完整周期快照
    pub fn publish_cycle(&self, snapshot: StatusSnapshot) {
        self.cycle.store(Arc::new(snapshot));
    }

    /// 发布新快照并唤醒等待者
    pub fn publish(&self, snapshot: StatusSnapshot) {
        self.status.store(Arc::new(snapshot));
        self.notify_waiters();
    }

    /// 唤醒所有 `wait_for_update` 调用者
    pub fn notify_waiters(&self) {
        let mut generation = self.generation.lock();
        *generation = generation.wrapping_add(1);
        self.updated.notify_all();
    }

    /// 等待下一次发布（或读循环退出）
    ///
    /// 返回 `false` 表示超时。
    pub fn wait_for_update(&self, timeout: Duration) -> bool {
        let mut generation = self.generation.lock();
        let seen = *generation;
        !self
            .updated
            .wait_while_for(&mut generation, |current| *current == seen, timeout)
            .timed_out()
    }

    /// 当前回调集合的副本
    pub fn handlers(&self) -> Handlers {
        self.handlers.read().clone()
    }

    /// 修改回调
    pub fn update_handlers(&self, update: impl FnOnce(&mut Handlers)) {
        update(&mut self.handlers.write());
    }

    pub fn debug(&self, msg: &str) {
        let handler = self.handlers.read().debug.clone();
        handler(msg);
    }

    pub fn info(&self, msg: &str) {
        let handler = self.handlers.read().info.clone();
        handler(msg);
    }

    pub fn error(&self, msg: &str) {
        let handler = self.handlers.read().error.clone();
        handler(msg);
    }
}

impl Default for RmpContext {
    fn default() -> Self {
        Self::new()
    }
}
