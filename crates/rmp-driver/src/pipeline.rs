//! 读循环模块
//!
//! 后台线程持续接收帧、更新状态聚合器，并在遥测周期结束时交付快照。

use crate::aggregator::StatusAggregator;
use crate::config::DriverConfig;
use crate::dispatch::Dispatcher;
use crate::error::DriverError;
use crate::state::{ReadLoopState, RmpContext};
use rmp_transport::{FrameReceiver, ReceiveError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{error, info, trace};

/// 等待线程退出时的最长单次休眠
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// 读循环主体
///
/// 在 `is_running` 为 true 期间循环：
/// - 收到帧：触发钩子，交给聚合器；周期结束时交付快照
/// - 校验和错误 / 无数据：经 error 回调报告后继续
/// - 其它错误：报告后退出，状态置为 `Faulted`，返回 `FrameRetrieval`
///
/// 退出时（任意原因）唤醒所有确认等待者。
pub fn read_loop<R: FrameReceiver>(
    mut rx: R,
    ctx: Arc<RmpContext>,
    config: DriverConfig,
    is_running: Arc<AtomicBool>,
) -> Result<(), DriverError> {
    rx.set_receive_timeout(config.receive_timeout());

    let mut aggregator = StatusAggregator::new(ctx.clone());
    let dispatcher = Dispatcher::new(ctx.clone());

    while is_running.load(Ordering::Acquire) {
        match rx.receive() {
            Ok(frame) => {
                ctx.metrics.frames_received.fetch_add(1, Ordering::Relaxed);
                trace!("RX frame 0x{:04X} {:02X?}", frame.id, frame.data);
                ctx.hooks.read().trigger_all(&frame);

                if aggregator.apply(&frame) {
                    ctx.metrics.cycles_completed.fetch_add(1, Ordering::Relaxed);
                    dispatcher.deliver(aggregator.snapshot_copy());
                }
            },
            Err(ReceiveError::ChecksumMismatch) => {
                ctx.metrics.checksum_mismatches.fetch_add(1, Ordering::Relaxed);
                ctx.error("Checksum mismatch...");
            },
            Err(ReceiveError::NoData) => {
                ctx.metrics.no_data_events.fetch_add(1, Ordering::Relaxed);
                ctx.error("No data from Segway...");
            },
            Err(ReceiveError::Other(e)) => {
                ctx.metrics.fatal_errors.fetch_add(1, Ordering::Relaxed);
                error!("Read loop terminated: {}", e);
                ctx.error(&format!("Unknown error while reading from Segway: {}", e));
                ctx.loop_state.set(ReadLoopState::Faulted);
                is_running.store(false, Ordering::Release);
                ctx.notify_waiters();
                return Err(DriverError::FrameRetrieval(ReceiveError::Other(e)));
            },
        }
    }

    ctx.loop_state
        .compare_exchange(ReadLoopState::Running, ReadLoopState::Stopped);
    ctx.notify_waiters();
    trace!("Read loop: exited");
    Ok(())
}

/// 读循环句柄
///
/// `Drop` 时停止并等待线程退出。
pub struct ReadLoop {
    is_running: Arc<AtomicBool>,
    ctx: Arc<RmpContext>,
    handle: Option<JoinHandle<Result<(), DriverError>>>,
    join_timeout: Duration,
}

impl ReadLoop {
    /// 启动读循环线程
    pub fn start<R>(rx: R, ctx: Arc<RmpContext>, config: DriverConfig) -> Result<Self, DriverError>
    where
        R: FrameReceiver + Send + 'static,
    {
        let is_running = Arc::new(AtomicBool::new(true));
        let join_timeout = config.join_timeout();
        ctx.loop_state.set(ReadLoopState::Running);

        let handle = {
            let ctx = ctx.clone();
            let is_running = is_running.clone();
            std::thread::Builder::new()
                .name("rmp-read".into())
                .spawn(move || read_loop(rx, ctx, config, is_running))
        };

        let handle = match handle {
            Ok(handle) => handle,
            Err(e) => {
                ctx.loop_state.set(ReadLoopState::Stopped);
                return Err(DriverError::ThreadSpawn(e.to_string()));
            },
        };

        info!("Read loop started");
        Ok(Self {
            is_running,
            ctx,
            handle: Some(handle),
            join_timeout,
        })
    }

    /// 线程是否仍在运行（致命错误后为 false）
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    /// 线程实际状态：`stop()` 超时后线程仍在接收时保持 `Running`
    pub fn state(&self) -> ReadLoopState {
        self.ctx.loop_state.get()
    }

    /// 停止读循环并等待线程退出
    ///
    /// 接收调用本身不可中断，最长等待 `join_timeout`。
    ///
    /// # 错误
    /// - `SelfJoin`: 在读循环线程内调用（例如从 error 回调中）
    /// - `JoinTimeout`: 线程仍阻塞在接收中；句柄保留，可再次调用 `stop()`
    pub fn stop(&mut self) -> Result<(), DriverError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        if handle.thread().id() == std::thread::current().id() {
            self.handle = Some(handle);
            return Err(DriverError::SelfJoin);
        }

        self.is_running.store(false, Ordering::Release);
        let start = Instant::now();
        while !handle.is_finished() {
            let elapsed = start.elapsed();
            if elapsed >= self.join_timeout {
                self.handle = Some(handle);
                error!("Read thread failed to shut down within {:?}", self.join_timeout);
                return Err(DriverError::JoinTimeout { waited: elapsed });
            }
            // 线程退出前会唤醒等待者
            self.ctx
                .wait_for_update(JOIN_POLL_INTERVAL.min(self.join_timeout - elapsed));
        }

        match handle.join() {
            Ok(Ok(())) => {},
            // 致命错误已在读循环内报告
            Ok(Err(e)) => trace!("Read loop had exited with: {}", e),
            Err(_) => {
                error!("Read thread panicked");
                self.ctx
                    .loop_state
                    .compare_exchange(ReadLoopState::Running, ReadLoopState::Faulted);
            },
        }
        Ok(())
    }
}

impl Drop for ReadLoop {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            // 自身线程内或超时：仅发出停止信号，线程被分离
            self.is_running.store(false, Ordering::Release);
            error!("Read loop dropped without joining: {}", e);
        }
    }
}
