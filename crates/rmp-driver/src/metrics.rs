//! 运行指标
//!
//! 原子计数器，任意线程可读，无锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 驱动实时指标
///
/// ```rust
/// use rmp_driver::RmpMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = RmpMetrics::new();
/// metrics.frames_received.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(metrics.snapshot().frames_received, 1);
/// ```
#[derive(Debug, Default)]
pub struct RmpMetrics {
    /// 收到的总帧数（含被忽略的帧）
    pub frames_received: AtomicU64,
    /// 被忽略的帧数（B 通道、未知 ID、命令请求回显）
    pub frames_ignored: AtomicU64,
    /// 校验和错误次数
    pub checksum_mismatches: AtomicU64,
    /// 接收超时（无数据）次数
    pub no_data_events: AtomicU64,
    /// 致命接收错误次数（导致读循环退出）
    pub fatal_errors: AtomicU64,
    /// 完成的遥测周期数
    pub cycles_completed: AtomicU64,
    /// 已交付给状态回调的快照数
    pub snapshots_delivered: AtomicU64,
    /// 因回调繁忙被丢弃的快照数
    pub snapshots_dropped: AtomicU64,
    /// 发送成功的命令帧数
    pub frames_sent: AtomicU64,
    /// 发送失败次数
    pub send_failures: AtomicU64,
}

impl RmpMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取所有计数器
    ///
    /// 各计数器分别以 `Relaxed` 读取，彼此之间可能有微小的时间差。
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_ignored: self.frames_ignored.load(Ordering::Relaxed),
            checksum_mismatches: self.checksum_mismatches.load(Ordering::Relaxed),
            no_data_events: self.no_data_events.load(Ordering::Relaxed),
            fatal_errors: self.fatal_errors.load(Ordering::Relaxed),
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            snapshots_delivered: self.snapshots_delivered.load(Ordering::Relaxed),
            snapshots_dropped: self.snapshots_dropped.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        for counter in [
            &self.frames_received,
            &self.frames_ignored,
            &self.checksum_mismatches,
            &self.no_data_events,
            &self.fatal_errors,
            &self.cycles_completed,
            &self.snapshots_delivered,
            &self.snapshots_dropped,
            &self.frames_sent,
            &self.send_failures,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub frames_received: u64,
    pub frames_ignored: u64,
    pub checksum_mismatches: u64,
    pub no_data_events: u64,
    pub fatal_errors: u64,
    pub cycles_completed: u64,
    pub snapshots_delivered: u64,
    pub snapshots_dropped: u64,
    pub frames_sent: u64,
    pub send_failures: u64,
}

impl MetricsSnapshot {
    /// 快照丢弃率（百分比）
    ///
    /// 返回 0.0 到 100.0 之间的值。如果 `cycles_completed` 为 0，返回 0.0。
    pub fn drop_rate(&self) -> f64 {
        if self.cycles_completed == 0 {
            return 0.0;
        }
        (self.snapshots_dropped as f64 / self.cycles_completed as f64) * 100.0
    }

    /// 可恢复接收错误总数
    pub fn recoverable_errors(&self) -> u64 {
        self.checksum_mismatches + self.no_data_events
    }
}
