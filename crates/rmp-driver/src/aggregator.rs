//! 状态聚合
//!
//! 持有唯一的可变 [`StatusSnapshot`]，由读循环线程独占写入。
//! 每次快照被修改后发布到 [`RmpContext`]，供其它线程无锁读取；
//! 周期结束时另行发布周期内一致的快照。

use crate::state::RmpContext;
use rmp_protocol::{ControllerGainSchedule, OperationalMode, RmpFrame, StatusSnapshot, Telemetry};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::trace;

/// 状态聚合器
pub struct StatusAggregator {
    status: StatusSnapshot,
    ctx: Arc<RmpContext>,
}

impl StatusAggregator {
    pub fn new(ctx: Arc<RmpContext>) -> Self {
        Self {
            status: StatusSnapshot::default(),
            ctx,
        }
    }

    /// 应用一帧
    ///
    /// 返回该帧是否结束了一个遥测周期。B 通道帧与未知 ID 不修改快照。
    pub fn apply(&mut self, frame: &RmpFrame) -> bool {
        let telemetry = if frame.is_telemetry_channel() {
            Telemetry::parse(frame)
        } else {
            None
        };

        let Some(telemetry) = telemetry else {
            trace!("Ignoring frame 0x{:04X} on channel 0x{:02X}", frame.id, frame.channel);
            self.ctx.metrics.frames_ignored.fetch_add(1, Ordering::Relaxed);
            return false;
        };

        let cycle_complete = telemetry.apply_to(&mut self.status);
        if cycle_complete {
            self.ctx.publish_cycle(self.status.clone());
        }
        self.ctx.publish(self.status.clone());
        cycle_complete
    }

    /// 快照副本（可安全跨线程传递）
    pub fn snapshot_copy(&self) -> StatusSnapshot {
        self.status.clone()
    }

    pub fn touched(&self) -> bool {
        self.status.touched
    }

    pub fn mode(&self) -> OperationalMode {
        self.status.operational_mode
    }

    pub fn gain_schedule(&self) -> ControllerGainSchedule {
        self.status.controller_gain_schedule
    }
}
