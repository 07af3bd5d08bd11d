//! 模式确认等待
//!
//! 发送模式配置帧后，轮询状态直到设备回显目标模式。
//! 等待有上限（可配置为无限），且在读循环停止时立即取消。

use crate::error::{ConfigOperation, DriverError};
use crate::state::RmpContext;
use rmp_protocol::{ControllerGainSchedule, OperationalMode};
use std::time::{Duration, Instant};
use tracing::trace;

/// 状态只读视图
pub trait StatusReader {
    fn touched(&self) -> bool;
    fn operational_mode(&self) -> OperationalMode;
    fn gain_schedule(&self) -> ControllerGainSchedule;
    /// 阻塞至下一次状态更新或超时，返回是否收到更新
    fn wait_for_update(&self, timeout: Duration) -> bool;
}

impl StatusReader for RmpContext {
    fn touched(&self) -> bool {
        self.status.load().touched
    }

    fn operational_mode(&self) -> OperationalMode {
        self.status.load().operational_mode
    }

    fn gain_schedule(&self) -> ControllerGainSchedule {
        self.status.load().controller_gain_schedule
    }

    fn wait_for_update(&self, timeout: Duration) -> bool {
        RmpContext::wait_for_update(self, timeout)
    }
}

/// 等待设备确认目标模式
///
/// 每轮先检查模式，不匹配时最多等待 `poll_interval`（状态更新会提前唤醒）。
///
/// # 错误
/// - `ReadLoopStopped`: `cancelled()` 返回 true
/// - `ConfirmationTimeout`: 超过 `timeout`（`None` 表示无限等待）
pub fn wait_for_mode<R, C>(
    reader: &R,
    target: OperationalMode,
    poll_interval: Duration,
    timeout: Option<Duration>,
    cancelled: C,
) -> Result<(), DriverError>
where
    R: StatusReader + ?Sized,
    C: Fn() -> bool,
{
    let start = Instant::now();
    loop {
        if reader.operational_mode() == target {
            trace!("Operational mode {:?} confirmed after {:?}", target, start.elapsed());
            return Ok(());
        }
        if cancelled() {
            return Err(DriverError::ReadLoopStopped);
        }

        let wait = match timeout {
            Some(limit) => {
                let elapsed = start.elapsed();
                if elapsed >= limit {
                    return Err(DriverError::ConfirmationTimeout {
                        operation: ConfigOperation::OperationalMode,
                        waited: elapsed,
                    });
                }
                poll_interval.min(limit - elapsed)
            },
            None => poll_interval,
        };
        reader.wait_for_update(wait);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// 第 `flip_after` 次读取模式时才报告目标模式
    struct FlippingReader {
        polls: Cell<usize>,
        flip_after: usize,
        target: OperationalMode,
    }

    impl FlippingReader {
        fn new(flip_after: usize, target: OperationalMode) -> Self {
            Self {
                polls: Cell::new(0),
                flip_after,
                target,
            }
        }
    }

    impl StatusReader for FlippingReader {
        fn touched(&self) -> bool {
            true
        }

        fn operational_mode(&self) -> OperationalMode {
            let polls = self.polls.get() + 1;
            self.polls.set(polls);
            if polls >= self.flip_after {
                self.target
            } else {
                OperationalMode::Disabled
            }
        }

        fn gain_schedule(&self) -> ControllerGainSchedule {
            ControllerGainSchedule::Light
        }

        fn wait_for_update(&self, _timeout: Duration) -> bool {
            false
        }
    }

    #[test]
    fn test_returns_after_exactly_n_polls() {
        let reader = FlippingReader::new(7, OperationalMode::Balanced);
        wait_for_mode(
            &reader,
            OperationalMode::Balanced,
            Duration::from_millis(1),
            None,
            || false,
        )
        .unwrap();
        assert_eq!(reader.polls.get(), 7);
    }

    #[test]
    fn test_already_in_mode_polls_once() {
        let reader = FlippingReader::new(1, OperationalMode::Tractor);
        wait_for_mode(
            &reader,
            OperationalMode::Tractor,
            Duration::from_millis(1),
            Some(Duration::ZERO),
            || false,
        )
        .unwrap();
        assert_eq!(reader.polls.get(), 1);
    }

    #[test]
    fn test_times_out() {
        let ctx = RmpContext::new();
        let start = Instant::now();
        let err = wait_for_mode(
            &ctx,
            OperationalMode::PowerDown,
            Duration::from_millis(5),
            Some(Duration::from_millis(30)),
            || false,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DriverError::ConfirmationTimeout {
                operation: ConfigOperation::OperationalMode,
                ..
            }
        ));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_cancelled() {
        let reader = FlippingReader::new(usize::MAX, OperationalMode::Balanced);
        let err = wait_for_mode(
            &reader,
            OperationalMode::Balanced,
            Duration::from_millis(1),
            None,
            || true,
        )
        .unwrap_err();
        assert!(matches!(err, DriverError::ReadLoopStopped));
        assert_eq!(reader.polls.get(), 1);
    }

    #[test]
    fn test_context_reader_sees_published_mode() {
        let ctx = RmpContext::new();
        assert!(!StatusReader::touched(&ctx));
        ctx.publish(rmp_protocol::StatusSnapshot {
            operational_mode: OperationalMode::Tractor,
            touched: true,
            ..Default::default()
        });
        assert_eq!(ctx.operational_mode(), OperationalMode::Tractor);
        wait_for_mode(&ctx, OperationalMode::Tractor, Duration::from_millis(1), None, || false)
            .unwrap();
    }
}
