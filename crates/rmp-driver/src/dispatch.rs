//! 单飞（single-flight）状态分发
//!
//! 同一时刻最多一个状态回调在执行；回调繁忙时新快照直接丢弃，不排队。

use crate::state::RmpContext;
use rmp_protocol::StatusSnapshot;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{trace, warn};

/// 状态分发器
pub struct Dispatcher {
    busy: Arc<AtomicBool>,
    ctx: Arc<RmpContext>,
}

/// 回调线程退出时（含 panic）清除忙标志
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Dispatcher {
    pub fn new(ctx: Arc<RmpContext>) -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            ctx,
        }
    }

    /// 是否有回调正在执行
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// 交付一个快照
    ///
    /// 空闲时在新线程中调用状态回调并返回 `true`；
    /// 繁忙时丢弃快照，经 error 回调报告一次并返回 `false`。
    pub fn deliver(&self, snapshot: StatusSnapshot) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.ctx.metrics.snapshots_dropped.fetch_add(1, Ordering::Relaxed);
            warn!("Status handler still running, status snapshot dropped");
            self.ctx.error("Status handler busy: status snapshot dropped.");
            return false;
        }

        let handler = self.ctx.handlers().status;
        let guard = BusyGuard(self.busy.clone());
        let ctx = self.ctx.clone();
        let spawned = std::thread::Builder::new()
            .name("rmp-status".into())
            .spawn(move || {
                let _guard = guard;
                handler.on_status(snapshot);
                ctx.metrics.snapshots_delivered.fetch_add(1, Ordering::Relaxed);
                trace!("Status snapshot delivered");
            });

        match spawned {
            Ok(_) => true,
            Err(e) => {
                // 闭包（含 guard）已随错误一起释放，忙标志已清除
                self.ctx.error(&format!("Failed to spawn status handler thread: {}", e));
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_busy_handler_drops_snapshot() {
        let ctx = Arc::new(RmpContext::new());
        let (release_tx, release_rx) = bounded::<()>(0);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(Mutex::new(Vec::<String>::new()));

        {
            let in_flight = in_flight.clone();
            let max_in_flight = max_in_flight.clone();
            let calls = calls.clone();
            let errors = errors.clone();
            ctx.update_handlers(move |handlers| {
                handlers.status = Arc::new(move |_status: StatusSnapshot| {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_in_flight.fetch_max(now, Ordering::SeqCst);
                    calls.fetch_add(1, Ordering::SeqCst);
                    let _ = release_rx.recv();
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                });
                handlers.error = Arc::new(move |msg: &str| errors.lock().push(msg.to_string()));
            });
        }

        let dispatcher = Dispatcher::new(ctx.clone());
        assert!(dispatcher.deliver(StatusSnapshot::default()));
        wait_until(|| calls.load(Ordering::SeqCst) == 1);

        assert!(!dispatcher.deliver(StatusSnapshot::default()));
        assert_eq!(errors.lock().len(), 1);
        assert_eq!(ctx.metrics.snapshot().snapshots_dropped, 1);

        release_tx.send(()).unwrap();
        wait_until(|| !dispatcher.is_busy());

        assert!(dispatcher.deliver(StatusSnapshot::default()));
        wait_until(|| calls.load(Ordering::SeqCst) == 2);
        release_tx.send(()).unwrap();
        wait_until(|| !dispatcher.is_busy());

        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(errors.lock().len(), 1);
        wait_until(|| ctx.metrics.snapshot().snapshots_delivered == 2);
    }

    #[test]
    fn test_panicking_handler_releases_busy_flag() {
        fn failing(_status: StatusSnapshot) {
            panic!("handler failure");
        }

        let ctx = Arc::new(RmpContext::new());
        ctx.update_handlers(|handlers| handlers.status = Arc::new(failing));

        let dispatcher = Dispatcher::new(ctx);
        assert!(dispatcher.deliver(StatusSnapshot::default()));
        wait_until(|| !dispatcher.is_busy());
        assert!(dispatcher.deliver(StatusSnapshot::default()));
    }
}
