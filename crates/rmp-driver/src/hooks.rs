//! 帧钩子
//!
//! 在读循环收到帧、或命令帧发送成功后触发的自定义回调。
//!
//! # 使用示例
//!
//! ```rust
//! use rmp_driver::hooks::{FrameCallback, HookManager};
//! use rmp_protocol::RmpFrame;
//! use crossbeam_channel::{Sender, bounded};
//! use std::sync::Arc;
//!
//! struct Tap(Sender<RmpFrame>);
//!
//! impl FrameCallback for Tap {
//!     fn on_frame_received(&self, frame: &RmpFrame) {
//!         let _ = self.0.try_send(*frame);
//!     }
//! }
//!
//! let (tx, rx) = bounded(16);
//! let mut hooks = HookManager::new();
//! hooks.add_callback(Arc::new(Tap(tx)));
//!
//! hooks.trigger_all(&RmpFrame::new(0x0401, &[0, 1]));
//! assert_eq!(rx.try_recv().unwrap().id, 0x0401);
//! ```

use rmp_protocol::RmpFrame;
use std::sync::Arc;

/// 帧回调 Trait
///
/// 回调在读循环线程（接收）或调用命令的线程（发送）上同步执行，
/// 实现必须非阻塞：推荐 `crossbeam_channel::Sender::try_send` 转交给其它线程处理。
pub trait FrameCallback: Send + Sync {
    /// 收到一帧（任意通道、任意 ID）
    fn on_frame_received(&self, frame: &RmpFrame);

    /// 命令帧发送成功后调用
    ///
    /// 默认为空操作。发送失败的帧不会触发。
    fn on_frame_sent(&self, frame: &RmpFrame) {
        let _ = frame;
    }
}

/// 钩子管理器
///
/// 回调列表本身不做同步，由 `RmpContext` 通过 `RwLock<HookManager>` 保护。
#[derive(Default, Clone)]
pub struct HookManager {
    callbacks: Vec<Arc<dyn FrameCallback>>,
}

impl HookManager {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    pub fn add_callback(&mut self, callback: Arc<dyn FrameCallback>) {
        self.callbacks.push(callback);
    }

    /// 移除所有回调
    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    /// 触发所有接收回调（读循环中调用）
    pub fn trigger_all(&self, frame: &RmpFrame) {
        for callback in self.callbacks.iter() {
            callback.on_frame_received(frame);
        }
    }

    /// 触发所有发送回调（发送成功后调用）
    pub fn trigger_all_sent(&self, frame: &RmpFrame) {
        for callback in self.callbacks.iter() {
            callback.on_frame_sent(frame);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{Sender, bounded};
    use std::sync::atomic::{AtomicU64, Ordering};

    struct CountingCallback {
        tx: Sender<(bool, RmpFrame)>,
        count: Arc<AtomicU64>,
    }

    impl FrameCallback for CountingCallback {
        fn on_frame_received(&self, frame: &RmpFrame) {
            let _ = self.tx.try_send((false, *frame));
            self.count.fetch_add(1, Ordering::Relaxed);
        }

        fn on_frame_sent(&self, frame: &RmpFrame) {
            let _ = self.tx.try_send((true, *frame));
            self.count.fetch_add(1, Ordering::Relaxed);
        }
    }

    struct ReceiveOnly;

    impl FrameCallback for ReceiveOnly {
        fn on_frame_received(&self, _frame: &RmpFrame) {}
    }

    #[test]
    fn test_received_and_sent_are_distinguished() {
        let mut hooks = HookManager::new();
        let (tx, rx) = bounded(10);
        let count = Arc::new(AtomicU64::new(0));
        hooks.add_callback(Arc::new(CountingCallback {
            tx,
            count: count.clone(),
        }));

        hooks.trigger_all(&RmpFrame::new(0x0407, &[0x01, 0x4C]));
        hooks.trigger_all_sent(&RmpFrame::new(0x0413, &[0, 0, 0, 0, 0, 0x10, 0, 0x02]));

        assert_eq!(count.load(Ordering::Relaxed), 2);
        let (sent, frame) = rx.try_recv().unwrap();
        assert!(!sent);
        assert_eq!(frame.id, 0x0407);
        let (sent, frame) = rx.try_recv().unwrap();
        assert!(sent);
        assert_eq!(frame.data[5], 0x10);
    }

    #[test]
    fn test_default_sent_hook_is_noop() {
        let mut hooks = HookManager::new();
        hooks.add_callback(Arc::new(ReceiveOnly));
        hooks.trigger_all_sent(&RmpFrame::new(0x0413, &[]));
        assert_eq!(hooks.len(), 1);

        hooks.clear();
        assert!(hooks.is_empty());
    }
}
