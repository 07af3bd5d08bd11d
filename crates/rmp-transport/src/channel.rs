//! 进程内帧链路
//!
//! 基于 crossbeam 通道的内存传输：`ChannelTransport` 交给驱动，
//! `DeviceEndpoint` 扮演设备一侧（注入遥测帧/接收错误，观察发出的命令帧）。
//! 用于测试、仿真平台和离线回放。

use crate::{DeviceError, DeviceErrorKind, FrameReceiver, FrameSender, ReceiveError, RmpFrame, Transport, TransportError};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, unbounded};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

type Inbound = Result<RmpFrame, ReceiveError>;

/// 链路两端共享的控制状态
#[derive(Debug, Default)]
struct LinkState {
    /// 模拟发送失败
    fail_sends: AtomicBool,
    /// 拒绝连接
    refuse_connect: AtomicBool,
    /// 最近一次 configure 的参数
    configured: Mutex<Option<(String, u32)>>,
}

/// 进程内传输（驱动一侧）
pub struct ChannelTransport {
    inbound_rx: Receiver<Inbound>,
    outbound_tx: Sender<RmpFrame>,
    state: Arc<LinkState>,
}

impl ChannelTransport {
    /// 创建一对链路端点
    pub fn new() -> (ChannelTransport, DeviceEndpoint) {
        let (inbound_tx, inbound_rx) = unbounded();
        let (outbound_tx, outbound_rx) = unbounded();
        let state = Arc::new(LinkState::default());

        let transport = ChannelTransport {
            inbound_rx,
            outbound_tx,
            state: state.clone(),
        };
        let device = DeviceEndpoint {
            inbound_tx: Some(inbound_tx),
            outbound_rx,
            state,
        };
        (transport, device)
    }
}

impl Transport for ChannelTransport {
    type Rx = ChannelReceiver;
    type Tx = ChannelSender;

    fn configure(&mut self, endpoint: &str, rate: u32) -> Result<(), TransportError> {
        debug!("Channel transport configured: endpoint={}, rate={}", endpoint, rate);
        *self.state.configured.lock() = Some((endpoint.to_string(), rate));
        Ok(())
    }

    fn connect(self) -> Result<(Self::Rx, Self::Tx), TransportError> {
        if self.state.refuse_connect.load(Ordering::Acquire) {
            return Err(TransportError::Device(DeviceError::new(
                DeviceErrorKind::NotFound,
                "device did not answer",
            )));
        }
        let rx = ChannelReceiver {
            inbound_rx: self.inbound_rx,
            timeout: None,
        };
        let tx = ChannelSender {
            outbound_tx: self.outbound_tx,
            state: self.state,
        };
        Ok((rx, tx))
    }
}

/// 接收端
pub struct ChannelReceiver {
    inbound_rx: Receiver<Inbound>,
    timeout: Option<Duration>,
}

/// 接收时间戳（Unix 纪元微秒）
fn now_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_micros() as u64)
}

impl FrameReceiver for ChannelReceiver {
    /// 设备侧未填写时间戳的帧在此打上接收时间
    fn receive(&mut self) -> Result<RmpFrame, ReceiveError> {
        let mut frame = self.receive_inbound()?;
        if frame.timestamp_us == 0 {
            frame.timestamp_us = now_us();
        }
        Ok(frame)
    }

    fn set_receive_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }
}

impl ChannelReceiver {
    fn receive_inbound(&mut self) -> Inbound {
        match self.timeout {
            Some(timeout) => match self.inbound_rx.recv_timeout(timeout) {
                Ok(inbound) => inbound,
                Err(RecvTimeoutError::Timeout) => Err(ReceiveError::NoData),
                Err(RecvTimeoutError::Disconnected) => {
                    Err(ReceiveError::Other(TransportError::Closed))
                },
            },
            None => self
                .inbound_rx
                .recv()
                .unwrap_or_else(|_| Err(ReceiveError::Other(TransportError::Closed))),
        }
    }
}

/// 发送端
pub struct ChannelSender {
    outbound_tx: Sender<RmpFrame>,
    state: Arc<LinkState>,
}

impl FrameSender for ChannelSender {
    fn send(&mut self, frame: RmpFrame) -> Result<(), TransportError> {
        if self.state.fail_sends.load(Ordering::Acquire) {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "simulated send failure",
            )));
        }
        self.outbound_tx
            .send(frame)
            .map_err(|_| TransportError::Closed)
    }
}

/// 设备一侧端点
pub struct DeviceEndpoint {
    inbound_tx: Option<Sender<Inbound>>,
    outbound_rx: Receiver<RmpFrame>,
    state: Arc<LinkState>,
}

impl DeviceEndpoint {
    /// 向驱动注入一帧
    pub fn push_frame(&self, frame: RmpFrame) -> Result<(), TransportError> {
        self.push(Ok(frame))
    }

    /// 向驱动注入多帧（按顺序）
    pub fn push_frames(
        &self,
        frames: impl IntoIterator<Item = RmpFrame>,
    ) -> Result<(), TransportError> {
        frames.into_iter().try_for_each(|frame| self.push_frame(frame))
    }

    /// 向驱动注入一次接收失败
    pub fn push_error(&self, error: ReceiveError) -> Result<(), TransportError> {
        self.push(Err(error))
    }

    fn push(&self, inbound: Inbound) -> Result<(), TransportError> {
        let tx = self.inbound_tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(inbound).map_err(|_| TransportError::Closed)
    }

    /// 非阻塞获取驱动发出的下一帧
    pub fn try_recv_sent(&self) -> Option<RmpFrame> {
        match self.outbound_rx.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// 等待驱动发出的下一帧
    pub fn recv_sent_timeout(&self, timeout: Duration) -> Option<RmpFrame> {
        self.outbound_rx.recv_timeout(timeout).ok()
    }

    /// 取出当前所有已发送帧
    pub fn drain_sent(&self) -> Vec<RmpFrame> {
        self.outbound_rx.try_iter().collect()
    }

    /// 让之后的发送全部失败（或恢复）
    pub fn set_fail_sends(&self, fail: bool) {
        self.state.fail_sends.store(fail, Ordering::Release);
    }

    /// 让之后的 connect 失败
    pub fn refuse_connect(&self) {
        self.state.refuse_connect.store(true, Ordering::Release);
    }

    /// 最近一次 configure 的端点与速率
    pub fn configured(&self) -> Option<(String, u32)> {
        self.state.configured.lock().clone()
    }

    /// 关闭设备侧，驱动的下一次接收将返回 `Other(Closed)`
    pub fn close(&mut self) {
        self.inbound_tx = None;
    }

    /// 设备侧是否已关闭
    pub fn is_closed(&self) -> bool {
        self.inbound_tx.is_none()
    }
}
