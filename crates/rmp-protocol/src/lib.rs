//! # RMP Protocol
//!
//! Segway RMP 两轮自平衡底盘的帧协议定义（无硬件依赖、无 I/O）
//!
//! ## 模块
//!
//! - `ids`: 帧 ID 与通道常量
//! - `constants`: 缩放系数与协议常量
//! - `config`: 配置帧构建（模式、增益表、平衡锁定、积分器复位）
//! - `control`: 运动帧构建
//! - `feedback`: 遥测帧解析
//! - `status`: 状态快照
//!
//! ## 字节序
//!
//! 协议整体使用大端字节序（高位在前）。
//! 例外：32 位位置/位移字段使用字交换顺序 `(b2, b3, b0, b1)`，见 [`word_swapped_i32`]。

pub mod config;
pub mod constants;
pub mod control;
pub mod feedback;
pub mod ids;
pub mod status;

// 重新导出常用类型
pub use config::*;
pub use constants::*;
pub use control::*;
pub use feedback::*;
pub use ids::*;
pub use status::StatusSnapshot;

/// RMP 线路帧
///
/// 协议层和传输层之间的中间抽象：16 位帧 ID、通道标记和固定 8 字节负载。
/// 校验和由传输层负责，到达协议层的帧均视为已校验。
///
/// ```text
/// Protocol Layer (rmp-protocol)
///     ↓ TryFrom<RmpFrame> 解析 / to_frame() 构建
/// RmpFrame (此类型)
///     ↓
/// Transport Layer (rmp-transport)
/// ```
///
/// # 示例
///
/// ```rust
/// use rmp_protocol::{CHANNEL_A, RmpFrame};
///
/// let frame = RmpFrame::new(0x0401, &[0x00, 0x4E]);
/// assert_eq!(frame.id(), 0x0401);
/// assert_eq!(frame.channel, CHANNEL_A);
/// assert_eq!(frame.data(), &[0x00, 0x4E, 0, 0, 0, 0, 0, 0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RmpFrame {
    /// 帧 ID
    pub id: u16,

    /// 通道标记（`CHANNEL_A` 为遥测通道，`CHANNEL_B` 被忽略）
    pub channel: u8,

    /// 帧数据（固定 8 字节，未使用部分为 0）
    pub data: [u8; 8],

    /// 接收时间戳（微秒），0 表示不可用
    pub timestamp_us: u64,
}

impl RmpFrame {
    /// 在遥测通道（A）上创建帧
    pub fn new(id: u16, data: &[u8]) -> Self {
        Self::on_channel(id, ids::CHANNEL_A, data)
    }

    /// 在指定通道上创建帧
    ///
    /// 超过 8 字节的数据会被截断，不足 8 字节时补 0。
    pub fn on_channel(id: u16, channel: u8, data: &[u8]) -> Self {
        let mut fixed_data = [0u8; 8];
        let len = data.len().min(8);
        fixed_data[..len].copy_from_slice(&data[..len]);

        Self {
            id,
            channel,
            data: fixed_data,
            timestamp_us: 0,
        }
    }

    /// 获取帧 ID
    pub fn id(&self) -> u16 {
        self.id
    }

    /// 获取完整数据（8 字节固定数组）
    pub fn data(&self) -> &[u8; 8] {
        &self.data
    }

    /// 是否位于遥测通道
    ///
    /// 任何不等于 `CHANNEL_B` 的通道值都按遥测通道处理。
    pub fn is_telemetry_channel(&self) -> bool {
        self.channel != ids::CHANNEL_B
    }
}

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Unexpected frame ID: 0x{id:04X}")]
    InvalidFrameId { id: u16 },

    #[error("Frame 0x{id:04X} is on non-telemetry channel 0x{channel:02X}")]
    InvalidChannel { id: u16, channel: u8 },

    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: &'static str, value: i32 },
}

/// 大端字节序转 i16（二进制补码）
pub fn bytes_to_i16_be(bytes: [u8; 2]) -> i16 {
    i16::from_be_bytes(bytes)
}

/// 大端字节序转 u16（无符号扩展）
pub fn bytes_to_u16_be(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// i16 转大端字节序
pub fn i16_to_bytes_be(value: i16) -> [u8; 2] {
    value.to_be_bytes()
}

/// 字交换的 32 位有符号整数
///
/// 位置/位移字段按 `(b2 << 24) | (b3 << 16) | (b0 << 8) | b1` 组合，
/// 即低位字在前、字内大端。
pub fn word_swapped_i32(bytes: [u8; 4]) -> i32 {
    i32::from_be_bytes([bytes[2], bytes[3], bytes[0], bytes[1]])
}

/// [`word_swapped_i32`] 的逆运算
pub fn i32_to_word_swapped(value: i32) -> [u8; 4] {
    let be = value.to_be_bytes();
    [be[2], be[3], be[0], be[1]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_pads_short_payload() {
        let frame = RmpFrame::new(0x0401, &[1, 2, 3]);
        assert_eq!(frame.data, [1, 2, 3, 0, 0, 0, 0, 0]);
        assert_eq!(frame.channel, CHANNEL_A);
        assert_eq!(frame.timestamp_us, 0);
    }

    #[test]
    fn test_frame_truncates_long_payload() {
        let frame = RmpFrame::new(0x0401, &[9; 12]);
        assert_eq!(frame.data, [9; 8]);
    }

    #[test]
    fn test_channel_classification() {
        assert!(RmpFrame::on_channel(0x0401, CHANNEL_A, &[]).is_telemetry_channel());
        assert!(!RmpFrame::on_channel(0x0401, CHANNEL_B, &[]).is_telemetry_channel());
    }

    #[test]
    fn test_bytes_to_i16_be_negative() {
        assert_eq!(bytes_to_i16_be([0xFF, 0xFF]), -1);
        assert_eq!(bytes_to_i16_be([0x80, 0x00]), i16::MIN);
        assert_eq!(bytes_to_i16_be([0x12, 0x34]), 0x1234);
    }

    #[test]
    fn test_bytes_to_u16_be_no_sign_extension() {
        assert_eq!(bytes_to_u16_be([0xFF, 0xFF]), 0xFFFF);
        assert_eq!(bytes_to_u16_be([0x80, 0x01]), 0x8001);
    }

    #[test]
    fn test_word_swapped_i32() {
        // (b2, b3, b0, b1) = (0x56, 0x78, 0x12, 0x34)
        assert_eq!(word_swapped_i32([0x12, 0x34, 0x56, 0x78]), 0x5678_1234);
        // 高位字在 b2/b3，因此符号位取自 b2
        assert_eq!(word_swapped_i32([0x00, 0x01, 0xFF, 0xFF]), -65535);
        assert_eq!(word_swapped_i32([0xFF, 0xFF, 0xFF, 0xFF]), -1);
    }

    #[test]
    fn test_word_swapped_inverse() {
        for value in [0, 1, -1, 33215, -33215, i32::MAX, i32::MIN] {
            assert_eq!(word_swapped_i32(i32_to_word_swapped(value)), value);
        }
    }
}
