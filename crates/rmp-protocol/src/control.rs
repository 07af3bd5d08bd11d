//! 运动帧定义
//!
//! 运动命令与配置命令共用帧 ID `0x0413`，但负载布局不同：
//! Byte 0-1 为线速度计数，Byte 2-3 为角速度计数（均为大端 i16），Byte 4-7 为 0。

use crate::constants::{MPS_TO_COUNTS, RADPS_TO_COUNTS};
use crate::ids::ID_CONFIG_COMMAND;
use crate::{RmpFrame, i16_to_bytes_be};

/// 浮点数截断为 i16（向零截断，超出范围时按 16 位回绕）
///
/// 线路格式宽度固定，调用方如需避免回绕应在编码前自行限幅。
fn truncate_to_i16(value: f64) -> i16 {
    value as i64 as i16
}

/// 运动指令 (0x0413)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionCommand {
    /// 线速度计数（m/s × 332）
    pub linear_counts: i16,
    /// 角速度计数（rad/s × 1024）
    pub angular_counts: i16,
}

impl MotionCommand {
    /// 从物理量创建
    ///
    /// # 参数
    /// - `linear_velocity`: 线速度（m/s）
    /// - `angular_velocity`: 角速度（rad/s）
    pub fn from_velocity(linear_velocity: f64, angular_velocity: f64) -> Self {
        Self {
            linear_counts: truncate_to_i16(linear_velocity * MPS_TO_COUNTS),
            angular_counts: truncate_to_i16(angular_velocity * RADPS_TO_COUNTS),
        }
    }

    /// 转换为线路帧
    pub fn to_frame(self) -> RmpFrame {
        let mut data = [0u8; 8];
        data[0..2].copy_from_slice(&i16_to_bytes_be(self.linear_counts));
        data[2..4].copy_from_slice(&i16_to_bytes_be(self.angular_counts));
        RmpFrame::new(ID_CONFIG_COMMAND, &data)
    }
}

/// 构建运动帧
pub fn encode_move(linear_velocity: f64, angular_velocity: f64) -> RmpFrame {
    MotionCommand::from_velocity(linear_velocity, angular_velocity).to_frame()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_move_positive() {
        // 1.0 m/s → 332 = 0x014C; 0.5 rad/s → 512 = 0x0200
        let frame = encode_move(1.0, 0.5);
        assert_eq!(frame.id, 0x0413);
        assert_eq!(frame.data, [0x01, 0x4C, 0x02, 0x00, 0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_move_negative() {
        // -1.0 m/s → -332 = 0xFEB4; -2.0 rad/s → -2048 = 0xF800
        let frame = encode_move(-1.0, -2.0);
        assert_eq!(frame.data, [0xFE, 0xB4, 0xF8, 0x00, 0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_move_truncates_toward_zero() {
        // 0.5 m/s → 166.0; 0.001 rad/s → 1.024 → 1; -0.001 rad/s → -1
        assert_eq!(MotionCommand::from_velocity(0.5, 0.001).linear_counts, 166);
        assert_eq!(MotionCommand::from_velocity(0.0, 0.001).angular_counts, 1);
        assert_eq!(MotionCommand::from_velocity(0.0, -0.001).angular_counts, -1);
        // 0.01 m/s → 3.32 → 3
        assert_eq!(MotionCommand::from_velocity(0.01, 0.0).linear_counts, 3);
    }

    #[test]
    fn test_encode_move_wraps_on_overflow() {
        // 100 m/s → 33200 → 33200 - 65536 = -32336 = 0x81B0
        // 40 rad/s → 40960 → -24576 = 0xA000
        let frame = encode_move(100.0, 40.0);
        assert_eq!(frame.data, [0x81, 0xB0, 0xA0, 0x00, 0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_move_zero() {
        assert_eq!(encode_move(0.0, 0.0).data, [0; 8]);
    }
}
