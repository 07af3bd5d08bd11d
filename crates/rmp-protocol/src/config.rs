//! 配置帧定义
//!
//! 所有配置命令共用帧 ID `0x0413`，由 Byte 5 选择子功能、Byte 7 携带 1 字节参数，
//! 其余字节为 0。

use crate::ids::ID_CONFIG_COMMAND;
use crate::{ProtocolError, RmpFrame};

/// 子功能选择字节在负载中的偏移
pub const FUNCTION_BYTE: usize = 5;

/// 参数字节在负载中的偏移
pub const VALUE_BYTE: usize = 7;

// ============================================================================
// 运行模式与增益表
// ============================================================================

/// 运行模式
///
/// 整数编码属于线路协议，发送配置帧和解析回显时都使用该编码。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, num_enum::TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[num_enum(error_type(name = ProtocolError, constructor = ProtocolError::invalid_mode))]
#[repr(u8)]
pub enum OperationalMode {
    /// 禁用（上电默认）
    #[default]
    Disabled = 0,
    /// 拖拉机模式（静态稳定，不自平衡）
    Tractor = 1,
    /// 自平衡模式
    Balanced = 2,
    /// 断电
    PowerDown = 3,
}

/// 控制器增益表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, num_enum::TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[num_enum(error_type(name = ProtocolError, constructor = ProtocolError::invalid_gain_schedule))]
#[repr(u8)]
pub enum ControllerGainSchedule {
    /// 轻载
    #[default]
    Light = 0,
    /// 高重心
    Tall = 1,
    /// 重载
    Heavy = 2,
}

impl ProtocolError {
    fn invalid_mode(value: u8) -> Self {
        ProtocolError::InvalidValue {
            field: "OperationalMode",
            value: value.into(),
        }
    }

    fn invalid_gain_schedule(value: u8) -> Self {
        ProtocolError::InvalidValue {
            field: "ControllerGainSchedule",
            value: value.into(),
        }
    }
}

impl OperationalMode {
    /// 从遥测中的 16 位字解析
    ///
    /// 超出枚举范围时返回 `None`。
    pub fn from_word(word: i16) -> Option<Self> {
        u8::try_from(word).ok().and_then(|v| Self::try_from(v).ok())
    }
}

impl ControllerGainSchedule {
    /// 从遥测中的 16 位字解析
    ///
    /// 超出枚举范围时返回 `None`。
    pub fn from_word(word: i16) -> Option<Self> {
        u8::try_from(word).ok().and_then(|v| Self::try_from(v).ok())
    }
}

// ============================================================================
// 配置子功能
// ============================================================================

/// 配置子功能（Byte 5）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConfigFunction {
    /// 设置控制器增益表
    SetGainSchedule = 0x0D,
    /// 平衡模式锁定
    BalanceModeLock = 0x0F,
    /// 设置运行模式
    SetOperationalMode = 0x10,
    /// 复位积分器（参数为位掩码）
    ResetIntegrators = 0x32,
}

/// 可独立复位的积分器
///
/// 每个变体的值是复位命令参数字节中的对应位。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Integrator {
    LeftWheel = 0x01,
    RightWheel = 0x02,
    ForwardDisplacement = 0x04,
    TurnPosition = 0x08,
}

impl Integrator {
    /// 全部积分器（按复位顺序）
    pub const ALL: [Integrator; 4] = [
        Integrator::LeftWheel,
        Integrator::RightWheel,
        Integrator::ForwardDisplacement,
        Integrator::TurnPosition,
    ];

    /// 位掩码
    pub fn mask(self) -> u8 {
        self as u8
    }
}

/// 构建通用配置帧
///
/// Byte 5 = 子功能，Byte 7 = 参数，其余为 0。
pub fn encode_command(function: ConfigFunction, value: u8) -> RmpFrame {
    let mut data = [0u8; 8];
    data[FUNCTION_BYTE] = function as u8;
    data[VALUE_BYTE] = value;
    RmpFrame::new(ID_CONFIG_COMMAND, &data)
}

/// 配置指令 (0x0413)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigCommand {
    pub function: ConfigFunction,
    pub value: u8,
}

impl ConfigCommand {
    /// 设置运行模式
    pub fn operational_mode(mode: OperationalMode) -> Self {
        Self {
            function: ConfigFunction::SetOperationalMode,
            value: mode as u8,
        }
    }

    /// 设置控制器增益表
    pub fn gain_schedule(schedule: ControllerGainSchedule) -> Self {
        Self {
            function: ConfigFunction::SetGainSchedule,
            value: schedule as u8,
        }
    }

    /// 平衡模式锁定（`true` 禁止进入自平衡）
    pub fn balance_mode_lock(locked: bool) -> Self {
        Self {
            function: ConfigFunction::BalanceModeLock,
            value: u8::from(locked),
        }
    }

    /// 复位单个积分器
    pub fn reset_integrator(integrator: Integrator) -> Self {
        Self {
            function: ConfigFunction::ResetIntegrators,
            value: integrator.mask(),
        }
    }

    /// 转换为线路帧
    pub fn to_frame(self) -> RmpFrame {
        encode_command(self.function, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_wire_values() {
        assert_eq!(OperationalMode::Disabled as u8, 0);
        assert_eq!(OperationalMode::Tractor as u8, 1);
        assert_eq!(OperationalMode::Balanced as u8, 2);
        assert_eq!(OperationalMode::PowerDown as u8, 3);
        assert_eq!(OperationalMode::try_from(2).unwrap(), OperationalMode::Balanced);
    }

    #[test]
    fn test_gain_schedule_wire_values() {
        assert_eq!(ControllerGainSchedule::Light as u8, 0);
        assert_eq!(ControllerGainSchedule::Tall as u8, 1);
        assert_eq!(ControllerGainSchedule::Heavy as u8, 2);
        assert_eq!(
            ControllerGainSchedule::try_from(1).unwrap(),
            ControllerGainSchedule::Tall
        );
    }

    #[test]
    fn test_invalid_enum_values() {
        let err = OperationalMode::try_from(7).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::InvalidValue {
                field: "OperationalMode",
                value: 7
            }
        );
        assert!(ControllerGainSchedule::try_from(3).is_err());
    }

    #[test]
    fn test_from_word_rejects_out_of_range() {
        assert_eq!(OperationalMode::from_word(1), Some(OperationalMode::Tractor));
        assert_eq!(OperationalMode::from_word(-1), None);
        assert_eq!(OperationalMode::from_word(0x0102), None);
        assert_eq!(ControllerGainSchedule::from_word(3), None);
    }

    #[test]
    fn test_operational_mode_frame_layout() {
        let frame = ConfigCommand::operational_mode(OperationalMode::Balanced).to_frame();
        assert_eq!(frame.id, 0x0413);
        assert_eq!(frame.data, [0, 0, 0, 0, 0, 0x10, 0, 0x02]);
    }

    #[test]
    fn test_gain_schedule_frame_layout() {
        let frame = ConfigCommand::gain_schedule(ControllerGainSchedule::Heavy).to_frame();
        assert_eq!(frame.data, [0, 0, 0, 0, 0, 0x0D, 0, 0x02]);
    }

    #[test]
    fn test_balance_lock_frame_layout() {
        let locked = ConfigCommand::balance_mode_lock(true).to_frame();
        let unlocked = ConfigCommand::balance_mode_lock(false).to_frame();
        assert_eq!(locked.data, [0, 0, 0, 0, 0, 0x0F, 0, 0x01]);
        assert_eq!(unlocked.data, [0, 0, 0, 0, 0, 0x0F, 0, 0x00]);
    }

    #[test]
    fn test_integrator_reset_masks() {
        let masks: Vec<u8> = Integrator::ALL
            .iter()
            .map(|i| ConfigCommand::reset_integrator(*i).to_frame().data[VALUE_BYTE])
            .collect();
        assert_eq!(masks, vec![0x01, 0x02, 0x04, 0x08]);

        let frame = ConfigCommand::reset_integrator(Integrator::TurnPosition).to_frame();
        assert_eq!(frame.data, [0, 0, 0, 0, 0, 0x32, 0, 0x08]);
    }
}
