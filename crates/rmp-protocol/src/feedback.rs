//! 遥测帧解析
//!
//! 每个遥测帧 ID 对应一个类型化结构体（保存原始计数值），
//! [`decode`] 将其按协议缩放系数写入 [`StatusSnapshot`]。
//!
//! # 兼容性说明
//!
//! 右轮速度、偏航角速度、右电机扭矩、增益表和指令偏航角速度沿用与
//! 左轮速度/左电机扭矩/运行模式/指令线速度相同的字节（Byte 0-1）。
//! 结构体仍按设备布局保存全部字段，但 [`Telemetry::apply_to`] 保持旧映射，
//! 修正映射属于显式的兼容性变更。

use crate::config::{ControllerGainSchedule, OperationalMode};
use crate::constants::*;
use crate::ids::*;
use crate::status::StatusSnapshot;
use crate::{
    ProtocolError, RmpFrame, bytes_to_i16_be, bytes_to_u16_be, i16_to_bytes_be,
    i32_to_word_swapped, word_swapped_i32,
};

/// 校验帧 ID 与通道
fn check_frame(frame: &RmpFrame, expected_id: u16) -> Result<(), ProtocolError> {
    if frame.id != expected_id {
        return Err(ProtocolError::InvalidFrameId { id: frame.id });
    }
    if !frame.is_telemetry_channel() {
        return Err(ProtocolError::InvalidChannel {
            id: frame.id,
            channel: frame.channel,
        });
    }
    Ok(())
}

fn i16_at(data: &[u8; 8], offset: usize) -> i16 {
    bytes_to_i16_be([data[offset], data[offset + 1]])
}

fn u16_at(data: &[u8; 8], offset: usize) -> u16 {
    bytes_to_u16_be([data[offset], data[offset + 1]])
}

fn swapped_i32_at(data: &[u8; 8], offset: usize) -> i32 {
    word_swapped_i32([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

// ============================================================================
// 0x0401 俯仰/横滚
// ============================================================================

/// 俯仰/横滚反馈 (0x0401)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PitchRollFeedback {
    pub pitch: i16,      // Byte 0-1
    pub pitch_rate: i16, // Byte 2-3
    pub roll: i16,       // Byte 4-5
    pub roll_rate: i16,  // Byte 6-7
}

impl PitchRollFeedback {
    /// 俯仰角（度）
    pub fn pitch_deg(&self) -> f64 {
        f64::from(self.pitch) / PITCH_DIVISOR
    }

    /// 俯仰角速度（度/秒）
    pub fn pitch_rate_dps(&self) -> f64 {
        f64::from(self.pitch_rate) / ROLL_AND_RATE_DIVISOR
    }

    /// 横滚角（度）
    pub fn roll_deg(&self) -> f64 {
        f64::from(self.roll) / ROLL_AND_RATE_DIVISOR
    }

    /// 横滚角速度（度/秒）
    pub fn roll_rate_dps(&self) -> f64 {
        f64::from(self.roll_rate) / ROLL_AND_RATE_DIVISOR
    }

    pub fn to_frame(self) -> RmpFrame {
        let mut data = [0u8; 8];
        data[0..2].copy_from_slice(&i16_to_bytes_be(self.pitch));
        data[2..4].copy_from_slice(&i16_to_bytes_be(self.pitch_rate));
        data[4..6].copy_from_slice(&i16_to_bytes_be(self.roll));
        data[6..8].copy_from_slice(&i16_to_bytes_be(self.roll_rate));
        RmpFrame::new(ID_PITCH_ROLL, &data)
    }
}

impl TryFrom<RmpFrame> for PitchRollFeedback {
    type Error = ProtocolError;

    fn try_from(frame: RmpFrame) -> Result<Self, Self::Error> {
        check_frame(&frame, ID_PITCH_ROLL)?;
        Ok(Self {
            pitch: i16_at(&frame.data, 0),
            pitch_rate: i16_at(&frame.data, 2),
            roll: i16_at(&frame.data, 4),
            roll_rate: i16_at(&frame.data, 6),
        })
    }
}

// ============================================================================
// 0x0402 轮速/偏航
// ============================================================================

/// 轮速/偏航反馈 (0x0402)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WheelSpeedFeedback {
    pub left_wheel_speed: i16,  // Byte 0-1
    pub right_wheel_speed: i16, // Byte 2-3（旧映射未使用）
    pub yaw_rate: i16,          // Byte 4-5（旧映射未使用）
    pub servo_frames: u16,      // Byte 6-7，无符号
}

impl WheelSpeedFeedback {
    pub fn to_frame(self) -> RmpFrame {
        let mut data = [0u8; 8];
        data[0..2].copy_from_slice(&i16_to_bytes_be(self.left_wheel_speed));
        data[2..4].copy_from_slice(&i16_to_bytes_be(self.right_wheel_speed));
        data[4..6].copy_from_slice(&i16_to_bytes_be(self.yaw_rate));
        data[6..8].copy_from_slice(&self.servo_frames.to_be_bytes());
        RmpFrame::new(ID_WHEEL_SPEED_YAW, &data)
    }
}

impl TryFrom<RmpFrame> for WheelSpeedFeedback {
    type Error = ProtocolError;

    fn try_from(frame: RmpFrame) -> Result<Self, Self::Error> {
        check_frame(&frame, ID_WHEEL_SPEED_YAW)?;
        Ok(Self {
            left_wheel_speed: i16_at(&frame.data, 0),
            right_wheel_speed: i16_at(&frame.data, 2),
            yaw_rate: i16_at(&frame.data, 4),
            servo_frames: u16_at(&frame.data, 6),
        })
    }
}

// ============================================================================
// 0x0403 轮积分位置
// ============================================================================

/// 轮积分位置反馈 (0x0403)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WheelPositionFeedback {
    pub left: i32,  // Byte 0-3，字交换
    pub right: i32, // Byte 4-7，字交换
}

impl WheelPositionFeedback {
    pub fn to_frame(self) -> RmpFrame {
        let mut data = [0u8; 8];
        data[0..4].copy_from_slice(&i32_to_word_swapped(self.left));
        data[4..8].copy_from_slice(&i32_to_word_swapped(self.right));
        RmpFrame::new(ID_WHEEL_POSITION, &data)
    }
}

impl TryFrom<RmpFrame> for WheelPositionFeedback {
    type Error = ProtocolError;

    fn try_from(frame: RmpFrame) -> Result<Self, Self::Error> {
        check_frame(&frame, ID_WHEEL_POSITION)?;
        Ok(Self {
            left: swapped_i32_at(&frame.data, 0),
            right: swapped_i32_at(&frame.data, 4),
        })
    }
}

// ============================================================================
// 0x0404 前进位移/转向位置
// ============================================================================

/// 积分前进位移/转向位置反馈 (0x0404)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplacementFeedback {
    pub forward: i32, // Byte 0-3，字交换
    pub turn: i32,    // Byte 4-7，字交换
}

impl DisplacementFeedback {
    pub fn to_frame(self) -> RmpFrame {
        let mut data = [0u8; 8];
        data[0..4].copy_from_slice(&i32_to_word_swapped(self.forward));
        data[4..8].copy_from_slice(&i32_to_word_swapped(self.turn));
        RmpFrame::new(ID_DISPLACEMENT, &data)
    }
}

impl TryFrom<RmpFrame> for DisplacementFeedback {
    type Error = ProtocolError;

    fn try_from(frame: RmpFrame) -> Result<Self, Self::Error> {
        check_frame(&frame, ID_DISPLACEMENT)?;
        Ok(Self {
            forward: swapped_i32_at(&frame.data, 0),
            turn: swapped_i32_at(&frame.data, 4),
        })
    }
}

// ============================================================================
// 0x0405 电机扭矩
// ============================================================================

/// 电机扭矩反馈 (0x0405)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotorTorqueFeedback {
    pub left: i16,  // Byte 0-1
    pub right: i16, // Byte 2-3（旧映射未使用）
}

impl MotorTorqueFeedback {
    pub fn to_frame(self) -> RmpFrame {
        let mut data = [0u8; 8];
        data[0..2].copy_from_slice(&i16_to_bytes_be(self.left));
        data[2..4].copy_from_slice(&i16_to_bytes_be(self.right));
        RmpFrame::new(ID_MOTOR_TORQUE, &data)
    }
}

impl TryFrom<RmpFrame> for MotorTorqueFeedback {
    type Error = ProtocolError;

    fn try_from(frame: RmpFrame) -> Result<Self, Self::Error> {
        check_frame(&frame, ID_MOTOR_TORQUE)?;
        Ok(Self {
            left: i16_at(&frame.data, 0),
            right: i16_at(&frame.data, 2),
        })
    }
}

// ============================================================================
// 0x0406 模式/增益表/电池
// ============================================================================

/// 模式/增益表/电池反馈 (0x0406)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeBatteryFeedback {
    pub mode_word: i16,          // Byte 0-1
    pub gain_word: i16,          // Byte 2-3（旧映射未使用）
    pub ui_battery: u16,         // Byte 4-5，无符号
    pub powerbase_battery: u16,  // Byte 6-7，无符号
}

impl ModeBatteryFeedback {
    /// UI 电池电压（V）
    pub fn ui_battery_volts(&self) -> f64 {
        f64::from(self.ui_battery) * UI_BATTERY_SCALE + UI_BATTERY_OFFSET
    }

    /// 底盘电池电压（V）
    pub fn powerbase_battery_volts(&self) -> f64 {
        f64::from(self.powerbase_battery) / POWERBASE_BATTERY_DIVISOR
    }

    pub fn to_frame(self) -> RmpFrame {
        let mut data = [0u8; 8];
        data[0..2].copy_from_slice(&i16_to_bytes_be(self.mode_word));
        data[2..4].copy_from_slice(&i16_to_bytes_be(self.gain_word));
        data[4..6].copy_from_slice(&self.ui_battery.to_be_bytes());
        data[6..8].copy_from_slice(&self.powerbase_battery.to_be_bytes());
        RmpFrame::new(ID_MODE_BATTERY, &data)
    }
}

impl TryFrom<RmpFrame> for ModeBatteryFeedback {
    type Error = ProtocolError;

    fn try_from(frame: RmpFrame) -> Result<Self, Self::Error> {
        check_frame(&frame, ID_MODE_BATTERY)?;
        Ok(Self {
            mode_word: i16_at(&frame.data, 0),
            gain_word: i16_at(&frame.data, 2),
            ui_battery: u16_at(&frame.data, 4),
            powerbase_battery: u16_at(&frame.data, 6),
        })
    }
}

// ============================================================================
// 0x0407 指令回显（周期结束）
// ============================================================================

/// 指令速度回显 (0x0407)，遥测周期的最后一帧
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandEchoFeedback {
    pub velocity: i16, // Byte 0-1
    pub yaw_rate: i16, // Byte 2-3（旧映射未使用）
}

impl CommandEchoFeedback {
    pub fn to_frame(self) -> RmpFrame {
        let mut data = [0u8; 8];
        data[0..2].copy_from_slice(&i16_to_bytes_be(self.velocity));
        data[2..4].copy_from_slice(&i16_to_bytes_be(self.yaw_rate));
        RmpFrame::new(ID_COMMAND_ECHO, &data)
    }
}

impl TryFrom<RmpFrame> for CommandEchoFeedback {
    type Error = ProtocolError;

    fn try_from(frame: RmpFrame) -> Result<Self, Self::Error> {
        check_frame(&frame, ID_COMMAND_ECHO)?;
        Ok(Self {
            velocity: i16_at(&frame.data, 0),
            yaw_rate: i16_at(&frame.data, 2),
        })
    }
}

// ============================================================================
// 0x0680 电机状态
// ============================================================================

/// 电机使能状态 (0x0680)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotorStatusFeedback {
    pub status_byte: u8, // Byte 3
}

impl MotorStatusFeedback {
    /// 电机是否使能（否则为急停）
    pub fn motors_enabled(&self) -> bool {
        self.status_byte == MOTORS_ENABLED_SENTINEL
    }

    pub fn to_frame(self) -> RmpFrame {
        let mut data = [0u8; 8];
        data[3] = self.status_byte;
        RmpFrame::new(ID_MOTOR_STATUS, &data)
    }
}

impl TryFrom<RmpFrame> for MotorStatusFeedback {
    type Error = ProtocolError;

    fn try_from(frame: RmpFrame) -> Result<Self, Self::Error> {
        check_frame(&frame, ID_MOTOR_STATUS)?;
        Ok(Self {
            status_byte: frame.data[3],
        })
    }
}

// ============================================================================
// 统一解析
// ============================================================================

/// 遥测消息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Telemetry {
    PitchRoll(PitchRollFeedback),
    WheelSpeed(WheelSpeedFeedback),
    WheelPosition(WheelPositionFeedback),
    Displacement(DisplacementFeedback),
    MotorTorque(MotorTorqueFeedback),
    ModeBattery(ModeBatteryFeedback),
    CommandEcho(CommandEchoFeedback),
    MotorStatus(MotorStatusFeedback),
}

impl Telemetry {
    /// 解析遥测帧
    ///
    /// 非遥测通道、命令请求回显 (0x0400) 和未知 ID 返回 `None`。
    pub fn parse(frame: &RmpFrame) -> Option<Self> {
        let frame = *frame;
        let telemetry = match frame.id {
            ID_PITCH_ROLL => Telemetry::PitchRoll(frame.try_into().ok()?),
            ID_WHEEL_SPEED_YAW => Telemetry::WheelSpeed(frame.try_into().ok()?),
            ID_WHEEL_POSITION => Telemetry::WheelPosition(frame.try_into().ok()?),
            ID_DISPLACEMENT => Telemetry::Displacement(frame.try_into().ok()?),
            ID_MOTOR_TORQUE => Telemetry::MotorTorque(frame.try_into().ok()?),
            ID_MODE_BATTERY => Telemetry::ModeBattery(frame.try_into().ok()?),
            ID_COMMAND_ECHO => Telemetry::CommandEcho(frame.try_into().ok()?),
            ID_MOTOR_STATUS => Telemetry::MotorStatus(frame.try_into().ok()?),
            _ => return None,
        };
        Some(telemetry)
    }

    /// 写入状态快照
    ///
    /// 返回该消息是否结束了一个遥测周期（仅 0x0407）。
    pub fn apply_to(&self, status: &mut StatusSnapshot) -> bool {
        match self {
            Telemetry::PitchRoll(fb) => {
                status.pitch = fb.pitch_deg();
                status.pitch_rate = fb.pitch_rate_dps();
                status.roll = fb.roll_deg();
                status.roll_rate = fb.roll_rate_dps();
            },
            Telemetry::WheelSpeed(fb) => {
                let word = f64::from(fb.left_wheel_speed);
                status.left_wheel_speed = word / WHEEL_SPEED_DIVISOR;
                status.right_wheel_speed = word / WHEEL_SPEED_DIVISOR;
                status.yaw_rate = word / YAW_RATE_DIVISOR;
                status.servo_frames = f64::from(fb.servo_frames) * SERVO_FRAMES_SCALE;
            },
            Telemetry::WheelPosition(fb) => {
                status.integrated_left_wheel_position = f64::from(fb.left) / POSITION_DIVISOR;
                status.integrated_right_wheel_position = f64::from(fb.right) / POSITION_DIVISOR;
            },
            Telemetry::Displacement(fb) => {
                status.integrated_forward_position = f64::from(fb.forward) / POSITION_DIVISOR;
                status.integrated_turn_position = f64::from(fb.turn) / TURN_POSITION_DIVISOR;
            },
            Telemetry::MotorTorque(fb) => {
                let word = f64::from(fb.left);
                status.left_motor_torque = word / TORQUE_DIVISOR;
                status.right_motor_torque = word / TORQUE_DIVISOR;
            },
            Telemetry::ModeBattery(fb) => {
                // 超出枚举范围的模式字保留旧值
                if let Some(mode) = OperationalMode::from_word(fb.mode_word) {
                    status.operational_mode = mode;
                }
                if let Some(schedule) = ControllerGainSchedule::from_word(fb.mode_word) {
                    status.controller_gain_schedule = schedule;
                }
                status.ui_battery_voltage = fb.ui_battery_volts();
                status.powerbase_battery_voltage = fb.powerbase_battery_volts();
            },
            Telemetry::CommandEcho(fb) => {
                let word = f64::from(fb.velocity);
                status.commanded_velocity = word / MPS_TO_COUNTS;
                status.commanded_yaw_rate = word / RADPS_TO_COUNTS;
            },
            Telemetry::MotorStatus(fb) => {
                status.motors_enabled = fb.motors_enabled();
            },
        }
        status.touched = true;
        matches!(self, Telemetry::CommandEcho(_))
    }
}

/// 解析一帧并更新状态快照
///
/// - 非遥测通道（B）的帧：不修改状态，返回 `false`
/// - 0x0401-0x0406、0x0680：更新对应字段，返回 `false`
/// - 0x0407：更新指令回显字段，返回 `true`（遥测周期结束）
/// - 其它 ID：忽略，返回 `false`
pub fn decode(frame: &RmpFrame, status: &mut StatusSnapshot) -> bool {
    if !frame.is_telemetry_channel() {
        return false;
    }
    match Telemetry::parse(frame) {
        Some(telemetry) => telemetry.apply_to(status),
        None => false,
    }
}
