//! 状态快照
//!
//! 由遥测帧逐字段写入，一个完整遥测周期结束后可作为一致的快照发布。

use crate::config::{ControllerGainSchedule, OperationalMode};
use std::fmt;

/// 平台状态快照
///
/// 创建时为空（`touched == false`），随遥测帧到达被原地更新。
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusSnapshot {
    /// 俯仰角（度）
    pub pitch: f64,
    /// 俯仰角速度（度/秒）
    pub pitch_rate: f64,
    /// 横滚角（度）
    pub roll: f64,
    /// 横滚角速度（度/秒）
    pub roll_rate: f64,
    /// 左轮速度（m/s）
    pub left_wheel_speed: f64,
    /// 右轮速度（m/s）
    pub right_wheel_speed: f64,
    /// 偏航角速度（度/秒）
    pub yaw_rate: f64,
    /// 伺服帧计数
    pub servo_frames: f64,
    /// 左轮积分位置（m）
    pub integrated_left_wheel_position: f64,
    /// 右轮积分位置（m）
    pub integrated_right_wheel_position: f64,
    /// 积分前进位移（m）
    pub integrated_forward_position: f64,
    /// 积分转向位置（rad）
    pub integrated_turn_position: f64,
    /// 左电机扭矩（Nm）
    pub left_motor_torque: f64,
    /// 右电机扭矩（Nm）
    pub right_motor_torque: f64,
    /// UI 电池电压（V）
    pub ui_battery_voltage: f64,
    /// 底盘电池电压（V）
    pub powerbase_battery_voltage: f64,
    /// 运行模式（平台回显）
    pub operational_mode: OperationalMode,
    /// 控制器增益表（平台回显）
    pub controller_gain_schedule: ControllerGainSchedule,
    /// 平台回显的指令线速度（m/s）
    pub commanded_velocity: f64,
    /// 平台回显的指令偏航角速度（rad/s）
    pub commanded_yaw_rate: f64,
    /// 电机是否使能（`false` 表示急停）
    pub motors_enabled: bool,
    /// 是否至少写入过一个字段
    pub touched: bool,
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Segway Status:")?;
        writeln!(f, "Pitch: {}", self.pitch)?;
        writeln!(f, "Pitch Rate: {}", self.pitch_rate)?;
        writeln!(f, "Roll: {}", self.roll)?;
        writeln!(f, "Roll Rate: {}", self.roll_rate)?;
        writeln!(f, "Left Wheel Speed: {}", self.left_wheel_speed)?;
        writeln!(f, "Right Wheel Speed: {}", self.right_wheel_speed)?;
        writeln!(f, "Yaw Rate: {}", self.yaw_rate)?;
        writeln!(f, "Servo Frames: {}", self.servo_frames)?;
        writeln!(
            f,
            "Integrated Left Wheel Position: {}",
            self.integrated_left_wheel_position
        )?;
        writeln!(
            f,
            "Integrated Right Wheel Position: {}",
            self.integrated_right_wheel_position
        )?;
        writeln!(
            f,
            "Integrated Forward Displacement: {}",
            self.integrated_forward_position
        )?;
        writeln!(f, "Integrated Turn Position: {}", self.integrated_turn_position)?;
        writeln!(f, "Left Motor Torque: {}", self.left_motor_torque)?;
        writeln!(f, "Right Motor Torque: {}", self.right_motor_torque)?;
        writeln!(f, "UI Battery Voltage: {}", self.ui_battery_voltage)?;
        writeln!(
            f,
            "Powerbase Battery Voltage: {}",
            self.powerbase_battery_voltage
        )?;
        writeln!(f, "Operational Mode: {:?}", self.operational_mode)?;
        writeln!(
            f,
            "Controller Gain Schedule: {:?}",
            self.controller_gain_schedule
        )?;
        writeln!(f, "Commanded Velocity: {}", self.commanded_velocity)?;
        writeln!(f, "Commanded Yaw Rate: {}", self.commanded_yaw_rate)?;
        let motors = if self.motors_enabled {
            "Motors Enabled"
        } else {
            "E-Stopped"
        };
        write!(f, "Motor Status: {}", motors)
    }
}
