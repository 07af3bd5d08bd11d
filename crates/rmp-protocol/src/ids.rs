//! 帧 ID 与通道常量定义
//!
//! 定义所有协议帧的 ID 常量，并提供 ID 分类功能。

/// 遥测通道（A）
pub const CHANNEL_A: u8 = 0xAA;

/// 非遥测通道（B），其上的帧一律忽略
pub const CHANNEL_B: u8 = 0xBB;

// ============================================================================
// 遥测帧 ID 常量（按一个遥测周期内的到达顺序）
// ============================================================================

/// 命令请求回显（已知，无状态字段）
pub const ID_COMMAND_REQUEST: u16 = 0x0400;

/// 俯仰/横滚角及角速度
pub const ID_PITCH_ROLL: u16 = 0x0401;

/// 左右轮速、偏航角速度、伺服帧计数
pub const ID_WHEEL_SPEED_YAW: u16 = 0x0402;

/// 左右轮积分位置
pub const ID_WHEEL_POSITION: u16 = 0x0403;

/// 积分前进位移与积分转向位置
pub const ID_DISPLACEMENT: u16 = 0x0404;

/// 左右电机扭矩
pub const ID_MOTOR_TORQUE: u16 = 0x0405;

/// 运行模式、增益表、电池电压
pub const ID_MODE_BATTERY: u16 = 0x0406;

/// 平台回显的指令速度/偏航角速度（遥测周期结束标记）
pub const ID_COMMAND_ECHO: u16 = 0x0407;

/// 电机使能状态（不属于遥测周期）
pub const ID_MOTOR_STATUS: u16 = 0x0680;

// ============================================================================
// 命令帧 ID 常量
// ============================================================================

/// 配置/运动命令帧（所有出站命令共用）
pub const ID_CONFIG_COMMAND: u16 = 0x0413;

/// 一个完整遥测周期的帧 ID 序列
pub const TELEMETRY_CYCLE: [u16; 8] = [
    ID_COMMAND_REQUEST,
    ID_PITCH_ROLL,
    ID_WHEEL_SPEED_YAW,
    ID_WHEEL_POSITION,
    ID_DISPLACEMENT,
    ID_MOTOR_TORQUE,
    ID_MODE_BATTERY,
    ID_COMMAND_ECHO,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_cycle_is_ordered_and_terminated() {
        assert!(TELEMETRY_CYCLE.windows(2).all(|w| w[1] == w[0] + 1));
        assert_eq!(TELEMETRY_CYCLE.last(), Some(&ID_COMMAND_ECHO));
    }
}
