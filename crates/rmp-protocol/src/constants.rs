//! 协议常量定义
//!
//! 遥测字段的缩放系数与运动命令的换算系数。

/// 线速度换算：1 m/s 对应的计数值
pub const MPS_TO_COUNTS: f64 = 332.0;

/// 角速度换算：1 rad/s 对应的计数值
pub const RADPS_TO_COUNTS: f64 = 1024.0;

/// 俯仰角除数（计数 → 度）
pub const PITCH_DIVISOR: f64 = 7.8;

/// 俯仰角速度、横滚角、横滚角速度除数
pub const ROLL_AND_RATE_DIVISOR: f64 = 7.78;

/// 轮速除数（计数 → m/s）
pub const WHEEL_SPEED_DIVISOR: f64 = 332.0;

/// 偏航角速度除数（计数 → deg/s）
pub const YAW_RATE_DIVISOR: f64 = 7.8;

/// 伺服帧计数比例
pub const SERVO_FRAMES_SCALE: f64 = 0.01;

/// 轮位置/前进位移除数（计数 → m）
pub const POSITION_DIVISOR: f64 = 33215.0;

/// 转向位置除数（计数 → rad）
pub const TURN_POSITION_DIVISOR: f64 = 112644.0;

/// 电机扭矩除数（计数 → Nm）
pub const TORQUE_DIVISOR: f64 = 1094.0;

/// UI 电池电压比例与偏置（V = raw × 0.0125 + 1.4）
pub const UI_BATTERY_SCALE: f64 = 0.0125;
pub const UI_BATTERY_OFFSET: f64 = 1.4;

/// 底盘电池电压除数
pub const POWERBASE_BATTERY_DIVISOR: f64 = 4.0;

/// 电机状态帧中表示“电机已使能”的字节值（`data[3]`）
pub const MOTORS_ENABLED_SENTINEL: u8 = 0x80;
