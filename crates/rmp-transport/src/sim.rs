//! 仿真平台
//!
//! 在 [`DeviceEndpoint`] 上运行的设备侧线程：按固定周期发送完整遥测周期，
//! 在若干周期后回显模式配置，并跟踪运动命令与积分器复位。

use crate::{DeviceEndpoint, RmpFrame, TransportError};
use parking_lot::Mutex;
use rmp_protocol::config::{ConfigFunction, FUNCTION_BYTE, VALUE_BYTE};
use rmp_protocol::constants::{MPS_TO_COUNTS, POSITION_DIVISOR, RADPS_TO_COUNTS, TURN_POSITION_DIVISOR};
use rmp_protocol::feedback::*;
use rmp_protocol::ids::*;
use rmp_protocol::{ControllerGainSchedule, Integrator, OperationalMode, bytes_to_i16_be};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, trace};

/// 仿真配置
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// 遥测周期
    pub cycle_period: Duration,
    /// 模式配置生效前经过的遥测周期数
    pub mode_echo_delay_cycles: u32,
    /// 上电模式
    pub initial_mode: OperationalMode,
    /// 电机是否使能
    pub motors_enabled: bool,
    /// UI 电池原始值
    pub ui_battery_raw: u16,
    /// 底盘电池原始值
    pub powerbase_battery_raw: u16,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            cycle_period: Duration::from_millis(10),
            mode_echo_delay_cycles: 2,
            initial_mode: OperationalMode::Disabled,
            motors_enabled: true,
            ui_battery_raw: 800,         // 11.4 V
            powerbase_battery_raw: 288,  // 72 V
        }
    }
}

/// 仿真设备状态
#[derive(Debug, Clone)]
struct SimState {
    mode: OperationalMode,
    gain_schedule: ControllerGainSchedule,
    pending_mode: Option<(OperationalMode, u32)>,
    balance_locked: bool,
    motors_enabled: bool,
    linear_counts: i16,
    angular_counts: i16,
    left_position: i32,
    right_position: i32,
    forward_position: i32,
    turn_position: i32,
    servo_frames: u16,
}

/// 仿真平台
pub struct SimulatedPlatform {
    running: Arc<AtomicBool>,
    state: Arc<Mutex<SimState>>,
    commands: Arc<Mutex<Vec<RmpFrame>>>,
    cycles: Arc<AtomicU64>,
    worker: Option<JoinHandle<DeviceEndpoint>>,
}

impl SimulatedPlatform {
    /// 在设备端点上启动仿真线程
    pub fn spawn(device: DeviceEndpoint, config: SimConfig) -> Result<Self, TransportError> {
        let running = Arc::new(AtomicBool::new(true));
        let state = Arc::new(Mutex::new(SimState {
            mode: config.initial_mode,
            gain_schedule: ControllerGainSchedule::Light,
            pending_mode: None,
            balance_locked: false,
            motors_enabled: config.motors_enabled,
            linear_counts: 0,
            angular_counts: 0,
            left_position: 0,
            right_position: 0,
            forward_position: 0,
            turn_position: 0,
            servo_frames: 0,
        }));
        let commands = Arc::new(Mutex::new(Vec::new()));
        let cycles = Arc::new(AtomicU64::new(0));

        let worker = {
            let running = running.clone();
            let state = state.clone();
            let commands = commands.clone();
            let cycles = cycles.clone();
            std::thread::Builder::new()
                .name("rmp-sim".into())
                .spawn(move || {
                    sim_loop(&device, &config, &running, &state, &commands, &cycles);
                    device
                })?
        };

        Ok(Self {
            running,
            state,
            commands,
            cycles,
            worker: Some(worker),
        })
    }

    /// 已收到的全部命令帧（按到达顺序）
    pub fn commands(&self) -> Vec<RmpFrame> {
        self.commands.lock().clone()
    }

    /// 已发送的完整遥测周期数
    pub fn cycles_emitted(&self) -> u64 {
        self.cycles.load(Ordering::Acquire)
    }

    /// 当前生效的模式
    pub fn mode(&self) -> OperationalMode {
        self.state.lock().mode
    }

    /// 当前增益表
    pub fn gain_schedule(&self) -> ControllerGainSchedule {
        self.state.lock().gain_schedule
    }

    /// 平衡模式是否锁定
    pub fn balance_locked(&self) -> bool {
        self.state.lock().balance_locked
    }

    /// 切换电机使能（模拟急停）
    pub fn set_motors_enabled(&self, enabled: bool) {
        self.state.lock().motors_enabled = enabled;
    }

    /// 停止仿真并取回设备端点
    pub fn stop(mut self) -> Option<DeviceEndpoint> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Option<DeviceEndpoint> {
        self.running.store(false, Ordering::Release);
        self.worker.take().and_then(|handle| handle.join().ok())
    }
}

impl Drop for SimulatedPlatform {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn sim_loop(
    device: &DeviceEndpoint,
    config: &SimConfig,
    running: &AtomicBool,
    state: &Mutex<SimState>,
    commands: &Mutex<Vec<RmpFrame>>,
    cycles: &AtomicU64,
) {
    let dt = config.cycle_period.as_secs_f64();

    while running.load(Ordering::Acquire) {
        for frame in device.drain_sent() {
            handle_command(&frame, config, &mut state.lock());
            commands.lock().push(frame);
        }

        let frames = {
            let mut state = state.lock();
            advance(&mut state, dt);
            cycle_frames(&state, config)
        };

        if device.push_frames(frames).is_err() {
            debug!("Simulated platform: driver side closed, stopping");
            break;
        }
        cycles.fetch_add(1, Ordering::AcqRel);
        std::thread::sleep(config.cycle_period);
    }
}

fn handle_command(frame: &RmpFrame, config: &SimConfig, state: &mut SimState) {
    if frame.id != ID_CONFIG_COMMAND {
        return;
    }
    let value = frame.data[VALUE_BYTE];
    match frame.data[FUNCTION_BYTE] {
        f if f == ConfigFunction::SetOperationalMode as u8 => {
            if let Ok(mode) = OperationalMode::try_from(value) {
                trace!("Simulated platform: mode {:?} pending", mode);
                state.pending_mode = Some((mode, config.mode_echo_delay_cycles));
            }
        },
        f if f == ConfigFunction::SetGainSchedule as u8 => {
            if let Ok(schedule) = ControllerGainSchedule::try_from(value) {
                state.gain_schedule = schedule;
            }
        },
        f if f == ConfigFunction::BalanceModeLock as u8 => {
            state.balance_locked = value != 0;
        },
        f if f == ConfigFunction::ResetIntegrators as u8 => {
            for integrator in Integrator::ALL {
                if value & integrator.mask() == 0 {
                    continue;
                }
                match integrator {
                    Integrator::LeftWheel => state.left_position = 0,
                    Integrator::RightWheel => state.right_position = 0,
                    Integrator::ForwardDisplacement => state.forward_position = 0,
                    Integrator::TurnPosition => state.turn_position = 0,
                }
            }
        },
        _ => {
            // 运动帧：Byte 0-3 为速度计数
            state.linear_counts = bytes_to_i16_be([frame.data[0], frame.data[1]]);
            state.angular_counts = bytes_to_i16_be([frame.data[2], frame.data[3]]);
        },
    }
}

fn advance(state: &mut SimState, dt: f64) {
    if let Some((mode, remaining)) = state.pending_mode {
        if remaining == 0 {
            state.mode = mode;
            state.pending_mode = None;
        } else {
            state.pending_mode = Some((mode, remaining - 1));
        }
    }

    let linear = f64::from(state.linear_counts) / MPS_TO_COUNTS;
    let angular = f64::from(state.angular_counts) / RADPS_TO_COUNTS;
    let forward_step = (linear * dt * POSITION_DIVISOR) as i32;
    let turn_step = (angular * dt * TURN_POSITION_DIVISOR) as i32;

    state.left_position = state.left_position.wrapping_add(forward_step);
    state.right_position = state.right_position.wrapping_add(forward_step);
    state.forward_position = state.forward_position.wrapping_add(forward_step);
    state.turn_position = state.turn_position.wrapping_add(turn_step);
    state.servo_frames = state.servo_frames.wrapping_add(1);
}

fn cycle_frames(state: &SimState, config: &SimConfig) -> Vec<RmpFrame> {
    let wheel_speed = state.linear_counts;
    vec![
        RmpFrame::new(ID_COMMAND_REQUEST, &[]),
        PitchRollFeedback::default().to_frame(),
        WheelSpeedFeedback {
            left_wheel_speed: wheel_speed,
            right_wheel_speed: wheel_speed,
            yaw_rate: 0,
            servo_frames: state.servo_frames,
        }
        .to_frame(),
        WheelPositionFeedback {
            left: state.left_position,
            right: state.right_position,
        }
        .to_frame(),
        DisplacementFeedback {
            forward: state.forward_position,
            turn: state.turn_position,
        }
        .to_frame(),
        MotorTorqueFeedback::default().to_frame(),
        ModeBatteryFeedback {
            mode_word: i16::from(state.mode as u8),
            gain_word: i16::from(state.gain_schedule as u8),
            ui_battery: config.ui_battery_raw,
            powerbase_battery: config.powerbase_battery_raw,
        }
        .to_frame(),
        CommandEchoFeedback {
            velocity: state.linear_counts,
            yaw_rate: state.angular_counts,
        }
        .to_frame(),
        MotorStatusFeedback {
            status_byte: if state.motors_enabled { 0x80 } else { 0x00 },
        }
        .to_frame(),
    ]
}
