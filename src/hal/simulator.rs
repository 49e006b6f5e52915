// src/hal/simulator.rs
//! In-process firmware bus for bench runs and tests
//!
//! `SimulatedBus` answers the graph and board queries from its
//! configuration, delivers messages to subscribers either on demand
//! (`inject_*`, on the caller's thread) or from a streaming thread at a
//! fixed rate, and records every command published to it.

use crate::config::constants::{simulator, topics};
use crate::hal::{
    BatteryVoltage, BoardInspector, BoardType, Callback, FirmwareBus, HalError, ImuReading,
    Twist, Wheel, WheelStates,
};
use crossbeam::channel::{self, Sender};
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Nominal IMU output of the simulated board
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ImuProfile {
    pub accel: [f32; 3],
    pub gyro: [f32; 3],
    /// Uniform noise amplitude added to every channel
    pub noise: f32,
}

impl Default for ImuProfile {
    fn default() -> Self {
        Self {
            accel: [0.0, 0.0, simulator::DEFAULT_GRAVITY],
            gyro: [0.0, 0.0, 0.0],
            noise: 0.02,
        }
    }
}

/// Simulated bus behaviour
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub master_online: bool,
    pub bridge_node: String,
    pub bridge_node_active: bool,
    pub board: Option<BoardType>,
    pub firmware_version: Option<String>,
    pub publish_rate_hz: u32,
    pub imu: ImuProfile,
    pub battery_voltage: f32,
    pub battery_noise: f32,
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            master_online: true,
            bridge_node: topics::DEFAULT_BRIDGE_NODE.to_string(),
            bridge_node_active: true,
            board: Some(BoardType::LeoCore),
            firmware_version: Some(simulator::DEFAULT_FIRMWARE_VERSION.to_string()),
            publish_rate_hz: simulator::DEFAULT_PUBLISH_RATE_HZ,
            imu: ImuProfile::default(),
            battery_voltage: simulator::DEFAULT_BATTERY_VOLTAGE,
            battery_noise: 0.05,
            seed: None,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.publish_rate_hz == 0 || self.publish_rate_hz > 1000 {
            return Err(format!(
                "publish_rate_hz must be within 1..=1000, got {}",
                self.publish_rate_hz
            ));
        }
        for (field, value) in [("imu.noise", self.imu.noise), ("battery_noise", self.battery_noise)] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number, got {}", field, value));
            }
        }
        if !self.battery_voltage.is_finite() {
            return Err("battery_voltage must be finite".to_string());
        }
        Ok(())
    }

    fn publish_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.publish_rate_hz.max(1) as f64)
    }
}

/// Canned bench scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorProfile {
    Healthy,
    NoMaster,
    NoBridge,
    UnknownBoard,
    FaultyImu,
    LowBattery,
}

impl SimulatorProfile {
    /// Apply this scenario on top of `base`
    pub fn apply(self, mut base: SimulatorConfig) -> SimulatorConfig {
        match self {
            SimulatorProfile::Healthy => {}
            SimulatorProfile::NoMaster => base.master_online = false,
            SimulatorProfile::NoBridge => base.bridge_node_active = false,
            SimulatorProfile::UnknownBoard => {
                base.board = None;
                base.firmware_version = None;
            }
            SimulatorProfile::FaultyImu => base.imu.gyro = [0.8, 0.0, 0.0],
            SimulatorProfile::LowBattery => base.battery_voltage = 9.2,
        }
        base
    }
}

impl FromStr for SimulatorProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "healthy" => Ok(SimulatorProfile::Healthy),
            "no-master" => Ok(SimulatorProfile::NoMaster),
            "no-bridge" => Ok(SimulatorProfile::NoBridge),
            "unknown-board" => Ok(SimulatorProfile::UnknownBoard),
            "faulty-imu" => Ok(SimulatorProfile::FaultyImu),
            "low-battery" => Ok(SimulatorProfile::LowBattery),
            other => Err(format!(
                "unknown profile '{}', expected one of: healthy, no-master, no-bridge, unknown-board, faulty-imu, low-battery",
                other
            )),
        }
    }
}

/// Command captured by the simulated bus
#[derive(Debug, Clone, PartialEq)]
pub enum PublishedCommand {
    Velocity(Twist),
    WheelDuty { wheel: Wheel, duty: f32 },
}

impl PublishedCommand {
    pub fn topic(&self) -> String {
        match self {
            PublishedCommand::Velocity(_) => topics::CMD_VEL.to_string(),
            PublishedCommand::WheelDuty { wheel, .. } => wheel.duty_topic(),
        }
    }
}

#[derive(Default)]
struct Subscribers {
    imu: RwLock<Vec<Callback<ImuReading>>>,
    wheel_states: RwLock<Vec<Callback<WheelStates>>>,
    battery: RwLock<Vec<Callback<BatteryVoltage>>>,
}

impl Subscribers {
    fn deliver_imu(&self, reading: ImuReading) {
        for callback in self.imu.read().iter() {
            callback(reading);
        }
    }

    fn deliver_wheel_states(&self, states: WheelStates) {
        for callback in self.wheel_states.read().iter() {
            callback(states);
        }
    }

    fn deliver_battery(&self, voltage: BatteryVoltage) {
        for callback in self.battery.read().iter() {
            callback(voltage);
        }
    }

    fn count(&self) -> usize {
        self.imu.read().len() + self.wheel_states.read().len() + self.battery.read().len()
    }
}

struct Streamer {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Firmware bus living inside this process
pub struct SimulatedBus {
    config: SimulatorConfig,
    subscribers: Arc<Subscribers>,
    duty: Arc<Mutex<[f32; 4]>>,
    node: Mutex<Option<String>>,
    published: Mutex<Vec<PublishedCommand>>,
    streamer: Mutex<Option<Streamer>>,
}

impl SimulatedBus {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            subscribers: Arc::new(Subscribers::default()),
            duty: Arc::new(Mutex::new([0.0; 4])),
            node: Mutex::new(None),
            published: Mutex::new(Vec::new()),
            streamer: Mutex::new(None),
        }
    }

    pub fn healthy() -> Self {
        Self::new(SimulatorConfig::default())
    }

    pub fn with_profile(profile: SimulatorProfile) -> Self {
        Self::new(profile.apply(SimulatorConfig::default()))
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Name this process registered under, if any
    pub fn registered_node(&self) -> Option<String> {
        self.node.lock().clone()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscribers.count()
    }

    pub fn published_commands(&self) -> Vec<PublishedCommand> {
        self.published.lock().clone()
    }

    /// Deliver an IMU reading to subscribers on the calling thread
    pub fn inject_imu(&self, reading: ImuReading) {
        self.subscribers.deliver_imu(reading);
    }

    pub fn inject_wheel_states(&self, states: WheelStates) {
        self.subscribers.deliver_wheel_states(states);
    }

    pub fn inject_battery(&self, voltage: f32) {
        self.subscribers.deliver_battery(BatteryVoltage { voltage });
    }

    /// Start publishing firmware topics at the configured rate.
    ///
    /// Nothing is published when the master or the bridge node is down.
    pub fn start_streaming(&self) {
        let mut streamer = self.streamer.lock();
        if streamer.is_some() || !self.config.master_online || !self.config.bridge_node_active {
            return;
        }

        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let ticker = channel::tick(self.config.publish_period());
        let config = self.config.clone();
        let subscribers = Arc::clone(&self.subscribers);
        let duty = Arc::clone(&self.duty);

        let handle = thread::spawn(move || {
            let mut generator = SampleGenerator::new(&config);
            let start = Instant::now();
            loop {
                channel::select! {
                    recv(ticker) -> _ => {
                        let stamp = start.elapsed().as_secs_f64();
                        subscribers.deliver_imu(generator.imu(stamp));
                        subscribers.deliver_battery(generator.battery());
                        subscribers.deliver_wheel_states(generator.wheel_states(stamp, *duty.lock()));
                    }
                    recv(stop_rx) -> _ => break,
                }
            }
        });

        info!(rate_hz = self.config.publish_rate_hz, "simulated firmware streaming started");
        *streamer = Some(Streamer {
            stop: stop_tx,
            handle,
        });
    }

    pub fn stop_streaming(&self) {
        if let Some(streamer) = self.streamer.lock().take() {
            let _ = streamer.stop.send(());
            let _ = streamer.handle.join();
            debug!("simulated firmware streaming stopped");
        }
    }

    fn require_node(&self, topic: String) -> Result<(), HalError> {
        if self.node.lock().is_some() {
            Ok(())
        } else {
            Err(HalError::PublishFailed {
                topic,
                reason: "node is not initialized".to_string(),
            })
        }
    }

    fn require_master(&self, topic: &str) -> Result<(), HalError> {
        if self.config.master_online {
            Ok(())
        } else {
            Err(HalError::SubscribeFailed {
                topic: topic.to_string(),
                reason: HalError::MasterOffline.to_string(),
            })
        }
    }
}

impl Drop for SimulatedBus {
    fn drop(&mut self) {
        self.stop_streaming();
    }
}

impl FirmwareBus for SimulatedBus {
    fn is_master_online(&self) -> bool {
        self.config.master_online
    }

    fn node_names(&self) -> Result<Vec<String>, HalError> {
        if !self.config.master_online {
            return Err(HalError::MasterOffline);
        }
        let mut names = vec!["/rosout".to_string()];
        if self.config.bridge_node_active {
            names.push(self.resolve_name(&self.config.bridge_node));
        }
        if let Some(node) = self.node.lock().as_ref() {
            names.push(node.clone());
        }
        Ok(names)
    }

    fn init_node(&self, name: &str, anonymous: bool) -> Result<(), HalError> {
        if !self.config.master_online {
            return Err(HalError::MasterOffline);
        }
        let mut resolved = self.resolve_name(name);
        if anonymous {
            let suffix: u32 = rand::thread_rng().gen();
            resolved = format!("{}_{}", resolved, suffix);
        }
        debug!(node = %resolved, "registered simulated node");
        *self.node.lock() = Some(resolved);
        Ok(())
    }

    fn subscribe_imu(&self, callback: Callback<ImuReading>) -> Result<(), HalError> {
        self.require_master(topics::IMU)?;
        self.subscribers.imu.write().push(callback);
        Ok(())
    }

    fn subscribe_wheel_states(&self, callback: Callback<WheelStates>) -> Result<(), HalError> {
        self.require_master(topics::WHEEL_STATES)?;
        self.subscribers.wheel_states.write().push(callback);
        Ok(())
    }

    fn subscribe_battery(&self, callback: Callback<BatteryVoltage>) -> Result<(), HalError> {
        self.require_master(topics::BATTERY)?;
        self.subscribers.battery.write().push(callback);
        Ok(())
    }

    fn publish_cmd_vel(&self, command: Twist) -> Result<(), HalError> {
        self.require_node(topics::CMD_VEL.to_string())?;
        self.published.lock().push(PublishedCommand::Velocity(command));
        Ok(())
    }

    fn publish_wheel_duty(&self, wheel: Wheel, duty: f32) -> Result<(), HalError> {
        self.require_node(wheel.duty_topic())?;
        self.duty.lock()[wheel.index()] = duty;
        self.published
            .lock()
            .push(PublishedCommand::WheelDuty { wheel, duty });
        Ok(())
    }
}

impl BoardInspector for SimulatedBus {
    fn determine_board(&self) -> Option<BoardType> {
        if self.config.bridge_node_active {
            self.config.board
        } else {
            None
        }
    }

    fn firmware_version(&self) -> Option<String> {
        if self.config.bridge_node_active {
            self.config.firmware_version.clone()
        } else {
            None
        }
    }
}

/// Produces noisy readings around the configured nominal values
struct SampleGenerator {
    rng: StdRng,
    imu: ImuProfile,
    battery_voltage: f32,
    battery_noise: f32,
    period_secs: f32,
    position: [f32; 4],
}

/// Wheel speed in rad/s per percent of PWM duty
const SPEED_PER_DUTY: f32 = 0.1;

impl SampleGenerator {
    fn new(config: &SimulatorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            imu: config.imu.clone(),
            battery_voltage: config.battery_voltage,
            battery_noise: config.battery_noise,
            period_secs: config.publish_period().as_secs_f32(),
            position: [0.0; 4],
        }
    }

    fn noise(&mut self, amplitude: f32) -> f32 {
        if amplitude > 0.0 {
            self.rng.gen_range(-amplitude..=amplitude)
        } else {
            0.0
        }
    }

    fn imu(&mut self, stamp: f64) -> ImuReading {
        let amplitude = self.imu.noise;
        let accel = self.imu.accel;
        let gyro = self.imu.gyro;
        ImuReading {
            stamp,
            accel_x: accel[0] + self.noise(amplitude),
            accel_y: accel[1] + self.noise(amplitude),
            accel_z: accel[2] + self.noise(amplitude),
            gyro_x: gyro[0] + self.noise(amplitude),
            gyro_y: gyro[1] + self.noise(amplitude),
            gyro_z: gyro[2] + self.noise(amplitude),
        }
    }

    fn battery(&mut self) -> BatteryVoltage {
        let noise = self.noise(self.battery_noise);
        BatteryVoltage {
            voltage: self.battery_voltage + noise,
        }
    }

    fn wheel_states(&mut self, stamp: f64, duty: [f32; 4]) -> WheelStates {
        let velocity = duty.map(|d| d * SPEED_PER_DUTY);
        for (position, speed) in self.position.iter_mut().zip(velocity) {
            *position += speed * self.period_secs;
        }
        WheelStates {
            stamp,
            position: self.position,
            velocity,
            torque: duty.map(|d| d * 0.01),
            pwm_duty_cycle: duty,
        }
    }
}
