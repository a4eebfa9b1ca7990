//! Input events to actuator state to link writes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use rckart_errors::{ErrorSeverity, KartError, LinkResult, SensorError};
use rckart_input::{
    ActuatorState, RampController, RampDirection, TiltSample, TiltSmoother,
    map_slider_to_steering, map_tilt_to_steering_with_limit,
};
use rckart_link::{LinkSession, Transport};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::ControlConfig;
use crate::runtime::ControlCommand;
use crate::sensor::OrientationSensor;
use crate::snapshot::ControlSnapshot;

/// Permission prompt followed by the sensor subscription, started by
/// [`ControlCore::begin_toggle_tilt`].
pub type TiltRequest =
    Pin<Box<dyn Future<Output = Result<mpsc::Receiver<TiltSample>, SensorError>> + Send>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ObservedLink {
    connected: bool,
    generation: u64,
    drops: u64,
}

struct TiltState {
    enabled: bool,
    smoother: TiltSmoother,
    /// Stream handed out by `toggle_tilt` and not yet claimed by a driver.
    unclaimed: Option<mpsc::Receiver<TiltSample>>,
}

/// Owns actuator state and turns input events into link writes.
///
/// Every mutation goes through a clamping setter, and every write goes
/// through the link session, which drops it unless connected. Any observed
/// loss of connection cancels both ramps and zeroes the local motor, and
/// every new connection starts from neutral, so a reconnect never resumes at
/// speed.
pub struct ControlCore {
    config: ControlConfig,
    link: LinkSession,
    sensor: Option<Arc<dyn OrientationSensor>>,
    actuators: ActuatorState,
    ramp: RampController,
    tilt: TiltState,
    sensor_error: Option<String>,
    notice: Option<String>,
    observed: ObservedLink,
}

impl core::fmt::Debug for ControlCore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControlCore")
            .field("actuators", &self.actuators)
            .field("tilt_enabled", &self.tilt.enabled)
            .field("link", &self.link)
            .finish_non_exhaustive()
    }
}

impl ControlCore {
    /// Create a core for one vehicle. Pass `None` for `sensor` on platforms
    /// without orientation sensing.
    pub fn new(
        config: ControlConfig,
        transport: Arc<dyn Transport>,
        sensor: Option<Arc<dyn OrientationSensor>>,
    ) -> Self {
        let link = LinkSession::new(transport, config.link.clone());
        let actuators = ActuatorState::new(config.link.motor_range());
        let ramp = RampController::new(config.ramp.clone());
        let smoother = TiltSmoother::new(config.tilt.smoothing);
        Self {
            config,
            link,
            sensor,
            actuators,
            ramp,
            tilt: TiltState {
                enabled: false,
                smoother,
                unclaimed: None,
            },
            sensor_error: None,
            notice: None,
            observed: ObservedLink::default(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Link session shared with the driver loop.
    pub fn link(&self) -> &LinkSession {
        &self.link
    }

    /// Commanded actuator values.
    pub fn actuators(&self) -> ActuatorState {
        self.actuators
    }

    /// Whether tilt steering is authoritative.
    pub fn tilt_enabled(&self) -> bool {
        self.tilt.enabled
    }

    /// Take the sample stream opened by the last successful `toggle_tilt`.
    pub fn take_tilt_stream(&mut self) -> Option<mpsc::Receiver<TiltSample>> {
        self.tilt.unclaimed.take()
    }

    /// Time until the next ramp tick, or `None` while no pedal is held.
    pub fn time_to_next_tick(&self) -> Option<Duration> {
        self.ramp.time_to_next_tick()
    }

    /// Apply one command. `Connect` awaits the whole attempt; drivers that
    /// must stay responsive while connecting run [`LinkSession::connect`]
    /// themselves.
    pub async fn handle(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::PressThrottle => self.press(RampDirection::Throttle).await,
            ControlCommand::ReleaseThrottle => self.release(RampDirection::Throttle).await,
            ControlCommand::PressBrake => self.press(RampDirection::Brake).await,
            ControlCommand::ReleaseBrake => self.release(RampDirection::Brake).await,
            ControlCommand::SetSteeringSlider(raw) => self.set_steering_slider(raw).await,
            ControlCommand::ToggleTilt => self.toggle_tilt().await,
            ControlCommand::EmergencyStop => self.emergency_stop().await,
            ControlCommand::Connect => {
                if let Err(err) = self.connect().await {
                    debug!(error = %err, "connect command failed");
                }
            }
            ControlCommand::Disconnect => self.disconnect().await,
            ControlCommand::Shutdown => self.shutdown().await,
        }
    }

    /// Start a pedal ramp.
    pub async fn press(&mut self, direction: RampDirection) {
        self.observe_link().await;
        if !self.ramp.start(direction) {
            debug!(%direction, "press ignored");
        }
    }

    /// Release a pedal and send the motor value the release policy left.
    pub async fn release(&mut self, direction: RampDirection) {
        self.observe_link().await;
        if self.ramp.stop(direction, &mut self.actuators) {
            self.link.send_motor(self.actuators.motor()).await;
        }
    }

    /// Steer from the on-screen slider. Ignored while tilt steering is on.
    pub async fn set_steering_slider(&mut self, raw: i32) {
        self.observe_link().await;
        if self.tilt.enabled {
            debug!(raw, "slider ignored while tilt steering is enabled");
            return;
        }
        self.actuators.set_steering(map_slider_to_steering(raw));
        self.link.send_steering(self.actuators.steering()).await;
    }

    /// Switch tilt steering on or off.
    ///
    /// Turning it on awaits the sensor permission first; a refusal or a
    /// missing sensor leaves tilt off and is reported in the snapshot's
    /// `sensor_error`. Drivers that must stay responsive while the prompt is
    /// open use [`Self::begin_toggle_tilt`] instead.
    pub async fn toggle_tilt(&mut self) {
        self.observe_link().await;
        if let Some(request) = self.begin_toggle_tilt() {
            let result = request.await;
            self.finish_toggle_tilt(result);
        }
    }

    /// First half of [`Self::toggle_tilt`].
    ///
    /// Turning tilt off happens immediately and returns `None`, as does a
    /// missing sensor. Otherwise the returned request must be awaited and its
    /// result passed to [`Self::finish_toggle_tilt`]; tilt stays off until
    /// then.
    pub fn begin_toggle_tilt(&mut self) -> Option<TiltRequest> {
        if self.tilt.enabled {
            self.stop_tilt();
            info!("tilt steering disabled");
            return None;
        }
        let Some(sensor) = self.sensor.clone() else {
            self.tilt_failed(&SensorError::unavailable("no orientation sensor on this platform"));
            return None;
        };
        debug!("requesting orientation permission");
        Some(Box::pin(async move {
            sensor.request_permission().await?;
            sensor.subscribe().await
        }))
    }

    /// Apply the outcome of a request from [`Self::begin_toggle_tilt`].
    pub fn finish_toggle_tilt(&mut self, result: Result<mpsc::Receiver<TiltSample>, SensorError>) {
        match result {
            Ok(stream) => {
                self.tilt.enabled = true;
                self.tilt.smoother.reset();
                self.tilt.unclaimed = Some(stream);
                self.sensor_error = None;
                info!("tilt steering enabled");
            }
            Err(err) => self.tilt_failed(&err),
        }
    }

    fn tilt_failed(&mut self, err: &SensorError) {
        self.sensor_error = Some(err.to_string());
        log_absorbed("tilt steering unavailable", &KartError::from(err.clone()));
    }

    fn stop_tilt(&mut self) {
        self.tilt.enabled = false;
        self.tilt.unclaimed = None;
        self.tilt.smoother.reset();
    }

    /// Feed one orientation sample. Ignored while tilt steering is off.
    pub async fn on_tilt_sample(&mut self, sample: TiltSample) {
        if !self.tilt.enabled {
            return;
        }
        let Some(gamma) = self.tilt.smoother.filter(sample.gamma) else {
            debug!("non-finite tilt sample dropped");
            return;
        };
        let angle = map_tilt_to_steering_with_limit(gamma, self.config.tilt.limit_deg);
        self.actuators.set_steering(angle);
        self.observe_link().await;
        self.link.send_steering(self.actuators.steering()).await;
    }

    /// The sensor stopped delivering samples.
    pub fn on_tilt_stream_closed(&mut self) {
        if self.tilt.enabled {
            self.stop_tilt();
            self.tilt_failed(&SensorError::StreamClosed);
        }
    }

    /// Cancel both ramps and command the motor to neutral.
    pub async fn emergency_stop(&mut self) {
        self.ramp.emergency_stop(&mut self.actuators);
        info!("emergency stop");
        self.observe_link().await;
        self.link.send_motor(self.actuators.motor()).await;
    }

    /// Connect and bring the vehicle in line with local state.
    ///
    /// # Errors
    ///
    /// Returns the link error; it is also visible in the snapshot.
    pub async fn connect(&mut self) -> LinkResult<()> {
        let result = self.link.connect().await;
        self.observe_link().await;
        result
    }

    /// Stop the motor on the vehicle, then disconnect.
    pub async fn disconnect(&mut self) {
        self.ramp.emergency_stop(&mut self.actuators);
        self.link.send_motor(self.actuators.motor()).await;
        self.link.disconnect().await;
        self.observe_link().await;
    }

    /// Stop everything: ramps, tilt, motor, link.
    pub async fn shutdown(&mut self) {
        self.stop_tilt();
        self.disconnect().await;
        info!("control core shut down");
    }

    /// Credit elapsed time to the ramps and send the motor if any tick fell
    /// due. Returns the number of ticks applied.
    pub async fn advance(&mut self, delta: Duration) -> u32 {
        self.observe_link().await;
        let ticks = self.ramp.advance(delta, &mut self.actuators);
        if ticks > 0 {
            self.link.send_motor(self.actuators.motor()).await;
        }
        ticks
    }

    /// React to link status changes since the last call.
    ///
    /// A lost connection (including a drop and reconnect that happened
    /// between two calls) cancels both ramps and zeroes the local motor. A
    /// new connection also cancels both ramps, then receives the current
    /// steering and the neutral motor value.
    pub async fn observe_link(&mut self) {
        let status = self.link.status();
        let drops = self.link.stats().drops;
        let now = ObservedLink {
            connected: status.state.is_connected(),
            generation: status.generation,
            drops,
        };
        let before = std::mem::replace(&mut self.observed, now);
        if before == now {
            return;
        }

        let same_link = before.generation == now.generation;
        if before.connected && !(now.connected && same_link) {
            self.ramp.emergency_stop(&mut self.actuators);
            if now.drops > before.drops {
                let reason = status.last_drop.as_deref().unwrap_or("unknown reason");
                self.notice = Some(format!("Connection lost: {reason}"));
                warn!(reason, "connection lost, motor stopped");
            }
        }
        if now.connected && !(before.connected && same_link) {
            if now.drops == before.drops {
                self.notice = None;
            }
            self.ramp.emergency_stop(&mut self.actuators);
            self.link.send_steering(self.actuators.steering()).await;
            self.link.send_motor(self.actuators.motor()).await;
        }
    }

    /// Observable state.
    pub fn snapshot(&self) -> ControlSnapshot {
        let status = self.link.status();
        ControlSnapshot {
            connection: status.state,
            device_name: status.device_name,
            last_error: status.last_error,
            sensor_error: self.sensor_error.clone(),
            notice: self.notice.clone(),
            actuators: self.actuators,
            tilt_enabled: self.tilt.enabled,
            throttle_active: self.ramp.is_active(RampDirection::Throttle),
            brake_active: self.ramp.is_active(RampDirection::Brake),
        }
    }
}

/// Log a failure that was turned into observable state.
fn log_absorbed(context: &str, err: &KartError) {
    let category = err.category();
    match err.severity() {
        ErrorSeverity::Info => info!(%category, error = %err, "{context}"),
        ErrorSeverity::Warning => warn!(%category, error = %err, "{context}"),
        ErrorSeverity::Error | ErrorSeverity::Critical => {
            error!(
                %category,
                recoverable = err.is_recoverable(),
                error = %err,
                "{context}"
            );
        }
    }
}
