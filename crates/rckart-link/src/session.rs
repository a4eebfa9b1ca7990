//! Connection lifecycle and gated actuator writes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rckart_errors::{ErrorSeverity, LinkError, LinkResult};
use rckart_protocol::{ActuatorChannel, Payload, encode_steering};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::LinkConfig;
use crate::transport::{Channel, Device, DisconnectReason, Transport};

/// Lifecycle state of the link.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum ConnectionState {
    /// No link and no attempt in flight.
    #[default]
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// Both actuator channels are resolved and writable.
    Connected,
    /// The last connect attempt failed.
    Error(String),
}

impl ConnectionState {
    /// Whether sends reach the vehicle.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl core::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Error(message) => write!(f, "error: {message}"),
        }
    }
}

/// Observable link status.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LinkStatus {
    /// Current lifecycle state.
    pub state: ConnectionState,
    /// Name of the connected device.
    pub device_name: Option<String>,
    /// Reason the last connect attempt failed; cleared on success.
    pub last_error: Option<String>,
    /// Reason for the last unsolicited drop.
    pub last_drop: Option<String>,
    /// Bumped on every connect attempt, explicit disconnect and drop.
    pub generation: u64,
}

/// Link counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LinkStats {
    /// Successful channel writes.
    pub writes: u64,
    /// Failed channel writes.
    pub write_failures: u64,
    /// Successful connects.
    pub connects: u64,
    /// Unsolicited drops.
    pub drops: u64,
}

const CANCELLED_MESSAGE: &str = "connection attempt cancelled";

struct LinkHandles {
    device: Arc<dyn Device>,
    steering: Arc<dyn Channel>,
    motor: Arc<dyn Channel>,
}

impl LinkHandles {
    fn channel(&self, channel: ActuatorChannel) -> Arc<dyn Channel> {
        match channel {
            ActuatorChannel::Steering => Arc::clone(&self.steering),
            ActuatorChannel::Motor => Arc::clone(&self.motor),
        }
    }
}

#[derive(Default)]
struct LinkInner {
    state: ConnectionState,
    generation: u64,
    handles: Option<LinkHandles>,
    /// Device selected by the in-flight attempt, torn down on abort.
    pending: Option<Arc<dyn Device>>,
    device_name: Option<String>,
    last_error: Option<String>,
    last_drop: Option<String>,
}

impl LinkInner {
    fn status(&self) -> LinkStatus {
        LinkStatus {
            state: self.state.clone(),
            device_name: self.device_name.clone(),
            last_error: self.last_error.clone(),
            last_drop: self.last_drop.clone(),
            generation: self.generation,
        }
    }

    fn attempt_is_current(&self, generation: u64) -> bool {
        self.generation == generation && self.state == ConnectionState::Connecting
    }
}

#[derive(Default)]
struct Counters {
    writes: AtomicU64,
    write_failures: AtomicU64,
    connects: AtomicU64,
    drops: AtomicU64,
}

struct Shared {
    transport: Arc<dyn Transport>,
    config: LinkConfig,
    inner: Mutex<LinkInner>,
    status: watch::Sender<LinkStatus>,
    counters: Counters,
}

impl Shared {
    fn publish(&self, inner: &LinkInner) {
        self.status.send_replace(inner.status());
    }

    fn handle_drop(&self, generation: u64, reason: DisconnectReason) {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            debug!(generation, current = inner.generation, "stale disconnect callback ignored");
            return;
        }
        match inner.state {
            ConnectionState::Connected | ConnectionState::Connecting => {
                inner.handles = None;
                inner.pending = None;
                inner.device_name = None;
                inner.state = ConnectionState::Disconnected;
                inner.last_drop = Some(reason.to_string());
                inner.generation = inner.generation.wrapping_add(1);
                self.counters.drops.fetch_add(1, Ordering::Relaxed);
                self.publish(&inner);
                info!(%reason, "link dropped");
            }
            ConnectionState::Disconnected | ConnectionState::Error(_) => {}
        }
    }
}

/// Resets the session if a connect future is dropped before it finishes.
struct AttemptGuard<'a> {
    shared: &'a Shared,
    generation: u64,
    armed: bool,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let device = {
            let mut inner = self.shared.inner.lock();
            if !inner.attempt_is_current(self.generation) {
                return;
            }
            inner.state = ConnectionState::Error(CANCELLED_MESSAGE.to_string());
            inner.last_error = Some(CANCELLED_MESSAGE.to_string());
            self.shared.publish(&inner);
            inner.pending.take()
        };
        warn!(generation = self.generation, "{CANCELLED_MESSAGE}");
        if let (Some(device), Ok(runtime)) = (device, tokio::runtime::Handle::try_current()) {
            runtime.spawn(async move { device.disconnect().await });
        }
    }
}

/// Link to one vehicle.
///
/// Cheap to clone; clones share the same connection.
#[derive(Clone)]
pub struct LinkSession {
    shared: Arc<Shared>,
}

impl core::fmt::Debug for LinkSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LinkSession")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl LinkSession {
    /// Create a disconnected session.
    pub fn new(transport: Arc<dyn Transport>, config: LinkConfig) -> Self {
        let (status, _) = watch::channel(LinkStatus::default());
        Self {
            shared: Arc::new(Shared {
                transport,
                config,
                inner: Mutex::new(LinkInner::default()),
                status,
                counters: Counters::default(),
            }),
        }
    }

    /// Link configuration.
    pub fn config(&self) -> &LinkConfig {
        &self.shared.config
    }

    /// Current status snapshot.
    pub fn status(&self) -> LinkStatus {
        self.shared.inner.lock().status()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.shared.inner.lock().state.clone()
    }

    /// Whether the link is connected.
    pub fn is_connected(&self) -> bool {
        self.shared.inner.lock().state.is_connected()
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<LinkStatus> {
        self.shared.status.subscribe()
    }

    /// Counter snapshot.
    pub fn stats(&self) -> LinkStats {
        let counters = &self.shared.counters;
        LinkStats {
            writes: counters.writes.load(Ordering::Relaxed),
            write_failures: counters.write_failures.load(Ordering::Relaxed),
            connects: counters.connects.load(Ordering::Relaxed),
            drops: counters.drops.load(Ordering::Relaxed),
        }
    }

    /// Connect to the vehicle.
    ///
    /// Already connected is a successful no-op. On failure the session is
    /// left in [`ConnectionState::Error`] and any half-open device is closed.
    ///
    /// # Errors
    ///
    /// - [`LinkError::AlreadyConnecting`] if an attempt is in flight
    /// - [`LinkError::Aborted`] if `disconnect()` or a link drop superseded
    ///   this attempt
    /// - any transport failure from device selection, session setup or
    ///   channel resolution
    pub async fn connect(&self) -> LinkResult<()> {
        let generation = {
            let mut inner = self.shared.inner.lock();
            match inner.state {
                ConnectionState::Connecting => return Err(LinkError::AlreadyConnecting),
                ConnectionState::Connected => return Ok(()),
                ConnectionState::Disconnected | ConnectionState::Error(_) => {}
            }
            inner.generation = inner.generation.wrapping_add(1);
            inner.state = ConnectionState::Connecting;
            self.shared.publish(&inner);
            inner.generation
        };
        info!(generation, "connecting");

        let mut guard = AttemptGuard {
            shared: &self.shared,
            generation,
            armed: true,
        };
        let result = self.establish(generation).await;
        guard.armed = false;

        match result {
            Ok(handles) => self.finish(generation, handles).await,
            Err(err) => {
                let device = {
                    let mut inner = self.shared.inner.lock();
                    if !inner.attempt_is_current(generation) {
                        return Err(LinkError::Aborted);
                    }
                    inner.state = ConnectionState::Error(err.to_string());
                    inner.last_error = Some(err.to_string());
                    self.shared.publish(&inner);
                    inner.pending.take()
                };
                if let Some(device) = device {
                    device.disconnect().await;
                }
                log_connect_failure(&err);
                Err(err)
            }
        }
    }

    async fn establish(&self, generation: u64) -> LinkResult<LinkHandles> {
        let config = &self.shared.config;
        let device = self
            .shared
            .transport
            .request_device(&config.filter())
            .await?;
        let current = {
            let mut inner = self.shared.inner.lock();
            let current = inner.attempt_is_current(generation);
            if current {
                inner.pending = Some(Arc::clone(&device));
            }
            current
        };
        if !current {
            device.disconnect().await;
            return Err(LinkError::Aborted);
        }
        debug!(name = ?device.name(), "device selected");

        let session = device.connect().await?;
        let steering = session
            .channel(config.service_uuid, config.steering_channel_uuid)
            .await?;
        let motor = session
            .channel(config.service_uuid, config.motor_channel_uuid)
            .await?;
        Ok(LinkHandles {
            device,
            steering,
            motor,
        })
    }

    async fn finish(&self, generation: u64, handles: LinkHandles) -> LinkResult<()> {
        let shared = Arc::downgrade(&self.shared);
        let on_drop =
            move |reason: DisconnectReason| on_device_dropped(&shared, generation, reason);
        handles.device.on_disconnected(Box::new(on_drop));

        let name = handles.device.name();
        let stale = {
            let mut inner = self.shared.inner.lock();
            if inner.attempt_is_current(generation) {
                inner.pending = None;
                inner.handles = Some(handles);
                inner.device_name = name.clone();
                inner.state = ConnectionState::Connected;
                inner.last_error = None;
                self.shared.counters.connects.fetch_add(1, Ordering::Relaxed);
                self.shared.publish(&inner);
                None
            } else {
                Some(handles.device)
            }
        };
        match stale {
            None => {
                info!(device = ?name, "connected");
                Ok(())
            }
            Some(device) => {
                device.disconnect().await;
                info!("connect aborted");
                Err(LinkError::Aborted)
            }
        }
    }

    /// Disconnect from the vehicle.
    ///
    /// While connecting, the attempt is aborted. Disconnected or errored
    /// sessions are left as they are.
    pub async fn disconnect(&self) {
        let device = {
            let mut inner = self.shared.inner.lock();
            let device = match inner.state {
                ConnectionState::Connected => inner.handles.take().map(|h| h.device),
                ConnectionState::Connecting => inner.pending.take(),
                ConnectionState::Disconnected | ConnectionState::Error(_) => return,
            };
            inner.state = ConnectionState::Disconnected;
            inner.device_name = None;
            inner.generation = inner.generation.wrapping_add(1);
            self.shared.publish(&inner);
            device
        };
        if let Some(device) = device {
            device.disconnect().await;
        }
        info!("disconnected");
    }

    /// Send a steering angle. A silent no-op unless connected.
    pub async fn send_steering(&self, angle: u8) {
        match encode_steering(angle) {
            Ok(payload) => self.write(ActuatorChannel::Steering, payload).await,
            Err(err) => warn!(error = %err, "steering command not sent"),
        }
    }

    /// Send a motor speed. A silent no-op unless connected.
    pub async fn send_motor(&self, speed: i16) {
        match self.shared.config.motor_encoding.encode(speed) {
            Ok(payload) => self.write(ActuatorChannel::Motor, payload).await,
            Err(err) => warn!(error = %err, "motor command not sent"),
        }
    }

    async fn write(&self, channel: ActuatorChannel, payload: Payload) {
        let handle = {
            let inner = self.shared.inner.lock();
            if !inner.state.is_connected() {
                return;
            }
            inner.handles.as_ref().map(|h| h.channel(channel))
        };
        let Some(handle) = handle else {
            return;
        };
        let counters = &self.shared.counters;
        match handle.write(&payload).await {
            Ok(()) => {
                counters.writes.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                counters.write_failures.fetch_add(1, Ordering::Relaxed);
                warn!(%channel, error = %err, "write failed");
            }
        }
    }
}

fn on_device_dropped(shared: &Weak<Shared>, generation: u64, reason: DisconnectReason) {
    if let Some(shared) = shared.upgrade() {
        shared.handle_drop(generation, reason);
    }
}

/// Log a failed attempt at the level its severity calls for.
fn log_connect_failure(err: &LinkError) {
    if !err.is_connection_failure() {
        debug!(error = %err, "connect ended");
        return;
    }
    let retryable = err.is_retryable();
    match err.severity() {
        ErrorSeverity::Info => info!(error = %err, retryable, "connect failed"),
        ErrorSeverity::Warning => warn!(error = %err, retryable, "connect failed"),
        ErrorSeverity::Error | ErrorSeverity::Critical => {
            error!(error = %err, retryable, "connect failed");
        }
    }
}
