//! In-memory vehicle for tests and simulation.
//!
//! [`MockTransport`] offers a list of [`MockDevice`]s. A `MockDevice` is a
//! cheap handle: keep a clone to inspect what the session wrote and to inject
//! failures or link drops.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rckart_errors::{LinkError, LinkResult};
use rckart_protocol::SERVICE_UUID;
use tokio::sync::Notify;
use tokio::time::Instant;
use uuid::Uuid;

use crate::transport::{
    Channel, Device, DeviceFilter, DisconnectCallback, DisconnectReason, Session, Transport,
};

/// One payload received by a mock device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockWrite {
    /// When the write landed (tokio clock, so paused-time tests are exact).
    pub at: Instant,
    /// Channel written to.
    pub channel: Uuid,
    /// Payload bytes.
    pub payload: Vec<u8>,
}

#[derive(Default)]
struct DeviceState {
    connected: bool,
    writes: Vec<MockWrite>,
    fail_writes: bool,
    connect_error: Option<LinkError>,
    missing_channels: Vec<Uuid>,
    callbacks: Vec<DisconnectCallback>,
    connect_gate: Option<Arc<Notify>>,
    connects: usize,
    disconnects: usize,
}

struct DeviceInner {
    name: Option<String>,
    services: Vec<Uuid>,
    state: Mutex<DeviceState>,
}

/// Mock vehicle.
#[derive(Clone)]
pub struct MockDevice {
    inner: Arc<DeviceInner>,
}

impl core::fmt::Debug for MockDevice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MockDevice")
            .field("name", &self.inner.name)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl MockDevice {
    /// Device advertising the stock kart service.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_services(Some(name.into()), vec![SERVICE_UUID])
    }

    /// Device with an explicit advertisement.
    pub fn with_services(name: Option<String>, services: Vec<Uuid>) -> Self {
        Self {
            inner: Arc::new(DeviceInner {
                name,
                services,
                state: Mutex::new(DeviceState::default()),
            }),
        }
    }

    /// Advertised services.
    pub fn services(&self) -> &[Uuid] {
        &self.inner.services
    }

    /// Whether a session is open.
    pub fn is_connected(&self) -> bool {
        self.inner.state.lock().connected
    }

    /// Every payload received, in order.
    pub fn writes(&self) -> Vec<MockWrite> {
        self.inner.state.lock().writes.clone()
    }

    /// Payload bytes received on one channel, in order.
    pub fn writes_to(&self, channel: Uuid) -> Vec<u8> {
        self.inner
            .state
            .lock()
            .writes
            .iter()
            .filter(|w| w.channel == channel)
            .flat_map(|w| w.payload.iter().copied())
            .collect()
    }

    /// Forget recorded writes.
    pub fn clear_writes(&self) {
        self.inner.state.lock().writes.clear();
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.state.lock().fail_writes = fail;
    }

    /// Make the next session setup fail with `error`.
    pub fn fail_next_connect(&self, error: LinkError) {
        self.inner.state.lock().connect_error = Some(error);
    }

    /// Hide a channel so resolving it fails.
    pub fn remove_channel(&self, channel: Uuid) {
        self.inner.state.lock().missing_channels.push(channel);
    }

    /// Make session setup wait until [`Self::release_connect`].
    pub fn hold_connect(&self) {
        self.inner.state.lock().connect_gate = Some(Arc::new(Notify::new()));
    }

    /// Let a held session setup proceed.
    pub fn release_connect(&self) {
        if let Some(gate) = self.inner.state.lock().connect_gate.take() {
            gate.notify_one();
        }
    }

    /// Simulate the vehicle dropping the link.
    pub fn drop_link(&self, reason: DisconnectReason) {
        let callbacks = {
            let mut state = self.inner.state.lock();
            if !state.connected {
                return;
            }
            state.connected = false;
            std::mem::take(&mut state.callbacks)
        };
        for callback in callbacks {
            callback(reason.clone());
        }
    }

    /// Number of sessions opened.
    pub fn connect_count(&self) -> usize {
        self.inner.state.lock().connects
    }

    /// Number of explicit disconnects.
    pub fn disconnect_count(&self) -> usize {
        self.inner.state.lock().disconnects
    }
}

#[async_trait]
impl Device for MockDevice {
    fn name(&self) -> Option<String> {
        self.inner.name.clone()
    }

    async fn connect(&self) -> LinkResult<Box<dyn Session>> {
        let gate = self.inner.state.lock().connect_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let mut state = self.inner.state.lock();
        if let Some(err) = state.connect_error.take() {
            return Err(err);
        }
        state.connected = true;
        state.connects = state.connects.saturating_add(1);
        Ok(Box::new(MockSession {
            device: self.clone(),
        }))
    }

    fn on_disconnected(&self, callback: DisconnectCallback) {
        self.inner.state.lock().callbacks.push(callback);
    }

    async fn disconnect(&self) {
        let callbacks = {
            let mut state = self.inner.state.lock();
            if !state.connected {
                return;
            }
            state.connected = false;
            state.disconnects = state.disconnects.saturating_add(1);
            std::mem::take(&mut state.callbacks)
        };
        for callback in callbacks {
            callback(DisconnectReason::Requested);
        }
    }
}

/// Session on a [`MockDevice`].
pub struct MockSession {
    device: MockDevice,
}

#[async_trait]
impl Session for MockSession {
    async fn channel(&self, service: Uuid, id: Uuid) -> LinkResult<Arc<dyn Channel>> {
        let state = self.device.inner.state.lock();
        if !self.device.inner.services.contains(&service) {
            return Err(LinkError::handshake(format!("service {service} not found")));
        }
        if state.missing_channels.contains(&id) {
            return Err(LinkError::channel_unavailable("mock", id.to_string()));
        }
        Ok(Arc::new(MockChannel {
            device: self.device.clone(),
            id,
        }))
    }
}

/// Write channel on a [`MockDevice`].
pub struct MockChannel {
    device: MockDevice,
    id: Uuid,
}

#[async_trait]
impl Channel for MockChannel {
    async fn write(&self, payload: &[u8]) -> LinkResult<()> {
        let mut state = self.device.inner.state.lock();
        if !state.connected {
            return Err(LinkError::disconnected("device not connected"));
        }
        if state.fail_writes {
            return Err(LinkError::write_failed("injected write failure"));
        }
        state.writes.push(MockWrite {
            at: Instant::now(),
            channel: self.id,
            payload: payload.to_vec(),
        });
        Ok(())
    }
}

/// Mock radio stack.
#[derive(Default)]
pub struct MockTransport {
    devices: Mutex<Vec<MockDevice>>,
    next_error: Mutex<Option<LinkError>>,
    requests: AtomicUsize,
}

impl MockTransport {
    /// Transport with no devices in range.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport with one device in range.
    pub fn with_device(device: MockDevice) -> Self {
        let transport = Self::new();
        transport.add_device(device);
        transport
    }

    /// Put a device in range.
    pub fn add_device(&self, device: MockDevice) {
        self.devices.lock().push(device);
    }

    /// Make the next device request fail, e.g. with `LinkError::Cancelled`.
    pub fn fail_next_request(&self, error: LinkError) {
        *self.next_error.lock() = Some(error);
    }

    /// Number of device requests made.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request_device(&self, filter: &DeviceFilter) -> LinkResult<Arc<dyn Device>> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = self.next_error.lock().take() {
            return Err(err);
        }
        let devices = self.devices.lock();
        let device = devices
            .iter()
            .find(|d| filter.matches(d.inner.name.as_deref(), d.services()))
            .ok_or(LinkError::NoMatchingDevice)?;
        Ok(Arc::new(device.clone()))
    }
}
