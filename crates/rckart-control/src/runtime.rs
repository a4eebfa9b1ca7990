//! Single-task event loop around [`ControlCore`].
//!
//! The loop owns the core and waits on user commands, the next ramp deadline,
//! the tilt sample stream and link status changes at once. A connect attempt
//! and a sensor permission prompt each run as a future polled by the same
//! loop, so pedals and emergency stop stay live while either is pending.

use std::future::Future;
use std::pin::Pin;

use rckart_errors::{KartError, LinkError, LinkResult};
use rckart_input::TiltSample;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::controller::{ControlCore, TiltRequest};
use crate::snapshot::ControlSnapshot;

const COMMAND_CAPACITY: usize = 32;

/// Discrete input from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlCommand {
    PressThrottle,
    ReleaseThrottle,
    PressBrake,
    ReleaseBrake,
    /// Raw slider position, clamped to 0 … 180.
    SetSteeringSlider(i32),
    ToggleTilt,
    EmergencyStop,
    Connect,
    Disconnect,
    /// Stop the motor, disconnect and end the loop.
    Shutdown,
}

/// Sending side of a running [`ControlLoop`].
#[derive(Debug, Clone)]
pub struct ControlHandle {
    commands: mpsc::Sender<ControlCommand>,
    snapshots: watch::Receiver<ControlSnapshot>,
}

impl ControlHandle {
    /// Queue a command.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop has already stopped.
    pub async fn send(&self, command: ControlCommand) -> rckart_errors::Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|err| KartError::other(format!("control loop stopped: {err}")))
    }

    /// Latest published state.
    pub fn snapshot(&self) -> ControlSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that wakes on every published change.
    pub fn subscribe(&self) -> watch::Receiver<ControlSnapshot> {
        self.snapshots.clone()
    }
}

type ConnectFuture = Pin<Box<dyn Future<Output = LinkResult<()>> + Send>>;

/// Event loop driving a [`ControlCore`].
pub struct ControlLoop {
    core: ControlCore,
    commands: mpsc::Receiver<ControlCommand>,
    snapshots: watch::Sender<ControlSnapshot>,
}

impl ControlLoop {
    /// Wrap a core; the loop starts when [`Self::run`] is awaited.
    pub fn new(core: ControlCore) -> (Self, ControlHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(core.snapshot());
        let handle = ControlHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        };
        let control = Self {
            core,
            commands: command_rx,
            snapshots: snapshot_tx,
        };
        (control, handle)
    }

    /// Run until `Shutdown` or until every handle is dropped, then hand the
    /// core back.
    pub async fn run(mut self) -> ControlCore {
        let link = self.core.link().clone();
        let mut link_status = link.subscribe();
        let mut connecting: Option<ConnectFuture> = None;
        let mut tilt_request: Option<TiltRequest> = None;
        let mut tilt: Option<mpsc::Receiver<TiltSample>> = None;
        let mut last_advance = Instant::now();
        let mut link_alive = true;

        info!("control loop started");
        loop {
            self.publish();
            let deadline = self
                .core
                .time_to_next_tick()
                .map(|wait| last_advance + wait);
            let next_tick = deadline.unwrap_or(last_advance);

            tokio::select! {
                command = self.commands.recv() => {
                    self.catch_up(&mut last_advance).await;
                    match command {
                        Some(ControlCommand::Shutdown) | None => break,
                        Some(ControlCommand::Connect) => {
                            if connecting.is_some() {
                                debug!(error = %LinkError::AlreadyConnecting, "connect ignored");
                            } else {
                                let link = link.clone();
                                connecting = Some(Box::pin(async move { link.connect().await }));
                            }
                        }
                        Some(ControlCommand::ToggleTilt) => {
                            if tilt_request.take().is_some() {
                                info!("tilt permission request abandoned");
                            } else {
                                tilt_request = self.core.begin_toggle_tilt();
                            }
                        }
                        Some(command) => self.core.handle(command).await,
                    }
                    if !self.core.tilt_enabled() {
                        tilt = None;
                    }
                }
                result = async {
                    match tilt_request.as_mut() {
                        Some(request) => request.await,
                        None => std::future::pending().await,
                    }
                }, if tilt_request.is_some() => {
                    tilt_request = None;
                    self.catch_up(&mut last_advance).await;
                    self.core.finish_toggle_tilt(result);
                    if let Some(stream) = self.core.take_tilt_stream() {
                        tilt = Some(stream);
                    }
                }
                result = async {
                    match connecting.as_mut() {
                        Some(attempt) => attempt.await,
                        None => std::future::pending().await,
                    }
                }, if connecting.is_some() => {
                    connecting = None;
                    if let Err(err) = result {
                        debug!(error = %err, "connect attempt ended");
                    }
                    self.catch_up(&mut last_advance).await;
                }
                () = tokio::time::sleep_until(next_tick), if deadline.is_some() => {
                    self.catch_up(&mut last_advance).await;
                }
                sample = async {
                    match tilt.as_mut() {
                        Some(stream) => stream.recv().await,
                        None => std::future::pending().await,
                    }
                }, if tilt.is_some() => {
                    self.catch_up(&mut last_advance).await;
                    match sample {
                        Some(sample) => self.core.on_tilt_sample(sample).await,
                        None => {
                            tilt = None;
                            self.core.on_tilt_stream_closed();
                        }
                    }
                }
                changed = link_status.changed(), if link_alive => {
                    link_alive = changed.is_ok();
                    self.catch_up(&mut last_advance).await;
                }
            }
        }

        self.core.shutdown().await;
        drop(connecting);
        drop(tilt_request);
        self.publish();
        info!("control loop stopped");
        self.core
    }

    /// Credit the time since the last call to the ramps. Also picks up any
    /// link status change.
    async fn catch_up(&mut self, last_advance: &mut Instant) {
        let now = Instant::now();
        let delta = now.saturating_duration_since(*last_advance);
        *last_advance = now;
        self.core.advance(delta).await;
    }

    fn publish(&self) {
        let snapshot = self.core.snapshot();
        let modified = self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
        if modified {
            trace!("snapshot published");
        }
    }
}
