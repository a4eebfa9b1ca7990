//! Orientation sensor abstraction.

use async_trait::async_trait;
use rckart_errors::SensorError;
use rckart_input::TiltSample;
use tokio::sync::mpsc;

/// Device orientation source.
///
/// Platforms that gate sensor access behind a user prompt resolve it in
/// [`OrientationSensor::request_permission`]; the control core always awaits
/// it before subscribing.
#[async_trait]
pub trait OrientationSensor: Send + Sync {
    /// Ask for permission to read orientation.
    async fn request_permission(&self) -> Result<(), SensorError>;

    /// Start streaming samples. Dropping the receiver stops the stream.
    async fn subscribe(&self) -> Result<mpsc::Receiver<TiltSample>, SensorError>;
}

/// In-memory sensor for tests and the simulator.
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tokio::sync::Notify;

    const STREAM_CAPACITY: usize = 64;

    #[derive(Default)]
    struct State {
        deny: Option<String>,
        sender: Option<mpsc::Sender<TiltSample>>,
        permission_gate: Option<Arc<Notify>>,
        permission_requests: usize,
    }

    /// Scriptable orientation sensor.
    ///
    /// Clones share state, so a test keeps one clone to push samples while
    /// the control core owns another.
    #[derive(Clone, Default)]
    pub struct MockOrientationSensor {
        state: Arc<Mutex<State>>,
    }

    impl MockOrientationSensor {
        /// Sensor that grants permission and streams nothing until pushed.
        pub fn new() -> Self {
            Self::default()
        }

        /// Sensor whose permission prompt is always refused.
        pub fn denying(reason: impl Into<String>) -> Self {
            let sensor = Self::new();
            sensor.set_denied(Some(reason.into()));
            sensor
        }

        /// Refuse later permission requests with `reason`, or grant them
        /// again with `None`.
        pub fn set_denied(&self, reason: Option<String>) {
            self.state.lock().deny = reason;
        }

        /// Keep later permission prompts open until [`Self::answer_permission`].
        pub fn hold_permission(&self) {
            self.state.lock().permission_gate = Some(Arc::new(Notify::new()));
        }

        /// Resolve a held permission prompt.
        pub fn answer_permission(&self) {
            if let Some(gate) = self.state.lock().permission_gate.take() {
                gate.notify_one();
            }
        }

        /// Push one sample to the current subscriber.
        ///
        /// Returns `false` if nobody is subscribed or the subscriber went away.
        pub fn push(&self, sample: TiltSample) -> bool {
            let sender = self.state.lock().sender.clone();
            match sender {
                Some(sender) => sender.try_send(sample).is_ok(),
                None => false,
            }
        }

        /// Whether a subscriber is currently listening.
        pub fn is_streaming(&self) -> bool {
            self.state
                .lock()
                .sender
                .as_ref()
                .is_some_and(|sender| !sender.is_closed())
        }

        /// End the stream from the sensor side.
        pub fn close(&self) {
            self.state.lock().sender = None;
        }

        /// Number of permission prompts shown so far.
        pub fn permission_requests(&self) -> usize {
            self.state.lock().permission_requests
        }
    }

    #[async_trait]
    impl OrientationSensor for MockOrientationSensor {
        async fn request_permission(&self) -> Result<(), SensorError> {
            let gate = {
                let mut state = self.state.lock();
                state.permission_requests = state.permission_requests.saturating_add(1);
                state.permission_gate.clone()
            };
            if let Some(gate) = gate {
                gate.notified().await;
            }
            let state = self.state.lock();
            match &state.deny {
                Some(reason) => Err(SensorError::permission_denied(reason.clone())),
                None => Ok(()),
            }
        }

        async fn subscribe(&self) -> Result<mpsc::Receiver<TiltSample>, SensorError> {
            let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
            self.state.lock().sender = Some(tx);
            Ok(rx)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockOrientationSensor;
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[tokio::test]
    async fn test_mock_streams_after_subscribe() -> Result<(), SensorError> {
        let sensor = MockOrientationSensor::new();
        assert!(!sensor.push(TiltSample::gamma(1.0)));

        sensor.request_permission().await?;
        let mut rx = sensor.subscribe().await?;
        assert!(sensor.push(TiltSample::gamma(12.0)));
        assert_eq!(rx.recv().await, Some(TiltSample::gamma(12.0)));

        drop(rx);
        assert!(!sensor.is_streaming());
        Ok(())
    }

    #[tokio::test]
    async fn test_mock_denial() {
        let sensor = MockOrientationSensor::denying("blocked by user");
        assert_eq!(
            sensor.request_permission().await,
            Err(SensorError::permission_denied("blocked by user"))
        );
        assert_eq!(sensor.permission_requests(), 1);
    }

    #[tokio::test]
    async fn test_mock_held_permission_waits_for_answer() -> TestResult {
        let sensor = MockOrientationSensor::new();
        sensor.hold_permission();
        let prompt = tokio::spawn({
            let sensor = sensor.clone();
            async move { sensor.request_permission().await }
        });
        tokio::task::yield_now().await;
        assert!(!prompt.is_finished());
        assert_eq!(sensor.permission_requests(), 1);

        sensor.answer_permission();
        assert_eq!(prompt.await?, Ok(()));
        Ok(())
    }

    #[tokio::test]
    async fn test_mock_close_ends_stream() -> Result<(), SensorError> {
        let sensor = MockOrientationSensor::new();
        let mut rx = sensor.subscribe().await?;
        sensor.close();
        assert_eq!(rx.recv().await, None);
        Ok(())
    }
}
