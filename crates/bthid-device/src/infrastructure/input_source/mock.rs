//! Scripted input source for testing the session without `/dev/input`.
//!
//! Tests push [`RawInputEvent`]s with [`ScriptedInputSource::inject`] as if a
//! keyboard or mouse produced them.  Counters record how often devices were
//! acquired and released so tests can assert the session's bookkeeping.
//!
//! ```ignore
//! let input = Arc::new(ScriptedInputSource::new());
//! let session = TransportSession::new(control, interrupt, Arc::clone(&input), cfg, cancel);
//! // ... connect a host ...
//! input.inject(RawInputEvent::Key { code: BTN_LEFT, state: KeyState::Pressed }).await;
//! ```

use std::sync::Mutex;

use async_trait::async_trait;
use bthid_core::RawInputEvent;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::transport_session::{DeviceSet, InputError, InputSource};

const QUEUE_CAPACITY: usize = 64;

/// An [`InputSource`] driven by the test.
#[derive(Default)]
pub struct ScriptedInputSource {
    sender: Mutex<Option<mpsc::Sender<RawInputEvent>>>,
    failures_pending: Mutex<usize>,
    acquired: Mutex<usize>,
    released: Mutex<usize>,
}

impl ScriptedInputSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `acquire` fail with [`InputError::NoDevices`].
    pub fn fail_next_acquire(&self) {
        *self.failures_pending.lock().expect("lock poisoned") += 1;
    }

    /// Delivers `event` to the session currently holding the devices.
    ///
    /// Returns `false` if no session holds them.
    pub async fn inject(&self, event: RawInputEvent) -> bool {
        let sender = self.sender.lock().expect("lock poisoned").clone();
        match sender {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Simulates every device disappearing: the event queue closes.
    pub fn unplug(&self) {
        self.sender.lock().expect("lock poisoned").take();
    }

    /// `true` while a session holds the devices.
    pub fn is_acquired(&self) -> bool {
        self.sender
            .lock()
            .expect("lock poisoned")
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Number of successful acquisitions.
    pub fn acquire_count(&self) -> usize {
        *self.acquired.lock().expect("lock poisoned")
    }

    pub fn release_count(&self) -> usize {
        *self.released.lock().expect("lock poisoned")
    }
}

#[async_trait]
impl InputSource for ScriptedInputSource {
    async fn acquire(&self) -> Result<DeviceSet, InputError> {
        {
            let mut failures = self.failures_pending.lock().expect("lock poisoned");
            if *failures > 0 {
                *failures -= 1;
                return Err(InputError::NoDevices);
            }
        }
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        *self.sender.lock().expect("lock poisoned") = Some(tx);
        *self.acquired.lock().expect("lock poisoned") += 1;
        Ok(DeviceSet::new(
            rx,
            vec!["scripted keyboard".into(), "scripted mouse".into()],
            CancellationToken::new(),
            Vec::new(),
        ))
    }

    async fn release(&self, devices: DeviceSet) {
        self.sender.lock().expect("lock poisoned").take();
        devices.shutdown().await;
        *self.released.lock().expect("lock poisoned") += 1;
    }
}
