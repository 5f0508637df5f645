//! evdev input source: exclusive access to `/dev/input/event*` devices.
//!
//! # Exclusive grab (for beginners)
//!
//! `EVIOCGRAB` tells the kernel to deliver a device's events to this file
//! descriptor only.  While grabbed, typing on the keyboard no longer reaches
//! the local desktop or console; it reaches the Bluetooth host instead.  The
//! grab ends when we call `ungrab` or close the device.
//!
//! Each grabbed device gets its own reader task.  Readers translate events
//! with [`RawInputEvent::from_evdev`] and push them into one bounded queue
//! that the session consumes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bthid_core::RawInputEvent;
use evdev::{Device, EventStream, EventType};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::transport_session::{DeviceSet, InputError, InputSource};
use crate::infrastructure::input_source::selector::{DeviceInfo, DeviceSelector};

/// Capacity of the shared event queue.
const QUEUE_CAPACITY: usize = 256;

/// Where to look for devices and how to take them.
#[derive(Debug, Clone)]
pub struct EvdevSettings {
    pub input_dir: PathBuf,
    /// Explicit device nodes.  When non-empty, scanning and the selector are skipped.
    pub devices: Vec<PathBuf>,
    /// Delay before grabbing, so the key that launched us can be released.
    pub grab_delay: Duration,
}

/// [`InputSource`] backed by Linux evdev devices.
pub struct EvdevInputSource {
    settings: EvdevSettings,
    selector: Box<dyn DeviceSelector>,
}

impl EvdevInputSource {
    pub fn new(settings: EvdevSettings, selector: impl DeviceSelector + 'static) -> Self {
        Self {
            settings,
            selector: Box::new(selector),
        }
    }

    fn candidates(&self) -> Result<Vec<PathBuf>, InputError> {
        if !self.settings.devices.is_empty() {
            return Ok(self.settings.devices.clone());
        }
        let dir = &self.settings.input_dir;
        let entries = std::fs::read_dir(dir).map_err(|source| InputError::Scan {
            path: dir.clone(),
            source,
        })?;
        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| is_event_node(path))
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Opens, classifies and grabs one device.  `None` if it is skipped.
    fn take(&self, path: &Path, explicit: bool) -> Option<(EventStream, String)> {
        let mut device = match Device::open(path) {
            Ok(device) => device,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "cannot open input device");
                return None;
            }
        };
        let name = device.name().unwrap_or("unnamed device").to_string();

        let kind = if explicit {
            None
        } else {
            let events = device.supported_events();
            let info = DeviceInfo {
                name: name.clone(),
                has_keys: events.contains(EventType::KEY),
                has_relative: events.contains(EventType::RELATIVE),
            };
            Some(self.selector.classify(&info)?)
        };

        if let Err(e) = device.grab() {
            warn!(path = %path.display(), device = %name, error = %e, "exclusive grab failed; skipping");
            return None;
        }
        let stream = match device.into_event_stream() {
            Ok(stream) => stream,
            Err(e) => {
                warn!(path = %path.display(), device = %name, error = %e, "cannot stream device events");
                return None;
            }
        };
        match kind {
            Some(kind) => info!(path = %path.display(), device = %name, %kind, "grabbed input device"),
            None => info!(path = %path.display(), device = %name, "grabbed configured input device"),
        }
        Some((stream, name))
    }
}

fn is_event_node(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with("event"))
}

#[async_trait]
impl InputSource for EvdevInputSource {
    async fn acquire(&self) -> Result<DeviceSet, InputError> {
        let explicit = !self.settings.devices.is_empty();
        let candidates = self.candidates()?;
        if !self.settings.grab_delay.is_zero() {
            debug!(delay_ms = self.settings.grab_delay.as_millis() as u64, "waiting before grab");
            tokio::time::sleep(self.settings.grab_delay).await;
        }

        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let stop = CancellationToken::new();
        let mut names = Vec::new();
        let mut readers = Vec::new();

        for path in candidates {
            let Some((stream, name)) = self.take(&path, explicit) else {
                continue;
            };
            readers.push(tokio::spawn(read_device(
                stream,
                name.clone(),
                tx.clone(),
                stop.clone(),
            )));
            names.push(name);
        }

        if readers.is_empty() {
            return Err(InputError::NoDevices);
        }
        Ok(DeviceSet::new(rx, names, stop, readers))
    }

    async fn release(&self, devices: DeviceSet) {
        let count = devices.names().len();
        devices.shutdown().await;
        debug!(count, "input readers stopped");
    }
}

/// Forwards one device's events until stopped, the queue closes, or the
/// device disappears.  Always ungrabs before returning.
async fn read_device(
    mut stream: EventStream,
    name: String,
    tx: mpsc::Sender<RawInputEvent>,
    stop: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = stop.cancelled() => break,
            event = stream.next_event() => event,
        };
        match event {
            Ok(event) => {
                let translated =
                    RawInputEvent::from_evdev(event.event_type().0, event.code(), event.value());
                if let Some(raw) = translated {
                    if tx.send(raw).await.is_err() {
                        break;
                    }
                }
            }
            Err(e) => {
                warn!(device = %name, error = %e, "input device lost");
                break;
            }
        }
    }
    if let Err(e) = stream.device_mut().ungrab() {
        debug!(device = %name, error = %e, "ungrab failed");
    }
    debug!(device = %name, "input reader finished");
}
