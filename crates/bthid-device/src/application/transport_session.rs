//! TransportSession: the per-peer connection state machine.
//!
//! ```text
//!            accept(control)            accept(interrupt)          devices acquired
//! Listening ───────────────▶ ControlAccepted ───────────────▶ ─────────────────▶ Active
//!     ▲                            │ accept failed /                 │ no devices    │ hang-up, send error,
//!     │                            │ different peer                  │               │ unplug, devices lost,
//!     │◀───────────────────────────┘                                 │               │ shutdown
//!     │◀─────────────────────────────────────────────────────────────┘               ▼
//!     └──────────────────────────────────────────────────────────────────────── Closing
//! ```
//!
//! # One wait, one owner (for beginners)
//!
//! While `Active`, everything happens inside a single `tokio::select!`:
//! device events, both channel receives, the scheduler tick and the shutdown
//! token.  Whichever is ready first is handled to completion before the next
//! wait, so [`HidState`] is only ever touched by one piece of code at a time
//! and needs no lock.
//!
//! The select is `biased` with device events ahead of the tick, and every
//! queued device event is drained before waiting again.  A tick therefore
//! always sees the freshest accumulator state.
//!
//! # Seams
//!
//! The session never touches Bluetooth sockets or `/dev/input` directly.  It
//! talks to [`ChannelListener`]/[`HidChannel`] and [`InputSource`]; the real
//! implementations live in `infrastructure`, and tests plug in in-memory ones.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bthid_core::{
    ControlAction, ControlState, HidState, InputEventDispatcher, MotionScale, RawInputEvent,
    ReportScheduler,
};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, trace, warn, Instrument};
use uuid::Uuid;

/// Receive buffer size; the default L2CAP MTU.
const RECV_BUFFER_LEN: usize = 672;

/// Pause after a failed accept before listening again.
pub const DEFAULT_ACCEPT_RETRY: Duration = Duration::from_millis(100);

// ── Transport seam ────────────────────────────────────────────────────────────

/// Identity of the remote host (its Bluetooth address in production).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerId(pub String);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One connected, message-oriented HID channel (control or interrupt).
#[async_trait]
pub trait HidChannel: Send + Sync {
    /// Sends one complete HIDP message.
    async fn send(&self, frame: &[u8]) -> io::Result<()>;

    /// Receives one HIDP message into `buf`.  `Ok(0)` means the peer hung up.
    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;
}

/// A bound endpoint that hands out inbound channels.
#[async_trait]
pub trait ChannelListener: Send + Sync {
    type Channel: HidChannel;

    /// Waits for the next inbound connection.
    async fn accept(&self) -> io::Result<(Self::Channel, PeerId)>;
}

// ── Input seam ────────────────────────────────────────────────────────────────

/// Error type for input device acquisition.
#[derive(Debug, Error)]
pub enum InputError {
    /// No keyboard or mouse could be opened and exclusively grabbed.
    #[error("no keyboard or mouse could be grabbed")]
    NoDevices,

    /// The input device directory could not be read.
    #[error("could not scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The exclusively owned input devices of one session.
///
/// Events from every device arrive on one queue.  The queue closes when all
/// device readers have ended (e.g. every device was unplugged).
pub struct DeviceSet {
    events: mpsc::Receiver<RawInputEvent>,
    names: Vec<String>,
    stop: CancellationToken,
    readers: Vec<JoinHandle<()>>,
}

impl DeviceSet {
    /// Bundles the event queue with what is needed to stop its producers.
    ///
    /// `stop` is cancelled on [`shutdown`](Self::shutdown); every reader task
    /// must watch it, release its device and exit.
    pub fn new(
        events: mpsc::Receiver<RawInputEvent>,
        names: Vec<String>,
        stop: CancellationToken,
        readers: Vec<JoinHandle<()>>,
    ) -> Self {
        Self {
            events,
            names,
            stop,
            readers,
        }
    }

    /// Waits for the next event.  `None` once every reader has ended.
    pub async fn next_event(&mut self) -> Option<RawInputEvent> {
        self.events.recv().await
    }

    /// Returns an already queued event without waiting.
    pub fn try_next_event(&mut self) -> Option<RawInputEvent> {
        self.events.try_recv().ok()
    }

    /// Human-readable names of the grabbed devices.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Stops every reader and waits until they have released their devices.
    pub async fn shutdown(self) {
        let DeviceSet {
            events,
            stop,
            readers,
            ..
        } = self;
        stop.cancel();
        // A reader blocked on a full queue wakes up with a send error.
        drop(events);
        for reader in readers {
            if let Err(e) = reader.await {
                warn!(error = %e, "input reader task failed");
            }
        }
    }
}

/// Discovers and exclusively acquires local input devices.
#[async_trait]
pub trait InputSource: Send + Sync {
    /// Grabs every qualifying device.  Fails if none could be grabbed.
    async fn acquire(&self) -> Result<DeviceSet, InputError>;

    /// Relinquishes the devices of a finished session.
    async fn release(&self, devices: DeviceSet);
}

#[async_trait]
impl<T: InputSource + ?Sized> InputSource for Arc<T> {
    async fn acquire(&self) -> Result<DeviceSet, InputError> {
        (**self).acquire().await
    }

    async fn release(&self, devices: DeviceSet) {
        (**self).release(devices).await
    }
}

// ── Session state ─────────────────────────────────────────────────────────────

/// Lifecycle phase, published to observers through [`TransportSession::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Listening,
    ControlAccepted,
    Active,
    Closing,
}

/// Why a peer session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    ControlHangUp,
    InterruptHangUp,
    SendFailed,
    VirtualCableUnplug,
    InputLost,
    NoDevices,
    Shutdown,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CloseReason::ControlHangUp => "control channel hung up",
            CloseReason::InterruptHangUp => "interrupt channel hung up",
            CloseReason::SendFailed => "send failed",
            CloseReason::VirtualCableUnplug => "virtual cable unplugged",
            CloseReason::InputLost => "input devices lost",
            CloseReason::NoDevices => "no input devices",
            CloseReason::Shutdown => "shutdown",
        };
        f.write_str(text)
    }
}

/// Tunables of the session loop.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub scheduler: ReportScheduler,
    pub motion_scale: MotionScale,
    pub accept_retry: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scheduler: ReportScheduler::default(),
            motion_scale: MotionScale::default(),
            accept_retry: DEFAULT_ACCEPT_RETRY,
        }
    }
}

enum Accepted<C> {
    Channel(C, PeerId),
    Failed,
    Shutdown,
}

/// The connection state machine.  See the module documentation.
pub struct TransportSession<L: ChannelListener, S: InputSource> {
    control: L,
    interrupt: L,
    input: S,
    config: SessionConfig,
    cancel: CancellationToken,
    hid: HidState,
    phase: watch::Sender<SessionPhase>,
}

impl<L: ChannelListener, S: InputSource> TransportSession<L, S> {
    /// Creates a session over two bound listeners.  `cancel` ends [`run`](Self::run).
    pub fn new(
        control: L,
        interrupt: L,
        input: S,
        config: SessionConfig,
        cancel: CancellationToken,
    ) -> Self {
        let (phase, _) = watch::channel(SessionPhase::Listening);
        Self {
            control,
            interrupt,
            input,
            config,
            cancel,
            hid: HidState::new(),
            phase,
        }
    }

    /// Returns a receiver that observes every phase transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }

    /// Serves peers one after another until the cancellation token fires.
    pub async fn run(&mut self) {
        info!("waiting for a host to connect");
        loop {
            self.set_phase(SessionPhase::Listening);

            let (control, peer) = match self.accept_from(&self.control, "control").await {
                Accepted::Channel(channel, peer) => (channel, peer),
                Accepted::Failed => continue,
                Accepted::Shutdown => break,
            };
            info!(%peer, "control channel connected");
            self.set_phase(SessionPhase::ControlAccepted);

            let interrupt = match self.accept_from(&self.interrupt, "interrupt").await {
                Accepted::Channel(channel, from) if from == peer => channel,
                Accepted::Channel(_, from) => {
                    warn!(%peer, other = %from, "interrupt channel from a different host; dropping both");
                    continue;
                }
                Accepted::Failed => continue,
                Accepted::Shutdown => break,
            };
            info!(%peer, "interrupt channel connected");

            let span = info_span!("session", id = %Uuid::new_v4(), %peer);
            let reason = self.serve_peer(control, interrupt).instrument(span).await;
            if reason == CloseReason::Shutdown {
                break;
            }
        }
        info!("transport session stopped");
    }

    fn set_phase(&self, phase: SessionPhase) {
        self.phase.send_replace(phase);
    }

    async fn accept_from(&self, listener: &L, which: &'static str) -> Accepted<L::Channel> {
        let result = tokio::select! {
            _ = self.cancel.cancelled() => return Accepted::Shutdown,
            result = listener.accept() => result,
        };
        match result {
            Ok((channel, peer)) => Accepted::Channel(channel, peer),
            Err(e) => {
                warn!(channel = which, error = %e, "accept failed");
                tokio::select! {
                    _ = self.cancel.cancelled() => Accepted::Shutdown,
                    _ = time::sleep(self.config.accept_retry) => Accepted::Failed,
                }
            }
        }
    }

    /// Runs one peer from device acquisition to teardown.  Both channels are
    /// closed when this returns.
    async fn serve_peer(&mut self, control: L::Channel, interrupt: L::Channel) -> CloseReason {
        let acquired = tokio::select! {
            _ = self.cancel.cancelled() => return CloseReason::Shutdown,
            acquired = self.input.acquire() => acquired,
        };
        let mut devices = match acquired {
            Ok(devices) => devices,
            Err(e) => {
                warn!(error = %e, "could not acquire input devices; dropping host");
                return CloseReason::NoDevices;
            }
        };
        info!(devices = ?devices.names(), "input devices grabbed");
        self.set_phase(SessionPhase::Active);

        let mut peer = ActivePeer {
            control,
            interrupt,
            hid: &mut self.hid,
            control_state: ControlState::new(),
            dispatcher: InputEventDispatcher::new(self.config.motion_scale),
            scheduler: self.config.scheduler,
        };
        let reason = peer.run(&mut devices, &self.cancel).await;
        drop(peer);

        self.set_phase(SessionPhase::Closing);
        info!(%reason, "host disconnected");
        self.input.release(devices).await;
        info!("input devices released");
        self.hid.reset();
        reason
    }
}

// ── Active loop ───────────────────────────────────────────────────────────────

struct ActivePeer<'a, C: HidChannel> {
    control: C,
    interrupt: C,
    hid: &'a mut HidState,
    control_state: ControlState,
    dispatcher: InputEventDispatcher,
    scheduler: ReportScheduler,
}

impl<C: HidChannel> ActivePeer<'_, C> {
    async fn run(&mut self, devices: &mut DeviceSet, cancel: &CancellationToken) -> CloseReason {
        let mut tick = time::interval(self.scheduler.interval());
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut control_buf = [0u8; RECV_BUFFER_LEN];
        let mut interrupt_buf = [0u8; RECV_BUFFER_LEN];

        loop {
            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(CloseReason::Shutdown),
                event = devices.next_event() => match event {
                    Some(event) => self.on_input(event, devices).await,
                    None => Err(CloseReason::InputLost),
                },
                received = self.control.recv(&mut control_buf) => match received {
                    Ok(0) => Err(CloseReason::ControlHangUp),
                    Ok(n) => self.on_control(&control_buf[..n]).await,
                    Err(e) => {
                        debug!(error = %e, "control channel error");
                        Err(CloseReason::ControlHangUp)
                    }
                },
                received = self.interrupt.recv(&mut interrupt_buf) => match received {
                    Ok(0) => Err(CloseReason::InterruptHangUp),
                    Ok(n) => {
                        debug!(frame = ?&interrupt_buf[..n], "ignoring message on interrupt channel");
                        Ok(())
                    }
                    Err(e) => {
                        debug!(error = %e, "interrupt channel error");
                        Err(CloseReason::InterruptHangUp)
                    }
                },
                _ = tick.tick() => self.on_tick().await,
            };
            if let Err(reason) = step {
                return reason;
            }
        }
    }

    async fn on_input(
        &mut self,
        first: RawInputEvent,
        devices: &mut DeviceSet,
    ) -> Result<(), CloseReason> {
        self.apply(first).await?;
        while let Some(event) = devices.try_next_event() {
            self.apply(event).await?;
        }
        Ok(())
    }

    async fn apply(&mut self, event: RawInputEvent) -> Result<(), CloseReason> {
        if let Some(report) = self.dispatcher.dispatch(&mut *self.hid, event) {
            send_on(&self.interrupt, report.as_bytes()).await?;
        }
        Ok(())
    }

    async fn on_tick(&mut self) -> Result<(), CloseReason> {
        let interrupt = &self.interrupt;
        for report in self.scheduler.drain(&mut *self.hid) {
            send_on(interrupt, report.as_bytes()).await?;
        }
        Ok(())
    }

    async fn on_control(&mut self, message: &[u8]) -> Result<(), CloseReason> {
        trace!(frame = ?message, "control message");
        match self.control_state.handle_message(message, &*self.hid) {
            ControlAction::Reply(answer) => send_on(&self.control, &answer).await,
            ControlAction::Ignore => Ok(()),
            ControlAction::Unplug => Err(CloseReason::VirtualCableUnplug),
        }
    }
}

async fn send_on<C: HidChannel>(channel: &C, frame: &[u8]) -> Result<(), CloseReason> {
    trace!(frame = ?frame, "send");
    channel.send(frame).await.map_err(|e| {
        warn!(error = %e, "send failed");
        CloseReason::SendFailed
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
