//! In-memory HID channels for testing the transport session without Bluetooth.
//!
//! # How it fits together
//!
//! [`memory_listener`] returns a listener (given to the session) and a
//! [`MemoryConnector`] (kept by the test).  Each [`MemoryConnector::connect`]
//! call plays the role of a remote host opening one L2CAP channel: the session
//! side receives a [`MemoryChannel`], the test keeps the matching [`PeerEnd`].
//!
//! ```ignore
//! let (control, control_host) = memory_listener();
//! let (interrupt, interrupt_host) = memory_listener();
//! // ... start the session with `control` and `interrupt` ...
//! let _ctrl = control_host.connect("AA:BB:CC:DD:EE:FF");
//! let mut intr = interrupt_host.connect("AA:BB:CC:DD:EE:FF");
//! let report = intr.recv().await;
//! ```
//!
//! Dropping a `PeerEnd` (or calling [`PeerEnd::hang_up`]) is seen by the
//! session as a zero-length read, exactly like a closed L2CAP socket.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::application::transport_session::{ChannelListener, HidChannel, PeerId};

type Incoming = io::Result<(MemoryChannel, PeerId)>;

/// Creates a listener and the connector that feeds it.
pub fn memory_listener() -> (MemoryListener, MemoryConnector) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        MemoryListener {
            incoming: Mutex::new(rx),
        },
        MemoryConnector { tx },
    )
}

/// Session-side listener.  Accept waits until the connector queues something.
pub struct MemoryListener {
    incoming: Mutex<mpsc::UnboundedReceiver<Incoming>>,
}

#[async_trait]
impl ChannelListener for MemoryListener {
    type Channel = MemoryChannel;

    async fn accept(&self) -> io::Result<(MemoryChannel, PeerId)> {
        let mut incoming = self.incoming.lock().await;
        match incoming.recv().await {
            Some(next) => next,
            // Connector gone: behave like an idle listener.
            None => std::future::pending().await,
        }
    }
}

/// Test-side handle that simulates remote hosts connecting.
#[derive(Clone)]
pub struct MemoryConnector {
    tx: mpsc::UnboundedSender<Incoming>,
}

impl MemoryConnector {
    /// Opens a channel from `peer` and returns the host end of it.
    pub fn connect(&self, peer: &str) -> PeerEnd {
        let (to_session, from_host) = mpsc::unbounded_channel();
        let (to_host, from_session) = mpsc::unbounded_channel();
        let channel = MemoryChannel {
            outbound: to_host,
            inbound: Mutex::new(from_host),
        };
        // A dropped listener just means nobody will accept.
        let _ = self.tx.send(Ok((channel, PeerId(peer.to_string()))));
        PeerEnd {
            outbound: Some(to_session),
            inbound: from_session,
        }
    }

    /// Makes the next accept fail with `kind`.
    pub fn fail_next_accept(&self, kind: io::ErrorKind) {
        let _ = self
            .tx
            .send(Err(io::Error::new(kind, "simulated accept failure")));
    }
}

/// Session side of an in-memory channel.
#[derive(Debug)]
pub struct MemoryChannel {
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    inbound: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

#[async_trait]
impl HidChannel for MemoryChannel {
    async fn send(&self, frame: &[u8]) -> io::Result<()> {
        self.outbound
            .send(frame.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "host hung up"))
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inbound = self.inbound.lock().await;
        match inbound.recv().await {
            Some(message) => {
                let n = message.len().min(buf.len());
                buf[..n].copy_from_slice(&message[..n]);
                Ok(n)
            }
            None => Ok(0),
        }
    }
}

/// Host side of an in-memory channel.
pub struct PeerEnd {
    outbound: Option<mpsc::UnboundedSender<Vec<u8>>>,
    inbound: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl PeerEnd {
    /// Sends one message to the session.  Returns `false` if the session side
    /// has already been closed.
    pub fn send(&self, frame: &[u8]) -> bool {
        match &self.outbound {
            Some(tx) => tx.send(frame.to_vec()).is_ok(),
            None => false,
        }
    }

    /// Waits for the next message from the session.  `None` once the session
    /// has closed its side.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.inbound.recv().await
    }

    /// Like [`recv`](Self::recv) but gives up after `limit`.
    pub async fn recv_timeout(&mut self, limit: Duration) -> Option<Vec<u8>> {
        tokio::time::timeout(limit, self.inbound.recv())
            .await
            .ok()
            .flatten()
    }

    /// Returns a message that is already queued, without waiting.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.inbound.try_recv().ok()
    }

    /// Closes the host's sending direction; the session reads end-of-stream.
    pub fn hang_up(&mut self) {
        self.outbound = None;
    }

    /// Stops accepting messages from the session while keeping the host's
    /// sending direction open.  Later session sends fail with `BrokenPipe`;
    /// the session's reads keep waiting.
    pub fn close_receiving(&mut self) {
        self.inbound.close();
    }

    /// Waits until the session has dropped its side of the channel.
    pub async fn closed(&mut self) {
        while self.inbound.recv().await.is_some() {}
    }
}
