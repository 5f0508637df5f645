//! L2CAP sequential-packet sockets for the HID control and interrupt channels.
//!
//! HIDP is message-oriented: one `send` is one HID transaction, one `recv`
//! returns exactly one.  SOCK_SEQPACKET preserves those boundaries, so no
//! framing is needed on top.
//!
//! Binding the HID PSMs (below 0x1001) requires `CAP_NET_BIND_SERVICE` or
//! root.  BlueZ's own `input` plugin listens on the same PSMs; it must be
//! disabled (`bluetoothd -P input`) for the bind to succeed.

use std::io;

use async_trait::async_trait;
use bluer::l2cap::{SeqPacket, SeqPacketListener, SocketAddr};
use bluer::{Address, AddressType};
use tracing::debug;

use crate::application::transport_session::{ChannelListener, HidChannel, PeerId};

/// A listening L2CAP endpoint on one PSM.
pub struct L2capListener {
    inner: SeqPacketListener,
    psm: u16,
}

impl L2capListener {
    /// Binds to `psm` on every local BR/EDR adapter.
    ///
    /// # Errors
    ///
    /// Returns the socket error if the PSM is taken or not permitted.
    pub async fn bind(psm: u16) -> io::Result<Self> {
        let addr = SocketAddr::new(Address::any(), AddressType::BrEdr, psm);
        let inner = SeqPacketListener::bind(addr).await?;
        debug!(psm, "L2CAP listener bound");
        Ok(Self { inner, psm })
    }

    pub fn psm(&self) -> u16 {
        self.psm
    }
}

#[async_trait]
impl ChannelListener for L2capListener {
    type Channel = L2capChannel;

    async fn accept(&self) -> io::Result<(L2capChannel, PeerId)> {
        let (socket, remote) = self.inner.accept().await?;
        debug!(psm = self.psm, peer = %remote.addr, "L2CAP connection accepted");
        Ok((L2capChannel { inner: socket }, PeerId(remote.addr.to_string())))
    }
}

/// One accepted L2CAP connection.  Dropping it closes the socket.
pub struct L2capChannel {
    inner: SeqPacket,
}

#[async_trait]
impl HidChannel for L2capChannel {
    async fn send(&self, frame: &[u8]) -> io::Result<()> {
        let written = self.inner.send(frame).await?;
        if written != frame.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short L2CAP write: {written} of {} bytes", frame.len()),
            ));
        }
        Ok(())
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.recv(buf).await
    }
}

/// Binds the control listener, then the interrupt listener.
///
/// # Errors
///
/// Fails on the first bind error; an already bound control listener is closed.
pub async fn bind_pair(
    control_psm: u16,
    interrupt_psm: u16,
) -> io::Result<(L2capListener, L2capListener)> {
    let control = L2capListener::bind(control_psm).await?;
    let interrupt = L2capListener::bind(interrupt_psm).await?;
    Ok((control, interrupt))
}
