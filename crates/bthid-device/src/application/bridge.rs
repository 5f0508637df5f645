//! Process-level setup and teardown around the transport session.
//!
//! Order of operations:
//!
//! 1. Advertise the HID service.  Failure is fatal; nothing is bound.
//! 2. Bind the control listener, then the interrupt listener.  Failure is
//!    fatal; the service is withdrawn before returning.
//! 3. Run [`TransportSession`] until the cancellation token fires.
//! 4. Withdraw the service exactly once.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::io;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::application::transport_session::{
    ChannelListener, InputSource, SessionConfig, TransportSession,
};

/// What the peer learns about us during service discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub name: String,
    pub description: String,
    pub provider: String,
    pub control_psm: u16,
    pub interrupt_psm: u16,
}

/// Opaque token returned by [`ServiceAdvertiser::advertise`].
///
/// Whatever keeps the registration alive goes inside; withdrawing drops it.
pub struct ServiceHandle(Box<dyn Any + Send>);

impl ServiceHandle {
    pub fn new<T: Any + Send>(inner: T) -> Self {
        Self(Box::new(inner))
    }

    /// Recovers the concrete registration type.
    pub fn downcast<T: Any>(self) -> Option<T> {
        self.0.downcast::<T>().ok().map(|inner| *inner)
    }
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServiceHandle(..)")
    }
}

/// Error type for service advertisement.
#[derive(Debug, Error)]
pub enum AdvertiseError {
    #[error("bluetooth adapter unavailable: {0}")]
    Adapter(String),

    #[error("service registration rejected: {0}")]
    Registration(String),
}

/// Makes the HID service discoverable by peers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceAdvertiser: Send + Sync {
    /// Publishes the service record.
    ///
    /// # Errors
    ///
    /// Returns [`AdvertiseError`] if the adapter is unusable or the record is refused.
    async fn advertise(&self, record: &ServiceRecord) -> Result<ServiceHandle, AdvertiseError>;

    /// Removes a previously published record.
    async fn withdraw(&self, handle: ServiceHandle);
}

/// Setup failures.  Every variant terminates the process with a non-zero status.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to advertise HID service: {0}")]
    Advertise(#[from] AdvertiseError),

    #[error("failed to bind HID channels: {0}")]
    Bind(#[source] io::Error),
}

/// Runs the bridge until `cancel` fires.
///
/// `bind` is only invoked after advertisement succeeded and must return the
/// control and interrupt listeners, in that order.
///
/// # Errors
///
/// Returns [`BridgeError`] if advertisement or binding fails.  Once sessions
/// are running, nothing is fatal.
pub async fn serve<A, L, S, B, Fut>(
    advertiser: &A,
    record: &ServiceRecord,
    bind: B,
    input: S,
    config: SessionConfig,
    cancel: CancellationToken,
) -> Result<(), BridgeError>
where
    A: ServiceAdvertiser + ?Sized,
    L: ChannelListener,
    S: InputSource,
    B: FnOnce() -> Fut,
    Fut: Future<Output = io::Result<(L, L)>>,
{
    let handle = advertiser.advertise(record).await?;
    info!(name = %record.name, "HID service advertised");

    let (control, interrupt) = match bind().await {
        Ok(listeners) => listeners,
        Err(e) => {
            error!(error = %e, "binding HID channels failed");
            advertiser.withdraw(handle).await;
            return Err(BridgeError::Bind(e));
        }
    };
    info!(
        control_psm = record.control_psm,
        interrupt_psm = record.interrupt_psm,
        "listening for HID connections"
    );

    let mut session = TransportSession::new(control, interrupt, input, config, cancel);
    session.run().await;
    drop(session);

    advertiser.withdraw(handle).await;
    info!("HID service withdrawn");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
