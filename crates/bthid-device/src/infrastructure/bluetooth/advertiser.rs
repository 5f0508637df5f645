//! BlueZ service advertiser: prepares the adapter and registers the HID
//! SDP record as a D-Bus profile.
//!
//! The adapter's Class of Device is not settable over D-Bus; set
//! `Class = 0x002540` (peripheral, keyboard + pointing) in
//! `/etc/bluetooth/main.conf` so hosts show the right icon.

use async_trait::async_trait;
use bluer::rfcomm::{Profile, ProfileHandle, Role};
use bluer::{Adapter, Session, Uuid};
use tracing::{info, warn};

use crate::application::bridge::{AdvertiseError, ServiceAdvertiser, ServiceHandle, ServiceRecord};
use crate::infrastructure::bluetooth::service_record::{service_record_xml, HID_SERVICE_UUID};

/// Advertises the HID service through the system BlueZ daemon.
pub struct BluezAdvertiser {
    session: Session,
    adapter_name: Option<String>,
    discoverable: bool,
}

impl BluezAdvertiser {
    /// Connects to `bluetoothd` over the system bus.
    ///
    /// `adapter_name` selects e.g. `hci1`; `None` uses the default adapter.
    ///
    /// # Errors
    ///
    /// Returns [`AdvertiseError::Adapter`] if the D-Bus session cannot be opened.
    pub async fn connect(
        adapter_name: Option<String>,
        discoverable: bool,
    ) -> Result<Self, AdvertiseError> {
        let session = Session::new().await.map_err(adapter_error)?;
        Ok(Self {
            session,
            adapter_name,
            discoverable,
        })
    }

    async fn adapter(&self) -> Result<Adapter, AdvertiseError> {
        match &self.adapter_name {
            Some(name) => self.session.adapter(name).map_err(adapter_error),
            None => self.session.default_adapter().await.map_err(adapter_error),
        }
    }

    async fn prepare_adapter(&self, adapter: &Adapter, alias: &str) -> bluer::Result<()> {
        adapter.set_powered(true).await?;
        adapter.set_alias(alias.to_string()).await?;
        if self.discoverable {
            adapter.set_pairable(true).await?;
            adapter.set_discoverable_timeout(0).await?;
            adapter.set_discoverable(true).await?;
        }
        Ok(())
    }
}

fn adapter_error(e: bluer::Error) -> AdvertiseError {
    AdvertiseError::Adapter(e.to_string())
}

#[async_trait]
impl ServiceAdvertiser for BluezAdvertiser {
    async fn advertise(&self, record: &ServiceRecord) -> Result<ServiceHandle, AdvertiseError> {
        let adapter = self.adapter().await?;
        self.prepare_adapter(&adapter, &record.name)
            .await
            .map_err(adapter_error)?;
        let address = adapter.address().await.map_err(adapter_error)?;
        info!(
            adapter = adapter.name(),
            %address,
            discoverable = self.discoverable,
            "bluetooth adapter ready"
        );

        let profile = Profile {
            uuid: Uuid::from_u128(HID_SERVICE_UUID),
            name: Some(record.name.clone()),
            role: Some(Role::Server),
            require_authentication: Some(false),
            require_authorization: Some(false),
            auto_connect: Some(true),
            service_record: Some(service_record_xml(record)),
            ..Default::default()
        };
        let handle = self
            .session
            .register_profile(profile)
            .await
            .map_err(|e| AdvertiseError::Registration(e.to_string()))?;
        Ok(ServiceHandle::new(handle))
    }

    async fn withdraw(&self, handle: ServiceHandle) {
        // BlueZ unregisters the profile when its handle is dropped.
        match handle.downcast::<ProfileHandle>() {
            Some(profile) => drop(profile),
            None => warn!("withdraw called with a foreign service handle"),
        }
    }
}
