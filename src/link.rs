//! Transport abstraction over the platform BLE stack.

use std::collections::HashMap;
use std::time::Duration;

use bluest::{Adapter, Characteristic, Device, Service, Uuid};
use futures_util::StreamExt;
use tokio::time::timeout;
use tracing::debug;

use crate::characteristic::SERVICE;
use crate::error::Error;

/// Raw GATT transport used by a session.
///
/// Implementations only move bytes; all protocol knowledge lives above
/// this trait. Exactly one operation is in flight at a time.
#[allow(async_fn_in_trait)]
pub trait BleLink {
    async fn connect(&mut self, timeout: Duration) -> Result<(), Error>;
    async fn disconnect(&mut self) -> Result<(), Error>;
    async fn read_characteristic(&mut self, id: Uuid) -> Result<Vec<u8>, Error>;
    async fn write_characteristic(&mut self, id: Uuid, value: &[u8]) -> Result<(), Error>;
}

/// `BleLink` backed by the platform Bluetooth adapter via `bluest`.
///
/// The device is located by scanning for the thermostat service and
/// matching the advertised device id (a MAC address on Linux and Windows,
/// a UUID on macOS).
pub struct BluestLink {
    address: String,
    adapter: Option<Adapter>,
    device: Option<Device>,
    service: Option<Service>,
    characteristics: HashMap<Uuid, Characteristic>,
}

impl BluestLink {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            adapter: None,
            device: None,
            service: None,
            characteristics: HashMap::new(),
        }
    }

    async fn find_device(adapter: &Adapter, address: &str) -> Result<Device, Error> {
        let mut scan = adapter.scan(&[SERVICE]).await?;
        while let Some(found) = scan.next().await {
            if found.device.id().to_string().eq_ignore_ascii_case(address) {
                return Ok(found.device);
            }
        }
        Err(Error::Connection(format!("device {address} not found")))
    }

    async fn characteristic(&mut self, id: Uuid) -> Result<Characteristic, Error> {
        if let Some(characteristic) = self.characteristics.get(&id) {
            return Ok(characteristic.clone());
        }
        let service = self.service.as_ref().ok_or(Error::NotConnected)?;
        let characteristic = service
            .discover_characteristics_with_uuid(id)
            .await?
            .first()
            .cloned()
            .ok_or_else(|| {
                Error::Connection(format!("device does not expose characteristic {id}"))
            })?;
        self.characteristics.insert(id, characteristic.clone());
        Ok(characteristic)
    }
}

impl BleLink for BluestLink {
    async fn connect(&mut self, connect_timeout: Duration) -> Result<(), Error> {
        let adapter = Adapter::default()
            .await
            .ok_or_else(|| Error::Connection("default bluetooth adapter not found".to_string()))?;
        adapter.wait_available().await?;

        debug!(address = %self.address, "scanning for device");
        let device = timeout(connect_timeout, Self::find_device(&adapter, &self.address))
            .await
            .map_err(|_| {
                Error::Connection(format!(
                    "device {} not found within {connect_timeout:?}",
                    self.address
                ))
            })??;

        adapter.connect_device(&device).await?;
        let service = device
            .discover_services_with_uuid(SERVICE)
            .await?
            .first()
            .cloned()
            .ok_or_else(|| {
                Error::Connection("device does not expose the thermostat service".to_string())
            })?;
        debug!(address = %self.address, "connected");

        self.adapter = Some(adapter);
        self.device = Some(device);
        self.service = Some(service);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.characteristics.clear();
        self.service = None;
        if let (Some(adapter), Some(device)) = (self.adapter.take(), self.device.take()) {
            adapter.disconnect_device(&device).await?;
            debug!(address = %self.address, "disconnected");
        }
        Ok(())
    }

    async fn read_characteristic(&mut self, id: Uuid) -> Result<Vec<u8>, Error> {
        let characteristic = self.characteristic(id).await?;
        let value = characteristic.read().await?;
        debug!(characteristic = %id, value = %hex::encode(&value), "read");
        Ok(value)
    }

    async fn write_characteristic(&mut self, id: Uuid, value: &[u8]) -> Result<(), Error> {
        let characteristic = self.characteristic(id).await?;
        debug!(characteristic = %id, value = %hex::encode(value), "write");
        characteristic.write(value).await?;
        Ok(())
    }
}

/// Whether an advertisement carries the thermostat service.
pub(crate) fn advertises_thermostat(services: &[Uuid]) -> bool {
    services.contains(&SERVICE)
}

/// Scan for Comet Blue devices and return their platform device ids,
/// usable with [`crate::CometBlue::new`].
pub async fn discover(scan_timeout: Duration) -> Result<Vec<String>, Error> {
    let adapter = Adapter::default()
        .await
        .ok_or_else(|| Error::Connection("default bluetooth adapter not found".to_string()))?;
    adapter.wait_available().await?;

    let mut scan = adapter.scan(&[SERVICE]).await?;
    let mut found = Vec::new();
    // the scan stream never ends on its own, the timeout elapsing is the
    // normal way out
    let _ = timeout(scan_timeout, async {
        while let Some(advertisement) = scan.next().await {
            if !advertises_thermostat(&advertisement.adv_data.services) {
                continue;
            }
            let id = advertisement.device.id().to_string();
            if !found.contains(&id) {
                debug!(device = %id, "discovered thermostat");
                found.push(id);
            }
        }
    })
    .await;
    Ok(found)
}
