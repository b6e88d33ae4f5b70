//! In-memory transport for tests and development without hardware.

use std::collections::HashMap;
use std::time::Duration;

use bluest::Uuid;

use crate::error::Error;
use crate::link::BleLink;

/// A transport operation recorded by [`MockLink`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOp {
    Connect,
    Disconnect,
    Read(Uuid),
    Write(Uuid, Vec<u8>),
}

/// A scriptable in-memory [`BleLink`].
///
/// Characteristic values live in a map. Writes are stored back so that
/// later reads observe them, like a device that applies every write. Every
/// transport call is recorded in an operation log for assertions.
#[derive(Debug, Clone, Default)]
pub struct MockLink {
    characteristics: HashMap<Uuid, Vec<u8>>,
    ops: Vec<LinkOp>,
    connected: bool,
    refuse_connect: bool,
    fail_writes_to: Option<Uuid>,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload a characteristic value.
    pub fn with_characteristic(mut self, id: Uuid, value: impl Into<Vec<u8>>) -> Self {
        self.characteristics.insert(id, value.into());
        self
    }

    /// Make `connect` fail.
    pub fn refuse_connect(mut self) -> Self {
        self.refuse_connect = true;
        self
    }

    /// Make writes to the given characteristic fail.
    pub fn fail_writes_to(mut self, id: Uuid) -> Self {
        self.fail_writes_to = Some(id);
        self
    }

    /// Everything the session did to the transport, in order.
    pub fn ops(&self) -> &[LinkOp] {
        &self.ops
    }

    /// The reads issued so far, in order.
    pub fn reads(&self) -> Vec<Uuid> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                LinkOp::Read(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// The writes issued so far, in order.
    pub fn writes(&self) -> Vec<(Uuid, Vec<u8>)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                LinkOp::Write(id, value) => Some((*id, value.clone())),
                _ => None,
            })
            .collect()
    }

    /// The current stored value of a characteristic.
    pub fn value(&self, id: Uuid) -> Option<&[u8]> {
        self.characteristics.get(&id).map(Vec::as_slice)
    }
}

impl BleLink for MockLink {
    async fn connect(&mut self, _timeout: Duration) -> Result<(), Error> {
        if self.refuse_connect {
            return Err(Error::Connection("mock refused to connect".to_string()));
        }
        self.ops.push(LinkOp::Connect);
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.ops.push(LinkOp::Disconnect);
        self.connected = false;
        Ok(())
    }

    async fn read_characteristic(&mut self, id: Uuid) -> Result<Vec<u8>, Error> {
        if !self.connected {
            return Err(Error::Connection("mock is not connected".to_string()));
        }
        self.ops.push(LinkOp::Read(id));
        self.characteristics
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::Connection(format!("mock has no characteristic {id}")))
    }

    async fn write_characteristic(&mut self, id: Uuid, value: &[u8]) -> Result<(), Error> {
        if !self.connected {
            return Err(Error::Connection("mock is not connected".to_string()));
        }
        if self.fail_writes_to == Some(id) {
            return Err(Error::Connection(format!("mock refused write to {id}")));
        }
        self.ops.push(LinkOp::Write(id, value.to_vec()));
        self.characteristics.insert(id, value.to_vec());
        Ok(())
    }
}
