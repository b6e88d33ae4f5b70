//! Connection lifecycle and write buffering.

use std::time::Duration;

use tracing::debug;

use crate::characteristic::{Field, PIN_CHARACTERISTIC};
use crate::codec;
use crate::error::Error;
use crate::link::BleLink;

/// Lifecycle of a device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Authenticating,
    Ready,
    Closing,
}

/// One authenticated connection to a device.
///
/// Writes are not sent when staged. The firmware only applies
/// characteristic writes once the connection closes, so the session keeps
/// one dirty entry per characteristic and flushes them, in staging order,
/// when [`Session::disconnect`] runs.
pub struct Session<L> {
    link: L,
    pin: u32,
    timeout: Duration,
    state: SessionState,
    pending: Vec<(Field, Vec<u8>)>,
}

impl<L: BleLink> Session<L> {
    pub fn new(link: L, pin: u32, timeout: Duration) -> Self {
        Self {
            link,
            pin,
            timeout,
            state: SessionState::Disconnected,
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub(crate) fn set_pin(&mut self, pin: u32) {
        self.pin = pin;
    }

    pub(crate) fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Number of characteristics with staged, unflushed writes.
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Open the transport and authenticate.
    ///
    /// A PIN of 0 means the device is unprotected and the PIN write is
    /// skipped. A no-op when the session is already ready.
    pub async fn connect(&mut self) -> Result<(), Error> {
        if self.state == SessionState::Ready {
            return Ok(());
        }
        let pin = codec::encode_pin(self.pin)?;

        self.state = SessionState::Connecting;
        if let Err(err) = self.link.connect(self.timeout).await {
            self.state = SessionState::Disconnected;
            return Err(err);
        }

        if self.pin != 0 {
            self.state = SessionState::Authenticating;
            debug!("authenticating");
            if let Err(err) = self.link.write_characteristic(PIN_CHARACTERISTIC, &pin).await {
                let _ = self.link.disconnect().await;
                self.state = SessionState::Disconnected;
                return Err(Error::Auth(err.to_string()));
            }
        }

        self.state = SessionState::Ready;
        Ok(())
    }

    /// Read the raw bytes of a field's characteristic.
    pub async fn read(&mut self, field: Field) -> Result<Vec<u8>, Error> {
        self.ensure_ready()?;
        self.link.read_characteristic(field.uuid()).await
    }

    /// Base value for a read-modify-write update: the staged bytes when the
    /// characteristic is already dirty, otherwise a fresh device read.
    /// Without this, two staged updates to one characteristic would clobber
    /// each other.
    pub async fn read_for_update(&mut self, field: Field) -> Result<Vec<u8>, Error> {
        self.ensure_ready()?;
        if let Some((_, staged)) = self.pending.iter().find(|(dirty, _)| *dirty == field) {
            return Ok(staged.clone());
        }
        self.link.read_characteristic(field.uuid()).await
    }

    /// Stage a write for the flush at disconnect. Staging the same field
    /// again replaces its bytes without moving its flush position.
    pub fn stage_write(&mut self, field: Field, value: Vec<u8>) -> Result<(), Error> {
        self.ensure_ready()?;
        debug!(field = %field, value = %hex::encode(&value), "staged write");
        match self.pending.iter_mut().find(|(dirty, _)| *dirty == field) {
            Some(entry) => entry.1 = value,
            None => self.pending.push((field, value)),
        }
        Ok(())
    }

    /// Flush staged writes and close the connection.
    ///
    /// One transport write per dirty characteristic, in staging order. The
    /// first failed write aborts the rest of the flush; the transport is
    /// torn down either way and the write error wins. A no-op when already
    /// disconnected.
    pub async fn disconnect(&mut self) -> Result<(), Error> {
        if self.state == SessionState::Disconnected {
            return Ok(());
        }
        self.state = SessionState::Closing;
        let flushed = self.flush().await;
        let teardown = self.link.disconnect().await;
        self.state = SessionState::Disconnected;
        flushed?;
        teardown
    }

    async fn flush(&mut self) -> Result<(), Error> {
        let pending = std::mem::take(&mut self.pending);
        for (field, value) in &pending {
            if let Err(err) = self.link.write_characteristic(field.uuid(), value).await {
                debug!(field = %field, "flush failed");
                return Err(err.for_field(&field.to_string()));
            }
        }
        Ok(())
    }

    fn ensure_ready(&self) -> Result<(), Error> {
        if self.state == SessionState::Ready {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }
}
