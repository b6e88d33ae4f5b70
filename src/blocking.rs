//! Blocking variants of the client for callers without an async runtime.
//!
//! Thin wrappers that drive the async client on a private current-thread
//! runtime. Decoding, write staging and flush order are identical to the
//! async client. Do not use these from inside an async context; the
//! runtime would panic on nested blocking.

use std::time::Duration;

use tokio::runtime::{Builder, Runtime};

use crate::codec::datetime::DeviceDateTime;
use crate::codec::holiday::Holiday;
use crate::codec::schedule::{DaySchedule, Weekday};
use crate::codec::temperature::{TemperatureState, TemperatureUpdate};
use crate::error::Error;
use crate::link::{BleLink, BluestLink};
use crate::session::SessionState;
use crate::FieldValue;

fn runtime() -> Result<Runtime, Error> {
    Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|err| Error::Connection(format!("failed to start runtime: {err}")))
}

/// Blocking counterpart of [`crate::CometBlue`].
pub struct CometBlue<L: BleLink = BluestLink> {
    inner: crate::CometBlue<L>,
    runtime: Runtime,
}

impl CometBlue<BluestLink> {
    /// Client for the device with the given platform id, as reported by
    /// [`discover`].
    pub fn new(address: impl Into<String>) -> Result<Self, Error> {
        Self::with_link(BluestLink::new(address))
    }
}

impl<L: BleLink> CometBlue<L> {
    /// Client over a custom transport.
    pub fn with_link(link: L) -> Result<Self, Error> {
        Ok(Self {
            inner: crate::CometBlue::with_link(link),
            runtime: runtime()?,
        })
    }

    /// Set the device PIN, up to 8 digits. 0 means no authentication.
    pub fn with_pin(mut self, pin: u32) -> Self {
        self.inner = self.inner.with_pin(pin);
        self
    }

    /// Set the connection timeout (default 2 seconds).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.with_timeout(timeout);
        self
    }

    pub fn state(&self) -> SessionState {
        self.inner.state()
    }

    pub fn link(&self) -> &L {
        self.inner.link()
    }

    pub fn connect(&mut self) -> Result<(), Error> {
        self.runtime.block_on(self.inner.connect())
    }

    /// Flush staged writes and close the connection.
    pub fn disconnect(&mut self) -> Result<(), Error> {
        self.runtime.block_on(self.inner.disconnect())
    }

    /// Run `op` against a connected client, then disconnect.
    ///
    /// The disconnect (and with it the write flush) runs whether `op`
    /// succeeds or fails. An error from `op` takes precedence over a
    /// teardown error.
    pub fn connected<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.connect()?;
        let result = op(self);
        let teardown = self.disconnect();
        match result {
            Ok(value) => {
                teardown?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }

    pub fn get_temperature(&mut self) -> Result<TemperatureState, Error> {
        self.runtime.block_on(self.inner.get_temperature())
    }

    pub fn set_temperature(&mut self, update: TemperatureUpdate) -> Result<(), Error> {
        self.runtime.block_on(self.inner.set_temperature(update))
    }

    pub fn get_battery(&mut self) -> Result<u8, Error> {
        self.runtime.block_on(self.inner.get_battery())
    }

    pub fn get_datetime(&mut self) -> Result<DeviceDateTime, Error> {
        self.runtime.block_on(self.inner.get_datetime())
    }

    pub fn set_datetime(&mut self, value: DeviceDateTime) -> Result<(), Error> {
        self.runtime.block_on(self.inner.set_datetime(value))
    }

    pub fn get_weekday(&mut self, day: Weekday) -> Result<DaySchedule, Error> {
        self.runtime.block_on(self.inner.get_weekday(day))
    }

    pub fn set_weekday(&mut self, day: Weekday, value: DaySchedule) -> Result<(), Error> {
        self.runtime.block_on(self.inner.set_weekday(day, value))
    }

    pub fn set_weekdays(&mut self, values: &[(Weekday, DaySchedule)]) -> Result<(), Error> {
        self.runtime.block_on(self.inner.set_weekdays(values))
    }

    pub fn get_holiday(&mut self, slot: u8) -> Result<Option<Holiday>, Error> {
        self.runtime.block_on(self.inner.get_holiday(slot))
    }

    pub fn set_holiday(&mut self, slot: u8, value: Option<Holiday>) -> Result<(), Error> {
        self.runtime.block_on(self.inner.set_holiday(slot, value))
    }

    pub fn get_manual_mode(&mut self) -> Result<bool, Error> {
        self.runtime.block_on(self.inner.get_manual_mode())
    }

    pub fn set_manual_mode(&mut self, on: bool) -> Result<(), Error> {
        self.runtime.block_on(self.inner.set_manual_mode(on))
    }

    pub fn get_multiple(
        &mut self,
        names: &[&str],
    ) -> Result<std::collections::HashMap<String, FieldValue>, Error> {
        self.runtime.block_on(self.inner.get_multiple(names))
    }
}

/// Blocking counterpart of [`crate::discover`].
pub fn discover(scan_timeout: Duration) -> Result<Vec<String>, Error> {
    runtime()?.block_on(crate::discover(scan_timeout))
}
