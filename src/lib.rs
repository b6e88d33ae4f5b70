//! Control Eurotronic Comet Blue radiator thermostats over Bluetooth Low Energy.
//!
//! The Comet Blue (also sold rebranded, for example as Sygonix HT100 BT or
//! Xavax Hama) exposes its configuration as a handful of GATT
//! characteristics with small fixed-size binary payloads: temperatures as
//! half-degree bytes, weekly heating periods packed per day, holiday
//! overrides, the device clock, the battery level and a manual-mode flag.
//! The layouts follow the community reverse-engineering of the protocol;
//! there is no official documentation.
//!
//! Currently the following can be accessed:
//!
//! - Temperature setpoints, calibration offset and open-window state
//! - Weekly schedule (4 heating periods per day)
//! - Holiday overrides (8 slots)
//! - Device clock
//! - Battery level (%)
//! - Manual/schedule mode
//!
//! A protocol quirk worth knowing: the device only applies written values
//! once the connection closes. Setters on [`CometBlue`] therefore stage
//! their writes and [`CometBlue::disconnect`] flushes them; use
//! [`CometBlue::connected`] to get the flush on every exit path. Blocking
//! counterparts of the whole API live in [`blocking`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use cometblue::{CometBlue, TemperatureUpdate};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), cometblue::Error> {
//! let addresses = cometblue::discover(Duration::from_secs(5)).await?;
//! let mut thermostat = CometBlue::new(&addresses[0]).with_pin(123456);
//! thermostat
//!     .connected(async |t| {
//!         println!("{:?}", t.get_temperature().await?);
//!         t.set_temperature(TemperatureUpdate {
//!             manual_temp: Some(21.0),
//!             ..Default::default()
//!         })
//!         .await
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod blocking;
mod characteristic;
mod client;
mod codec;
mod error;
mod link;
pub mod mock;
mod session;

pub use characteristic::{Field, FieldValue, SERVICE};
pub use client::CometBlue;
pub use codec::datetime::DeviceDateTime;
pub use codec::holiday::Holiday;
pub use codec::schedule::{DaySchedule, TimeOfDay, TimeSlot, Weekday};
pub use codec::temperature::{TemperatureState, TemperatureUpdate};
pub use error::Error;
pub use link::{discover, BleLink, BluestLink};
pub use session::{Session, SessionState};
