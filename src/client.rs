//! Typed client surface over the session.

use std::collections::HashMap;
use std::time::Duration;

use crate::characteristic::{Field, FieldValue};
use crate::codec::datetime::{self, DeviceDateTime};
use crate::codec::holiday::{self, Holiday};
use crate::codec::schedule::{self, DaySchedule, Weekday};
use crate::codec::settings;
use crate::codec::temperature::{self, TemperatureState, TemperatureUpdate};
use crate::error::Error;
use crate::link::{BleLink, BluestLink};
use crate::session::{Session, SessionState};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Client for one Comet Blue thermostat.
///
/// Setters stage their writes and the device only applies them when
/// [`CometBlue::disconnect`] closes the connection; use
/// [`CometBlue::connected`] to get that guarantee on every exit path.
pub struct CometBlue<L: BleLink = BluestLink> {
    session: Session<L>,
}

impl CometBlue<BluestLink> {
    /// Client for the device with the given platform id, as reported by
    /// [`crate::discover`].
    pub fn new(address: impl Into<String>) -> Self {
        Self::with_link(BluestLink::new(address))
    }
}

impl<L: BleLink> CometBlue<L> {
    /// Client over a custom transport.
    pub fn with_link(link: L) -> Self {
        Self {
            session: Session::new(link, 0, DEFAULT_TIMEOUT),
        }
    }

    /// Set the device PIN, up to 8 digits. 0, the factory default, means
    /// the device is unprotected and no authentication is performed.
    pub fn with_pin(mut self, pin: u32) -> Self {
        self.session.set_pin(pin);
        self
    }

    /// Set the connection timeout (default 2 seconds).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.session.set_timeout(timeout);
        self
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn link(&self) -> &L {
        self.session.link()
    }

    pub async fn connect(&mut self) -> Result<(), Error> {
        self.session.connect().await
    }

    /// Flush staged writes and close the connection.
    pub async fn disconnect(&mut self) -> Result<(), Error> {
        self.session.disconnect().await
    }

    /// Run `op` against a connected client, then disconnect.
    ///
    /// The disconnect (and with it the write flush) runs whether `op`
    /// succeeds or fails. An error from `op` takes precedence over a
    /// teardown error.
    pub async fn connected<T>(
        &mut self,
        op: impl AsyncFnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.connect().await?;
        let result = op(self).await;
        let teardown = self.disconnect().await;
        match result {
            Ok(value) => {
                teardown?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }

    /// The temperature configuration and measurement state.
    pub async fn get_temperature(&mut self) -> Result<TemperatureState, Error> {
        let raw = self.session.read(Field::Temperature).await?;
        temperature::decode(&raw)
    }

    /// Stage a sparse temperature update. Fields left `None` keep their
    /// current device value; an empty update stages nothing.
    pub async fn set_temperature(&mut self, update: TemperatureUpdate) -> Result<(), Error> {
        if update.is_empty() {
            return Ok(());
        }
        let current = self.session.read_for_update(Field::Temperature).await?;
        let value = temperature::apply_update(&current, &update)?;
        self.session.stage_write(Field::Temperature, value)
    }

    /// Battery level in percent.
    pub async fn get_battery(&mut self) -> Result<u8, Error> {
        let raw = self.session.read(Field::Battery).await?;
        crate::codec::expect_len("battery", &raw, 1)?;
        Ok(raw[0])
    }

    /// The device clock.
    pub async fn get_datetime(&mut self) -> Result<DeviceDateTime, Error> {
        let raw = self.session.read(Field::DateTime).await?;
        datetime::decode(&raw)
    }

    /// Stage a device clock update.
    pub async fn set_datetime(&mut self, value: DeviceDateTime) -> Result<(), Error> {
        self.session
            .stage_write(Field::DateTime, datetime::encode(value).to_vec())
    }

    /// The heating periods of one day.
    pub async fn get_weekday(&mut self, day: Weekday) -> Result<DaySchedule, Error> {
        let raw = self.session.read(Field::Day(day)).await?;
        schedule::decode(&raw)
    }

    /// Stage a day's heating periods.
    pub async fn set_weekday(&mut self, day: Weekday, value: DaySchedule) -> Result<(), Error> {
        self.session
            .stage_write(Field::Day(day), schedule::encode(&value))
    }

    /// Stage heating periods for several days at once.
    pub async fn set_weekdays(
        &mut self,
        values: &[(Weekday, DaySchedule)],
    ) -> Result<(), Error> {
        for (day, value) in values {
            self.set_weekday(*day, *value).await?;
        }
        Ok(())
    }

    /// The configured holiday period, or `None` for an unused slot.
    /// Slots are numbered 1 to 8.
    pub async fn get_holiday(&mut self, slot: u8) -> Result<Option<Holiday>, Error> {
        let raw = self.session.read(holiday_field(slot)?).await?;
        holiday::decode(&raw)
    }

    /// Stage a holiday period; `None` clears the slot.
    pub async fn set_holiday(&mut self, slot: u8, value: Option<Holiday>) -> Result<(), Error> {
        let encoded = holiday::encode(value.as_ref())?;
        self.session.stage_write(holiday_field(slot)?, encoded.to_vec())
    }

    /// Whether the device follows the manual setpoint instead of the
    /// weekly schedule.
    pub async fn get_manual_mode(&mut self) -> Result<bool, Error> {
        let raw = self.session.read(Field::ManualMode).await?;
        settings::decode_manual_mode(&raw)
    }

    /// Stage a manual-mode change. The other settings flags packed into
    /// the same characteristic keep their current values.
    pub async fn set_manual_mode(&mut self, on: bool) -> Result<(), Error> {
        let current = self.session.read_for_update(Field::ManualMode).await?;
        let value = settings::apply_manual_mode(&current, on)?;
        self.session.stage_write(Field::ManualMode, value)
    }

    /// Read several fields in one pass.
    ///
    /// `weekdays` expands to Monday..Sunday and `holidays` to
    /// holiday1..holiday8, reads happen in the expanded order, and the
    /// result is keyed by the constituent field names. The first failure
    /// aborts the batch and names the failing field; an unknown name fails
    /// before any transport operation.
    pub async fn get_multiple(
        &mut self,
        names: &[&str],
    ) -> Result<HashMap<String, FieldValue>, Error> {
        let fields = Field::resolve_many(names)?;
        let mut values = HashMap::with_capacity(fields.len());
        for (name, field) in fields {
            let value = self
                .read_value(field)
                .await
                .map_err(|err| err.for_field(&name))?;
            values.insert(name, value);
        }
        Ok(values)
    }

    async fn read_value(&mut self, field: Field) -> Result<FieldValue, Error> {
        let raw = self.session.read(field).await?;
        field.decode(&raw)
    }
}

fn holiday_field(slot: u8) -> Result<Field, Error> {
    if !(1..=8).contains(&slot) {
        return Err(Error::OutOfRange(format!(
            "holiday slot {slot} outside 1 to 8"
        )));
    }
    Ok(Field::Holiday(slot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::characteristic::PIN_CHARACTERISTIC;
    use crate::mock::{LinkOp, MockLink};

    fn client(link: MockLink) -> CometBlue<MockLink> {
        CometBlue::with_link(link)
    }

    fn link_with_weekdays() -> MockLink {
        let mut link = MockLink::new();
        for day in Weekday::ALL {
            link = link.with_characteristic(Field::Day(day).uuid(), [0u8; 8]);
        }
        link
    }

    #[tokio::test]
    async fn test_end_to_end_temperature_read_with_pin() {
        let link = MockLink::new()
            .with_characteristic(Field::Temperature.uuid(), [49, 32, 32, 40, 0, 1, 10]);
        let mut client = client(link).with_pin(123456);

        let state = client
            .connected(async |c| c.get_temperature().await)
            .await
            .unwrap();

        assert_eq!(
            state,
            TemperatureState {
                current_temp: 24.5,
                manual_temp: 16.0,
                target_temp_low: 16.0,
                target_temp_high: 20.0,
                temp_offset: 0.0,
                window_open: true,
                window_open_minutes: 10,
            }
        );
        assert_eq!(
            client.link().ops()[..2],
            [
                LinkOp::Connect,
                LinkOp::Write(PIN_CHARACTERISTIC, vec![0x40, 0xE2, 0x01, 0x00]),
            ]
        );
    }

    #[tokio::test]
    async fn test_sparse_update_preserves_other_fields() {
        let link = MockLink::new()
            .with_characteristic(Field::Temperature.uuid(), [49, 32, 32, 40, 0xFF, 1, 10]);
        let mut client = client(link);

        client
            .connected(async |c| {
                c.set_temperature(TemperatureUpdate {
                    target_temp_low: Some(18.0),
                    ..Default::default()
                })
                .await
            })
            .await
            .unwrap();

        let state = client
            .connected(async |c| c.get_temperature().await)
            .await
            .unwrap();
        assert_eq!(state.target_temp_low, 18.0);
        assert_eq!(state.manual_temp, 16.0);
        assert_eq!(state.target_temp_high, 20.0);
        assert_eq!(state.temp_offset, -0.5);
        assert_eq!(state.window_open_minutes, 10);
    }

    #[tokio::test]
    async fn test_set_weekday_defers_write_until_disconnect() {
        let monday = Field::Day(Weekday::Monday);
        let mut client = client(MockLink::new());
        client.connect().await.unwrap();

        let schedule = DaySchedule::with_periods(&[crate::TimeSlot {
            start: "06:00".parse().unwrap(),
            end: "08:30".parse().unwrap(),
        }])
        .unwrap();
        client.set_weekday(Weekday::Monday, schedule).await.unwrap();
        assert!(client.link().writes().is_empty());

        client.disconnect().await.unwrap();
        assert_eq!(
            client.link().writes(),
            vec![(monday.uuid(), vec![36, 51, 0, 0, 0, 0, 0, 0])]
        );
    }

    #[tokio::test]
    async fn test_get_multiple_weekdays_reads_monday_through_sunday() {
        let mut client = client(link_with_weekdays());
        client.connect().await.unwrap();

        let values = client.get_multiple(&["weekdays"]).await.unwrap();
        assert_eq!(values.len(), 7);
        assert!(matches!(values["monday"], FieldValue::Schedule(_)));

        let expected: Vec<_> = Weekday::ALL.iter().map(|d| Field::Day(*d).uuid()).collect();
        assert_eq!(client.link().reads(), expected);
    }

    #[tokio::test]
    async fn test_get_multiple_unknown_field_does_no_transport_work() {
        let mut client = client(MockLink::new());
        client.connect().await.unwrap();

        let err = client.get_multiple(&["temperature", "bogus"]).await.unwrap_err();
        assert!(matches!(err, Error::UnknownField(name) if name == "bogus"));
        assert_eq!(client.link().ops(), &[LinkOp::Connect]);
    }

    #[tokio::test]
    async fn test_get_multiple_names_failing_field() {
        // battery characteristic missing from the mock
        let mut client = client(MockLink::new());
        client.connect().await.unwrap();

        let err = client.get_multiple(&["battery"]).await.unwrap_err();
        assert!(err.to_string().contains("battery"));
    }

    #[tokio::test]
    async fn test_holiday_round_trip() {
        let slot = 2;
        let link =
            MockLink::new().with_characteristic(Field::Holiday(slot).uuid(), [0u8; 9]);
        let mut client = client(link);

        let holiday = Holiday {
            start: DeviceDateTime::new(2020, 12, 26, 18, 0).unwrap(),
            end: DeviceDateTime::new(2021, 1, 5, 14, 0).unwrap(),
            temperature: 16.5,
        };

        client
            .connected(async |c| c.set_holiday(slot, Some(holiday)).await)
            .await
            .unwrap();
        let read_back = client
            .connected(async |c| c.get_holiday(slot).await)
            .await
            .unwrap();
        assert_eq!(read_back, Some(holiday));

        client
            .connected(async |c| c.set_holiday(slot, None).await)
            .await
            .unwrap();
        let cleared = client
            .connected(async |c| c.get_holiday(slot).await)
            .await
            .unwrap();
        assert_eq!(cleared, None);
    }

    #[tokio::test]
    async fn test_holiday_slot_bounds() {
        let mut client = client(MockLink::new());
        client.connect().await.unwrap();
        assert!(matches!(
            client.get_holiday(0).await,
            Err(Error::OutOfRange(_))
        ));
        assert!(matches!(
            client.get_holiday(9).await,
            Err(Error::OutOfRange(_))
        ));
    }

    #[tokio::test]
    async fn test_set_manual_mode_preserves_neighbor_flags() {
        let link = MockLink::new().with_characteristic(Field::ManualMode.uuid(), [0x80, 2, 3]);
        let mut client = client(link);

        client
            .connected(async |c| c.set_manual_mode(true).await)
            .await
            .unwrap();

        assert_eq!(
            client.link().value(Field::ManualMode.uuid()),
            Some(&[0x81, 2, 3][..])
        );
        let on = client
            .connected(async |c| c.get_manual_mode().await)
            .await
            .unwrap();
        assert!(on);
    }

    #[tokio::test]
    async fn test_connected_disconnects_on_error() {
        let mut client = client(link_with_weekdays());

        let err = client
            .connected(async |c| c.get_multiple(&["bogus"]).await)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownField(_)));
        assert_eq!(client.state(), SessionState::Disconnected);
        assert_eq!(
            client.link().ops(),
            &[LinkOp::Connect, LinkOp::Disconnect]
        );
    }

    #[tokio::test]
    async fn test_operations_require_connection() {
        let mut client = client(MockLink::new());
        assert!(matches!(
            client.get_battery().await,
            Err(Error::NotConnected)
        ));
        assert!(matches!(
            client.set_manual_mode(true).await,
            Err(Error::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_two_updates_to_one_characteristic_compose() {
        let link = MockLink::new()
            .with_characteristic(Field::Temperature.uuid(), [49, 32, 32, 40, 0, 0, 10]);
        let mut client = client(link);

        client
            .connected(async |c| {
                c.set_temperature(TemperatureUpdate {
                    manual_temp: Some(21.0),
                    ..Default::default()
                })
                .await?;
                c.set_temperature(TemperatureUpdate {
                    target_temp_high: Some(22.0),
                    ..Default::default()
                })
                .await
            })
            .await
            .unwrap();

        // both updates land in a single flush write
        let writes = client.link().writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].1, vec![49, 42, 32, 44, 0, 0, 10]);
    }
}
