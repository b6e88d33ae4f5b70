//! Mapping between field names, GATT characteristics and codecs.
//!
//! Field names are part of the public contract: callers pass them as data
//! (for example to `get_multiple`), so the exact spellings matter. The
//! vocabulary is `temperature`, `battery`, `datetime`, `manualMode`,
//! `monday`..`sunday`, `holiday1`..`holiday8` plus the composites
//! `weekdays` and `holidays`.

use std::fmt;

use bluest::Uuid;

use crate::codec::datetime::DeviceDateTime;
use crate::codec::holiday::Holiday;
use crate::codec::schedule::{DaySchedule, Weekday};
use crate::codec::temperature::TemperatureState;
use crate::codec::{datetime, holiday, schedule, settings, temperature};
use crate::error::Error;

/// The GATT service advertised by Comet Blue devices.
pub const SERVICE: Uuid = Uuid::from_u128(0x47e9ee00_47e9_11e4_8939_164230d1df67);

pub(crate) const PIN_CHARACTERISTIC: Uuid = Uuid::from_u128(0x47e9ee30_47e9_11e4_8939_164230d1df67);

const DATETIME: Uuid = Uuid::from_u128(0x47e9ee01_47e9_11e4_8939_164230d1df67);
const SETTINGS: Uuid = Uuid::from_u128(0x47e9ee2a_47e9_11e4_8939_164230d1df67);
const TEMPERATURE: Uuid = Uuid::from_u128(0x47e9ee2b_47e9_11e4_8939_164230d1df67);
const BATTERY: Uuid = Uuid::from_u128(0x47e9ee2c_47e9_11e4_8939_164230d1df67);

const DAYS: [Uuid; 7] = [
    Uuid::from_u128(0x47e9ee10_47e9_11e4_8939_164230d1df67),
    Uuid::from_u128(0x47e9ee11_47e9_11e4_8939_164230d1df67),
    Uuid::from_u128(0x47e9ee12_47e9_11e4_8939_164230d1df67),
    Uuid::from_u128(0x47e9ee13_47e9_11e4_8939_164230d1df67),
    Uuid::from_u128(0x47e9ee14_47e9_11e4_8939_164230d1df67),
    Uuid::from_u128(0x47e9ee15_47e9_11e4_8939_164230d1df67),
    Uuid::from_u128(0x47e9ee16_47e9_11e4_8939_164230d1df67),
];

const HOLIDAYS: [Uuid; 8] = [
    Uuid::from_u128(0x47e9ee20_47e9_11e4_8939_164230d1df67),
    Uuid::from_u128(0x47e9ee21_47e9_11e4_8939_164230d1df67),
    Uuid::from_u128(0x47e9ee22_47e9_11e4_8939_164230d1df67),
    Uuid::from_u128(0x47e9ee23_47e9_11e4_8939_164230d1df67),
    Uuid::from_u128(0x47e9ee24_47e9_11e4_8939_164230d1df67),
    Uuid::from_u128(0x47e9ee25_47e9_11e4_8939_164230d1df67),
    Uuid::from_u128(0x47e9ee26_47e9_11e4_8939_164230d1df67),
    Uuid::from_u128(0x47e9ee27_47e9_11e4_8939_164230d1df67),
];

/// A readable or writable device field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Temperature,
    Battery,
    DateTime,
    ManualMode,
    Day(Weekday),
    /// Holiday slot, 1 to 8.
    Holiday(u8),
}

impl Field {
    /// Resolve a single field name.
    pub fn resolve(name: &str) -> Result<Field, Error> {
        if let Some(day) = Weekday::from_name(name) {
            return Ok(Field::Day(day));
        }
        if let Some(digits) = name.strip_prefix("holiday") {
            if let Ok(slot @ 1..=8) = digits.parse() {
                return Ok(Field::Holiday(slot));
            }
        }
        match name {
            "temperature" => Ok(Field::Temperature),
            "battery" => Ok(Field::Battery),
            "datetime" => Ok(Field::DateTime),
            "manualMode" => Ok(Field::ManualMode),
            _ => Err(Error::UnknownField(name.to_string())),
        }
    }

    /// Resolve a list of names, expanding `weekdays` to Monday..Sunday and
    /// `holidays` to holiday1..holiday8. Duplicates keep their first
    /// position. Fails on the first unknown name.
    pub fn resolve_many(names: &[&str]) -> Result<Vec<(String, Field)>, Error> {
        let mut fields: Vec<(String, Field)> = Vec::new();
        let mut push = |fields: &mut Vec<(String, Field)>, field: Field| {
            let name = field.to_string();
            if !fields.iter().any(|(existing, _)| *existing == name) {
                fields.push((name, field));
            }
        };
        for name in names {
            match *name {
                "weekdays" => {
                    for day in Weekday::ALL {
                        push(&mut fields, Field::Day(day));
                    }
                }
                "holidays" => {
                    for slot in 1..=8 {
                        push(&mut fields, Field::Holiday(slot));
                    }
                }
                name => push(&mut fields, Field::resolve(name)?),
            }
        }
        Ok(fields)
    }

    /// The GATT characteristic holding this field.
    pub fn uuid(self) -> Uuid {
        match self {
            Field::Temperature => TEMPERATURE,
            Field::Battery => BATTERY,
            Field::DateTime => DATETIME,
            Field::ManualMode => SETTINGS,
            Field::Day(day) => DAYS[day.index()],
            Field::Holiday(slot) => HOLIDAYS[slot as usize - 1],
        }
    }

    pub(crate) fn decode(self, raw: &[u8]) -> Result<FieldValue, Error> {
        match self {
            Field::Temperature => Ok(FieldValue::Temperature(temperature::decode(raw)?)),
            Field::Battery => {
                crate::codec::expect_len("battery", raw, 1)?;
                Ok(FieldValue::Battery(raw[0]))
            }
            Field::DateTime => Ok(FieldValue::DateTime(datetime::decode(raw)?)),
            Field::ManualMode => Ok(FieldValue::ManualMode(settings::decode_manual_mode(raw)?)),
            Field::Day(_) => Ok(FieldValue::Schedule(schedule::decode(raw)?)),
            Field::Holiday(_) => Ok(FieldValue::Holiday(holiday::decode(raw)?)),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Temperature => f.write_str("temperature"),
            Field::Battery => f.write_str("battery"),
            Field::DateTime => f.write_str("datetime"),
            Field::ManualMode => f.write_str("manualMode"),
            Field::Day(day) => f.write_str(day.name()),
            Field::Holiday(slot) => write!(f, "holiday{slot}"),
        }
    }
}

/// A decoded field value, tagged by field kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Temperature(TemperatureState),
    /// Battery level in percent.
    Battery(u8),
    DateTime(DeviceDateTime),
    ManualMode(bool),
    Schedule(DaySchedule),
    /// `None` when the holiday slot is unused.
    Holiday(Option<Holiday>),
}
