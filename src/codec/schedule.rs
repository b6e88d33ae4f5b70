//! Codec for the per-day schedule characteristics.
//!
//! Each weekday characteristic holds four heating periods packed as one byte
//! per time point in 10-minute units (`hour * 6 + minute / 10`). Bytes of
//! 0x90 (24:00) and above mark an unused point; the firmware also treats a
//! period whose start equals its end as disabled.

use std::fmt;
use std::str::FromStr;

use crate::codec::expect_len;
use crate::error::Error;

pub(crate) const LEN: usize = 8;

/// First byte value past the end of the day, used as the unset sentinel.
const UNSET: u8 = 0x90;

/// Days of the week, in device characteristic order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }

    pub(crate) fn from_name(name: &str) -> Option<Weekday> {
        Weekday::ALL.into_iter().find(|day| day.name() == name)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A wall-clock time at the device's 10-minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self, Error> {
        if hour > 23 {
            return Err(Error::OutOfRange(format!("hour {hour} above 23")));
        }
        if minute > 59 {
            return Err(Error::OutOfRange(format!("minute {minute} above 59")));
        }
        if minute % 10 != 0 {
            return Err(Error::OutOfRange(format!(
                "minute {minute} is not on the device's 10-minute grid"
            )));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let (hour, minute) = s
            .split_once(':')
            .ok_or_else(|| Error::OutOfRange(format!("time {s:?} is not in HH:MM form")))?;
        let hour = hour
            .parse()
            .map_err(|_| Error::OutOfRange(format!("time {s:?} has a bad hour")))?;
        let minute = minute
            .parse()
            .map_err(|_| Error::OutOfRange(format!("time {s:?} has a bad minute")))?;
        TimeOfDay::new(hour, minute)
    }
}

/// One heating period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

/// The switching program of a single day: up to four heating periods,
/// unused entries are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaySchedule {
    pub slots: [Option<TimeSlot>; 4],
}

impl DaySchedule {
    /// A schedule with the given periods in the leading slots.
    pub fn with_periods(periods: &[TimeSlot]) -> Result<Self, Error> {
        if periods.len() > 4 {
            return Err(Error::OutOfRange(format!(
                "{} heating periods, the device stores at most 4",
                periods.len()
            )));
        }
        let mut slots = [None; 4];
        for (slot, period) in slots.iter_mut().zip(periods) {
            *slot = Some(*period);
        }
        Ok(Self { slots })
    }

    /// The enabled periods, in slot order.
    pub fn periods(&self) -> impl Iterator<Item = &TimeSlot> {
        self.slots.iter().flatten()
    }
}

fn encode_point(time: TimeOfDay) -> u8 {
    time.hour * 6 + time.minute / 10
}

fn decode_point(byte: u8) -> Option<TimeOfDay> {
    if byte >= UNSET {
        return None;
    }
    Some(TimeOfDay {
        hour: byte / 6,
        minute: (byte % 6) * 10,
    })
}

/// Encode a day's program. Enabled periods are compacted into the leading
/// slots and the rest is zero padded, which is how the device expects
/// unused slots to be written.
pub(crate) fn encode(schedule: &DaySchedule) -> Vec<u8> {
    let mut raw = Vec::with_capacity(LEN);
    for slot in schedule.periods() {
        if slot.start == slot.end {
            continue;
        }
        raw.push(encode_point(slot.start));
        raw.push(encode_point(slot.end));
    }
    raw.resize(LEN, 0);
    raw
}

pub(crate) fn decode(raw: &[u8]) -> Result<DaySchedule, Error> {
    expect_len("schedule", raw, LEN)?;
    let mut slots = [None; 4];
    for (slot, pair) in slots.iter_mut().zip(raw.chunks(2)) {
        *slot = match (decode_point(pair[0]), decode_point(pair[1])) {
            (Some(start), Some(end)) if start != end => Some(TimeSlot { start, end }),
            _ => None,
        };
    }
    Ok(DaySchedule { slots })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(start: &str, end: &str) -> TimeSlot {
        TimeSlot {
            start: start.parse().unwrap(),
            end: end.parse().unwrap(),
        }
    }

    #[test]
    fn test_point_round_trip_whole_grid() {
        for hour in 0..24 {
            for minute in [0, 10, 20, 30, 40, 50] {
                let time = TimeOfDay::new(hour, minute).unwrap();
                assert_eq!(decode_point(encode_point(time)), Some(time));
            }
        }
    }

    #[test]
    fn test_decode_point_sentinel() {
        assert_eq!(decode_point(0x8F), Some(TimeOfDay::new(23, 50).unwrap()));
        assert_eq!(decode_point(0x90), None);
        assert_eq!(decode_point(0xFF), None);
    }

    #[test]
    fn test_time_of_day_validation() {
        assert!(matches!(TimeOfDay::new(24, 0), Err(Error::OutOfRange(_))));
        assert!(matches!(TimeOfDay::new(12, 60), Err(Error::OutOfRange(_))));
        assert!(matches!(TimeOfDay::new(13, 37), Err(Error::OutOfRange(_))));
    }

    #[test]
    fn test_time_of_day_parse_and_display() {
        let time: TimeOfDay = "21:20".parse().unwrap();
        assert_eq!((time.hour(), time.minute()), (21, 20));
        assert_eq!(time.to_string(), "21:20");
        assert!("21".parse::<TimeOfDay>().is_err());
        assert!("21:2x".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn test_encode_compacts_periods() {
        let schedule = DaySchedule {
            slots: [
                None,
                Some(slot("06:00", "08:30")),
                None,
                Some(slot("17:00", "22:00")),
            ],
        };
        assert_eq!(encode(&schedule), vec![36, 51, 102, 132, 0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_skips_equal_start_end() {
        let schedule = DaySchedule::with_periods(&[slot("06:00", "06:00")]).unwrap();
        assert_eq!(encode(&schedule), vec![0; LEN]);
    }

    #[test]
    fn test_decode_round_trip() {
        let schedule = DaySchedule::with_periods(&[slot("06:00", "08:30"), slot("17:00", "22:00")])
            .unwrap();
        assert_eq!(decode(&encode(&schedule)).unwrap(), schedule);
    }

    #[test]
    fn test_decode_all_unset() {
        let schedule = decode(&[0x90; LEN]).unwrap();
        assert_eq!(schedule, DaySchedule::default());
        let schedule = decode(&[0; LEN]).unwrap();
        assert_eq!(schedule, DaySchedule::default());
    }

    #[test]
    fn test_decode_wrong_length() {
        assert!(matches!(decode(&[0; 7]), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_with_periods_rejects_more_than_four() {
        let period = slot("06:00", "07:00");
        assert!(DaySchedule::with_periods(&[period; 5]).is_err());
    }

    #[test]
    fn test_weekday_names() {
        assert_eq!(Weekday::from_name("wednesday"), Some(Weekday::Wednesday));
        assert_eq!(Weekday::from_name("Wednesday"), None);
        assert_eq!(Weekday::Sunday.to_string(), "sunday");
    }
}
