//! Codec for the eight holiday override characteristics.
//!
//! Nine bytes: two packed dates at hour resolution followed by the
//! setpoint byte. Unused slots come back from the firmware with date
//! fields outside the calendar ranges; writing nine zero bytes clears a
//! slot the same way.

use crate::codec::{expect_len, temperature};
use crate::codec::datetime::DeviceDateTime;
use crate::error::Error;

pub(crate) const LEN: usize = 9;

/// A holiday override period with its fixed setpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Holiday {
    pub start: DeviceDateTime,
    pub end: DeviceDateTime,
    pub temperature: f32,
}

/// Decode a holiday slot. Unused slots decode as `None`.
pub(crate) fn decode(raw: &[u8]) -> Result<Option<Holiday>, Error> {
    expect_len("holiday", raw, LEN)?;
    match (decode_date(&raw[0..4]), decode_date(&raw[4..8])) {
        (Some(start), Some(end)) => Ok(Some(Holiday {
            start,
            end,
            temperature: temperature::decode_degrees(raw[8]),
        })),
        _ => Ok(None),
    }
}

/// Encode a holiday slot. `None` produces the cleared-slot pattern.
pub(crate) fn encode(holiday: Option<&Holiday>) -> Result<[u8; LEN], Error> {
    let Some(holiday) = holiday else {
        return Ok([0; LEN]);
    };
    if holiday.start == holiday.end {
        return Err(Error::OutOfRange(
            "holiday start and end must differ".to_string(),
        ));
    }
    let mut raw = [0; LEN];
    encode_date(&mut raw[0..4], holiday.start)?;
    encode_date(&mut raw[4..8], holiday.end)?;
    raw[8] = temperature::encode_setpoint(holiday.temperature)?;
    Ok(raw)
}

fn decode_date(raw: &[u8]) -> Option<DeviceDateTime> {
    DeviceDateTime::new(2000 + raw[3] as u16, raw[2], raw[1], raw[0], 0).ok()
}

fn encode_date(out: &mut [u8], date: DeviceDateTime) -> Result<(), Error> {
    if date.minute() != 0 {
        return Err(Error::OutOfRange(format!(
            "holiday times have hour resolution, got minute {}",
            date.minute()
        )));
    }
    out[0] = date.hour();
    out[1] = date.day();
    out[2] = date.month();
    out[3] = (date.year() - 2000) as u8;
    Ok(())
}
