//! MongoDB `ObjectId` values for a point in time, for range queries on `_id`.
//!
//! The id is the 4-byte big-endian Unix timestamp followed by eight zero
//! bytes, rendered as 24 lowercase hex characters.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::info;

use crate::error::ObjectIdError;

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn object_id_from_datetime(time: DateTime<Utc>) -> Result<String, ObjectIdError> {
    info!("create ObjectId by: {}", time.format(DATETIME_FORMAT));

    let seconds = time.timestamp();
    let seconds =
        u32::try_from(seconds).map_err(|_| ObjectIdError::OutOfRange { seconds })?;

    let mut bytes = [0u8; 12];
    bytes[..4].copy_from_slice(&seconds.to_be_bytes());
    Ok(hex::encode(bytes))
}

/// Parse `YYYY-MM-DD HH:MM:SS` (exactly one space) or `YYYY-MM-DD`, as UTC.
pub fn object_id_from_str(input: &str) -> Result<String, ObjectIdError> {
    let time = if input.split(' ').count() == 2 {
        NaiveDateTime::parse_from_str(input, DATETIME_FORMAT).map_err(|_| {
            ObjectIdError::InvalidFormat {
                input: input.to_string(),
                expected: DATETIME_FORMAT,
            }
        })?
    } else {
        NaiveDate::parse_from_str(input, DATE_FORMAT)
            .map_err(|_| ObjectIdError::InvalidFormat {
                input: input.to_string(),
                expected: DATE_FORMAT,
            })?
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ObjectIdError::InvalidFormat {
                input: input.to_string(),
                expected: DATE_FORMAT,
            })?
    };

    object_id_from_datetime(time.and_utc())
}
