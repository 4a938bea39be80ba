use chrono::{DateTime, NaiveDateTime, Utc};
use log::warn;
use serde::{Deserialize, Deserializer};

/*-------------------------------------------------------------------------------------------------
  DateTime Format
-------------------------------------------------------------------------------------------------*/

const AWS_IP_RANGES_DATETIME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Parse an AWS IP Ranges `createDate` value (e.g. `2022-01-01-00-00-00`).
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, AWS_IP_RANGES_DATETIME_FORMAT)
        .map(|naive_date_time| naive_date_time.and_utc())
        .ok()
}

/// Deserialize an optional `createDate`. The date is informational; a missing or malformed
/// value becomes `None` instead of rejecting the whole document.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|s| {
        let date = parse(&s);
        if date.is_none() {
            warn!("Ignoring malformed createDate: {s:?}");
        }
        date
    }))
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
