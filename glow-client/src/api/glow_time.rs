//! The provider's wall-clock format: `yyyy-mm-ddThh:mm:ss`, always UTC.

use serde::{Deserialize, Deserializer};
use time::{macros::format_description, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub fn format(ts: OffsetDateTime) -> Result<String, time::error::Format> {
    let utc = ts.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
        .format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"))
}

/// Parses either the `T`-separated or the space-separated variant.
pub fn parse(s: &str) -> Result<OffsetDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(s, format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"))
        .or_else(|_| {
            PrimitiveDateTime::parse(s, format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        })
        .map(PrimitiveDateTime::assume_utc)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(|e| serde::de::Error::custom(format!("failed to parse time {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn formats_in_utc_without_offset() {
        let ts = datetime!(2024-03-01 10:30:00 +02:00);
        assert_eq!(format(ts).unwrap(), "2024-03-01T08:30:00");
    }

    #[test]
    fn parses_both_separators() {
        let expected = datetime!(2023-11-05 00:00:00 UTC);
        assert_eq!(parse("2023-11-05T00:00:00").unwrap(), expected);
        assert_eq!(parse("2023-11-05 00:00:00").unwrap(), expected);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("05/11/2023").is_err());
    }
}
