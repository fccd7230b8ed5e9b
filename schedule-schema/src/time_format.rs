//! `HH:MM` wall-clock times.
//!
//! Requests always carry `HH:MM`. Responses may carry seconds (and a fraction) because the
//! backend serializes its `time` columns in full, so parsing accepts every variant.

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serializer};

const WIRE_FORMAT: &str = "%H:%M";
const ACCEPTED_FORMATS: [&str; 3] = ["%H:%M", "%H:%M:%S", "%H:%M:%S%.f"];

pub(crate) fn parse(raw: &str) -> Result<NaiveTime, String> {
    let raw = raw.trim();
    ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| format!("invalid time '{raw}', expected HH:MM"))
}

pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&time.format(WIRE_FORMAT))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}

pub mod option {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(time) => super::serialize(time, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| super::parse(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_backend_variants() {
        let expected = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        assert_eq!(parse("09:30").unwrap(), expected);
        assert_eq!(parse("09:30:00").unwrap(), expected);
        assert_eq!(parse("09:30:00.000").unwrap(), expected);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse("half past nine").is_err());
        assert!(parse("25:00").is_err());
    }
}
