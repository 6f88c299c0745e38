//! Cloud DNS domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A DNS zone managed by Cloud DNS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub ttl: Option<u32>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub account_id: Option<u64>,
    #[serde(default, with = "timestamp")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub updated: Option<DateTime<Utc>>,
}

/// Cloud DNS timestamps look like `2011-06-24T01:23:15.000+0000`, which is
/// not quite RFC 3339 (no colon in the offset).
mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        DateTime::parse_from_str(&raw, FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(&raw))
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_domain() {
        let json = r#"{
            "name": "alt-jclouds-example.com",
            "id": 2725233,
            "comment": "Optional domain comment...",
            "accountId": 1234,
            "emailAddress": "jcloudie@alt-jclouds-example.com",
            "ttl": 600001,
            "updated": "2011-06-24T01:23:15.000+0000",
            "created": "2011-06-24T01:12:51.000+0000"
        }"#;

        let domain: Domain = serde_json::from_str(json).unwrap();
        assert_eq!(domain.id, 2725233);
        assert_eq!(domain.ttl, Some(600001));
        let updated = domain.updated.unwrap();
        assert_eq!(updated.year(), 2011);
        assert_eq!(updated.minute(), 23);
    }

    #[test]
    fn test_parse_domain_without_optional_fields() {
        let json = r#"{"name": "jclouds-example.com", "id": 1}"#;

        let domain: Domain = serde_json::from_str(json).unwrap();
        assert_eq!(domain.name, "jclouds-example.com");
        assert!(domain.email_address.is_none());
        assert!(domain.created.is_none());
    }

    #[test]
    fn test_timestamp_round_trip_format() {
        let json = r#"{"name": "a.com", "id": 1, "created": "2013-02-01T10:00:00.000+0000"}"#;
        let domain: Domain = serde_json::from_str(json).unwrap();

        let value = serde_json::to_value(&domain).unwrap();
        assert_eq!(value["created"], "2013-02-01T10:00:00.000+0000");
    }
}
