use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer, de};
use url::Url;

/// Custom deserializer for Duration from milliseconds
pub fn deserialize_duration_from_ms<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let ms = u64::deserialize(deserializer)?;
    Ok(Duration::from_millis(ms))
}

/// Custom deserializer for Duration from seconds
pub fn deserialize_duration_from_seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(secs))
}

/// Custom serializer for Duration to milliseconds
pub fn serialize_duration_to_ms<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Custom serializer for Duration to seconds
pub fn serialize_duration_to_seconds<S>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_secs())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UrlList {
    List(Vec<String>),
    Joined(String),
}

/// Custom deserializer for a vector of URLs.
///
/// Accepts either a list or a single comma-separated string, the form
/// environment overrides arrive in.
pub fn deserialize_urls<'de, D>(deserializer: D) -> Result<Vec<Url>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match UrlList::deserialize(deserializer)? {
        UrlList::List(urls) => urls,
        UrlList::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    };
    raw.into_iter().map(|url_str| Url::parse(&url_str).map_err(de::Error::custom)).collect()
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct PollingInterval {
        #[serde(
            deserialize_with = "deserialize_duration_from_ms",
            serialize_with = "serialize_duration_to_ms"
        )]
        interval: Duration,
    }

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct ShutdownTimeout {
        #[serde(
            deserialize_with = "deserialize_duration_from_seconds",
            serialize_with = "serialize_duration_to_seconds"
        )]
        timeout: Duration,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Endpoints {
        #[serde(deserialize_with = "deserialize_urls")]
        urls: Vec<Url>,
    }

    #[test]
    fn test_duration_from_ms_round_trip() {
        let parsed: PollingInterval = serde_json::from_str(r#"{"interval": 1500}"#).unwrap();
        assert_eq!(parsed.interval, Duration::from_millis(1500));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), r#"{"interval":1500}"#);
    }

    #[test]
    fn test_duration_from_seconds_round_trip() {
        let parsed: ShutdownTimeout = serde_json::from_str(r#"{"timeout": 30}"#).unwrap();
        assert_eq!(parsed.timeout, Duration::from_secs(30));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), r#"{"timeout":30}"#);
    }

    #[test]
    fn test_deserialize_urls_from_list() {
        let json = r#"{"urls": ["http://sender:8545", "https://backup.example.com"]}"#;
        let parsed: Endpoints = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.urls.len(), 2);
        assert_eq!(parsed.urls[0].as_str(), "http://sender:8545/");
    }

    #[test]
    fn test_deserialize_urls_from_comma_separated_string() {
        let json = r#"{"urls": "http://a:8545, http://b:8545"}"#;
        let parsed: Endpoints = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.urls.len(), 2);
        assert_eq!(parsed.urls[1].as_str(), "http://b:8545/");
    }

    #[test]
    fn test_deserialize_invalid_url() {
        let result: Result<Endpoints, _> = serde_json::from_str(r#"{"urls": ["not a url"]}"#);
        assert!(result.is_err());
    }
}
