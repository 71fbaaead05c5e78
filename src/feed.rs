use std::time::Duration;

use reqwest::{StatusCode, header::CACHE_CONTROL};
use serde_json::Value;
use thiserror::Error;

use crate::models::EventRecord;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("events feed request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("events feed returned status {0}")]
    Status(StatusCode),
    #[error("events feed is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Reads the published events feed over HTTP. One request per call, no retry.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
}

impl FeedClient {
    pub fn new() -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("sitefeed/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    pub async fn fetch(&self, url: &str) -> Result<Vec<EventRecord>, FeedError> {
        let response = self
            .http
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status));
        }
        let body = response.text().await?;
        let payload: Value = serde_json::from_str(&body)?;
        Ok(records_from_payload(payload))
    }
}

/// Accepts a bare array or `{ "events": [...] }`; anything else is empty.
/// Entries that are not objects are dropped.
pub fn records_from_payload(payload: Value) -> Vec<EventRecord> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("events") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<EventRecord>(item) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::debug!(error = %err, "skipping malformed feed entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_array_and_wrapped_object_are_both_accepted() {
        let bare = records_from_payload(json!([{"title": "A", "displayDate": "Fridays"}]));
        assert_eq!(bare.len(), 1);
        assert_eq!(bare[0].display_date.as_deref(), Some("Fridays"));

        let wrapped = records_from_payload(json!({"events": [{"title": "B"}, {"title": "C"}]}));
        assert_eq!(wrapped.len(), 2);
    }

    #[test]
    fn other_shapes_are_empty() {
        assert!(records_from_payload(json!({"items": []})).is_empty());
        assert!(records_from_payload(json!("events")).is_empty());
        assert!(records_from_payload(json!(null)).is_empty());
    }

    #[test]
    fn extra_columns_are_ignored_and_bad_entries_dropped() {
        let records = records_from_payload(json!([
            {"title": "Gala", "tags": ["music"], "organizer": "Board"},
            "not an event",
            {"title": "Picnic"}
        ]));
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Gala", "Picnic"]);
        assert_eq!(records[0].tags, vec!["music".to_string()]);
    }
}
