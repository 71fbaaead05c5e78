use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::dates::EventDate;

/// One row of the events feed as the consumer reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_date: Option<String>,
}

/// A record plus its normalized dates. Built once per fetch, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEvent {
    pub record: EventRecord,
    pub start: Option<EventDate>,
    pub end: Option<EventDate>,
}

impl From<EventRecord> for FeedEvent {
    fn from(record: EventRecord) -> Self {
        let start = record.start.as_deref().and_then(EventDate::parse);
        let end = record.end.as_deref().and_then(EventDate::parse);
        Self { record, start, end }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ContactMessage {
    pub public_id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub client: String,
    pub created_at: NaiveDateTime,
}
