//! Publishes the events sheet as a JSON array.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::error::AppError;
use crate::kv::KvStore;
use crate::sheets::SheetStore;

pub const CACHE_KEY: &str = "events";
const TAGS_COLUMN: &str = "tags";

/// Converts a grid (header row first) into one JSON object per data row.
///
/// Rows with an empty first cell are skipped, as are blank cells and
/// columns with a blank header. The `tags` column becomes a list.
pub fn rows_to_events(values: &[Vec<String>]) -> Vec<Map<String, Value>> {
    let Some((headers, rows)) = values.split_first() else {
        return Vec::new();
    };

    rows.iter()
        .filter(|row| row.first().is_some_and(|cell| !cell.trim().is_empty()))
        .map(|row| {
            let mut entry = Map::new();
            for (idx, header) in headers.iter().enumerate() {
                let key = header.trim();
                if key.is_empty() {
                    continue;
                }
                let Some(value) = row.get(idx).map(|cell| cell.trim()) else {
                    continue;
                };
                if value.is_empty() {
                    continue;
                }
                let value = if key == TAGS_COLUMN {
                    Value::Array(split_tags(value).map(Value::from).collect())
                } else {
                    Value::from(value)
                };
                entry.insert(key.to_string(), value);
            }
            entry
        })
        .collect()
}

fn split_tags(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|tag| !tag.is_empty())
}

/// Feed body for `GET /api/events`, served from the cache slot when warm.
pub async fn events_payload(
    cache: &dyn KvStore,
    sheets: &dyn SheetStore,
    sheet_name: &str,
    ttl: Duration,
) -> Result<String, AppError> {
    if let Some(cached) = cache.get(CACHE_KEY).await {
        tracing::debug!("events feed served from cache");
        return Ok(cached);
    }

    let events = match sheets.read_sheet(sheet_name).await? {
        Some(values) => rows_to_events(&values),
        None => {
            tracing::warn!(sheet = sheet_name, "events sheet not found");
            Vec::new()
        }
    };
    tracing::debug!(count = events.len(), "events feed rebuilt from sheet");

    let payload = Value::Array(events.into_iter().map(Value::Object).collect()).to_string();
    cache.set(CACHE_KEY, payload.clone(), Some(ttl)).await;
    Ok(payload)
}
