//! Event containers on a page: each declares its own scope and filters, all
//! of them render from a single fetch of the feed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::classify::{self, EventQuery, Scope};
use crate::dates;
use crate::feed::FeedClient;
use crate::render::{self, ContainerState};

pub const SCOPE_ATTR: &str = "data-events";
pub const CATEGORY_ATTR: &str = "data-events-category";
pub const TAG_ATTR: &str = "data-events-tag";
pub const COUNT_ATTR: &str = "data-events-count";
pub const EMPTY_ATTR: &str = "data-events-empty";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSpec {
    pub query: EventQuery,
    pub empty_message: Option<String>,
}

impl ContainerSpec {
    pub fn from_attributes(attributes: &HashMap<String, String>) -> Self {
        let get = |name: &str| attributes.get(name).map(String::as_str);
        Self::from_parts(
            get(SCOPE_ATTR),
            get(CATEGORY_ATTR),
            get(TAG_ATTR),
            get(COUNT_ATTR),
            get(EMPTY_ATTR),
        )
    }

    fn from_parts(
        scope: Option<&str>,
        category: Option<&str>,
        tag: Option<&str>,
        count: Option<&str>,
        empty: Option<&str>,
    ) -> Self {
        Self {
            query: EventQuery {
                scope: scope.map(Scope::from_keyword).unwrap_or_default(),
                category: non_blank(category),
                tag: non_blank(tag),
                limit: count.and_then(parse_limit),
            },
            empty_message: non_blank(empty),
        }
    }
}

/// Query-string form of a container, for `GET /widgets/events`.
#[derive(Debug, Default, Deserialize)]
pub struct WidgetParams {
    pub scope: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub count: Option<String>,
    pub empty: Option<String>,
}

impl From<WidgetParams> for ContainerSpec {
    fn from(params: WidgetParams) -> Self {
        Self::from_parts(
            params.scope.as_deref(),
            params.category.as_deref(),
            params.tag.as_deref(),
            params.count.as_deref(),
            params.empty.as_deref(),
        )
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Zero, negative or non-numeric counts mean no limit.
fn parse_limit(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

/// Fetches the feed once and renders every container from that snapshot.
/// A failed fetch puts every container into the error state.
pub async fn render_containers(
    client: &FeedClient,
    feed_url: &str,
    specs: &[ContainerSpec],
    now: DateTime<Utc>,
) -> Vec<String> {
    if specs.is_empty() {
        return Vec::new();
    }

    let records = match client.fetch(feed_url).await {
        Ok(records) => records,
        Err(err) => {
            tracing::error!(error = %err, url = feed_url, "failed to load events feed");
            let error = render::render_container(&ContainerState::Error);
            return vec![error; specs.len()];
        }
    };

    let events = classify::prepare(records);
    let today = dates::today(now);
    specs
        .iter()
        .map(|spec| {
            render::render_container(&ContainerState::Populated {
                events: classify::select(&events, &spec.query, today),
                empty_message: spec.empty_message.as_deref(),
            })
        })
        .collect()
}
