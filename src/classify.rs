use std::cmp::Ordering;

use crate::dates::CivilDate;
use crate::models::{EventRecord, FeedEvent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scope {
    #[default]
    Upcoming,
    Past,
    All,
}

impl Scope {
    /// Anything other than `past` or `all` means upcoming.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "past" => Scope::Past,
            "all" => Scope::All,
            _ => Scope::Upcoming,
        }
    }
}

/// What one container asks for. Filters apply as scope, category, tag, limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub scope: Scope,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub limit: Option<usize>,
}

/// Normalizes dates and sorts; the result is the shared snapshot every
/// container reads from.
pub fn prepare(records: Vec<EventRecord>) -> Vec<FeedEvent> {
    let mut events: Vec<FeedEvent> = records.into_iter().map(FeedEvent::from).collect();
    sort_events(&mut events);
    events
}

/// Ascending by start, then end; undated events go last. Stable.
pub fn sort_events(events: &mut [FeedEvent]) {
    events.sort_by(|a, b| match (sort_key(a), sort_key(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

fn sort_key(event: &FeedEvent) -> Option<i64> {
    event
        .start
        .as_ref()
        .or(event.end.as_ref())
        .map(|date| date.timestamp())
}

/// An event stays upcoming through the whole of its last day.
pub fn is_upcoming(event: &FeedEvent, today: CivilDate) -> bool {
    match event.end.as_ref().or(event.start.as_ref()) {
        Some(last_day) => last_day.civil() >= today,
        None => true,
    }
}

pub fn classify(events: &[FeedEvent], scope: Scope, today: CivilDate) -> Vec<&FeedEvent> {
    match scope {
        Scope::All => events.iter().collect(),
        Scope::Upcoming => events.iter().filter(|e| is_upcoming(e, today)).collect(),
        Scope::Past => events.iter().filter(|e| !is_upcoming(e, today)).collect(),
    }
}

pub fn select<'a>(events: &'a [FeedEvent], query: &EventQuery, today: CivilDate) -> Vec<&'a FeedEvent> {
    let mut selected = classify(events, query.scope, today);

    if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
        let wanted = category.to_lowercase();
        selected.retain(|event| {
            event
                .record
                .category
                .as_deref()
                .unwrap_or_default()
                .to_lowercase()
                == wanted
        });
    }

    if let Some(tag) = query.tag.as_deref().filter(|t| !t.is_empty()) {
        let wanted = tag.to_lowercase();
        selected.retain(|event| event.record.tags.iter().any(|t| t.to_lowercase() == wanted));
    }

    if let Some(limit) = query.limit.filter(|n| *n > 0) {
        selected.truncate(limit);
    }

    selected
}
