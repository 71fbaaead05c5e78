//! Event-card markup and the three container states.

use minijinja::Environment;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::dates;
use crate::models::FeedEvent;

pub const DEFAULT_EMPTY_MESSAGE: &str = "New events will be posted soon.";
pub const ERROR_MESSAGE: &str =
    "We're having trouble loading events right now. Please refresh or try again later.";
const DATE_TBA: &str = "Date TBA";

const CONTAINER_TEMPLATE: &str = r#"
{%- if state == "loading" -%}
<div class="events-panel__loading" aria-live="polite">
  <span class="events-panel__spinner" aria-hidden="true"></span>
  <span>Loading events…</span>
</div>
{%- elif state == "error" -%}
<p>{{ message }}</p>
{%- elif cards -%}
<div class="events-list">
{%- for card in cards %}
<article class="event-card">
  <span class="event-card__date">{{ card.date_label }}</span>
  <h3 class="event-card__title">{{ card.title }}</h3>
  {%- if card.meta %}
  <p class="event-card__meta">{{ card.meta }}</p>
  {%- endif %}
  {%- if card.details %}
  <p class="event-card__meta">{{ card.details }}</p>
  {%- endif %}
  {%- if card.tags %}
  <div class="event-card__tags">
    {%- for tag in card.tags %}<span class="event-card__tag">{{ tag }}</span>{% endfor -%}
  </div>
  {%- endif %}
</article>
{%- endfor %}
</div>
{%- else -%}
<p>{{ message }}</p>
{%- endif -%}
"#;

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.add_template("events.html", CONTAINER_TEMPLATE)
        .expect("events container template");
    env
});

/// What a container currently shows. Exactly one at a time.
#[derive(Debug)]
pub enum ContainerState<'a> {
    Loading,
    Error,
    Populated {
        events: Vec<&'a FeedEvent>,
        empty_message: Option<&'a str>,
    },
}

#[derive(Debug, Serialize)]
struct ContainerView<'a> {
    state: &'static str,
    message: &'a str,
    cards: Vec<Card<'a>>,
}

#[derive(Debug, Serialize, PartialEq)]
struct Card<'a> {
    date_label: String,
    title: &'a str,
    meta: Option<&'a str>,
    details: Option<&'a str>,
    tags: Vec<&'a str>,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Override first, then the computed range, then "Date TBA"; the time is
/// appended after a middle dot.
pub fn date_label(event: &FeedEvent) -> String {
    let range = present(event.record.display_date.as_deref())
        .map(str::to_string)
        .or_else(|| dates::format_range(event.start.as_ref(), event.end.as_ref()))
        .unwrap_or_else(|| DATE_TBA.to_string());
    match present(event.record.time.as_deref()) {
        Some(time) => format!("{range} · {time}"),
        None => range,
    }
}

fn card(event: &FeedEvent) -> Card<'_> {
    let record = &event.record;
    Card {
        date_label: date_label(event),
        title: &record.title,
        meta: present(record.location.as_deref()),
        details: present(record.details.as_deref()),
        tags: record
            .tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .collect(),
    }
}

pub fn render_container(state: &ContainerState<'_>) -> String {
    let view = match state {
        ContainerState::Loading => ContainerView {
            state: "loading",
            message: "",
            cards: Vec::new(),
        },
        ContainerState::Error => ContainerView {
            state: "error",
            message: ERROR_MESSAGE,
            cards: Vec::new(),
        },
        ContainerState::Populated {
            events,
            empty_message,
        } => ContainerView {
            state: "populated",
            message: present(*empty_message).unwrap_or(DEFAULT_EMPTY_MESSAGE),
            cards: events.iter().map(|event| card(event)).collect(),
        },
    };

    TEMPLATES
        .get_template("events.html")
        .and_then(|template| template.render(&view))
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to render events container");
            format!("<p>{ERROR_MESSAGE}</p>")
        })
}
