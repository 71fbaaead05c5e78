use crate::{
    contact::{self, ContactForm, FormOutcome, Submission},
    error::AppError,
    publisher,
    render::{self, ContainerState},
    state::AppState,
    widget::{self, ContainerSpec, WidgetParams},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub async fn root_handler(State(app_state): State<AppState>) -> Html<String> {
    let path = format!("{}/index.html", app_state.config.templates_dir);
    tokio::fs::read_to_string(&path)
        .await
        .map(Html)
        .unwrap_or_else(|err| {
            tracing::warn!(%path, error = %err, "index template missing");
            Html("<h1>Error: could not load index.html</h1>".to_string())
        })
}

pub async fn get_events(State(app_state): State<AppState>) -> Result<Response, AppError> {
    let payload = publisher::events_payload(
        app_state.kv.as_ref(),
        app_state.sheets.as_ref(),
        &app_state.config.events_sheet,
        app_state.config.feed_cache_ttl,
    )
    .await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], payload).into_response())
}

pub async fn get_sheet(
    State(app_state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Vec<String>>>, AppError> {
    app_state
        .sheets
        .read_sheet(&name)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no sheet named {name}")))
}

pub async fn put_sheet(
    State(app_state): State<AppState>,
    Path(name): Path<String>,
    Json(rows): Json<Vec<Vec<String>>>,
) -> Result<StatusCode, AppError> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("sheet name is required".to_string()));
    }
    let row_count = rows.len();
    app_state.sheets.write_sheet(&name, rows).await?;
    if name == app_state.config.events_sheet {
        app_state.kv.delete(publisher::CACHE_KEY).await;
    }
    tracing::info!(sheet = %name, rows = row_count, "sheet replaced");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn events_widget(
    State(app_state): State<AppState>,
    Query(params): Query<WidgetParams>,
) -> Html<String> {
    let spec = ContainerSpec::from(params);
    let mut rendered = widget::render_containers(
        &app_state.feed,
        &app_state.config.events_feed_url,
        std::slice::from_ref(&spec),
        Utc::now(),
    )
    .await;
    Html(rendered.pop().unwrap_or_default())
}

pub async fn events_widget_loading() -> Html<String> {
    Html(render::render_container(&ContainerState::Loading))
}

#[derive(Deserialize)]
pub struct RenderRequest {
    containers: Vec<HashMap<String, String>>,
}

#[derive(Serialize)]
pub struct RenderResponse {
    containers: Vec<String>,
}

pub async fn render_widgets(
    State(app_state): State<AppState>,
    Json(payload): Json<RenderRequest>,
) -> Json<RenderResponse> {
    let specs: Vec<ContainerSpec> = payload
        .containers
        .iter()
        .map(ContainerSpec::from_attributes)
        .collect();
    let containers = widget::render_containers(
        &app_state.feed,
        &app_state.config.events_feed_url,
        &specs,
        Utc::now(),
    )
    .await;
    Json(RenderResponse { containers })
}

fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("anonymous")
        .to_string()
}

pub async fn submit_contact(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<ContactForm>,
) -> Result<(StatusCode, Json<FormOutcome>), AppError> {
    let client = client_key(&headers);
    let submission = contact::submit(
        &app_state.pool,
        app_state.kv.as_ref(),
        &app_state.contact_locks,
        &client,
        &form,
        Utc::now(),
    )
    .await?;

    let status = match &submission {
        Submission::Accepted { .. } => StatusCode::OK,
        Submission::Rejected(rejection) if rejection.is_throttled() => StatusCode::TOO_MANY_REQUESTS,
        Submission::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    Ok((status, Json(submission.outcome())))
}
