pub mod classify;
pub mod config;
pub mod contact;
pub mod dates;
pub mod db;
pub mod error;
pub mod feed;
pub mod handlers;
pub mod kv;
pub mod models;
pub mod publisher;
pub mod render;
pub mod sheets;
pub mod state;
pub mod widget;

use axum::{
    Router,
    routing::{get, post},
};
use state::AppState;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub fn router(app_state: AppState) -> Router {
    let assets = ServeDir::new(&app_state.config.assets_dir);

    Router::new()
        .route("/", get(handlers::root_handler))
        .nest_service("/assets", assets)
        .route("/api/events", get(handlers::get_events))
        .route(
            "/api/sheets/{name}",
            get(handlers::get_sheet).put(handlers::put_sheet),
        )
        .route("/api/contact", post(handlers::submit_contact))
        .route("/api/widgets/render", post(handlers::render_widgets))
        .route("/widgets/events", get(handlers::events_widget))
        .route("/widgets/events/loading", get(handlers::events_widget_loading))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
