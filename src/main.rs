use anyhow::Context;
use sitefeed::{config::Config, db, state::AppState};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const EVENTS_HEADER: [&str; 9] = [
    "title",
    "start",
    "end",
    "time",
    "location",
    "details",
    "category",
    "tags",
    "displayDate",
];

async fn seed_database_if_empty(pool: &SqlitePool, sheet: &str) {
    let sheet_count = match db::count_sheets(pool).await {
        Ok(count) => count,
        Err(e) => {
            tracing::error!(error = ?e, "failed to check sheet count");
            return;
        }
    };

    if sheet_count == 0 {
        tracing::info!(sheet, "database is empty, creating events sheet header");
        let header: Vec<Vec<String>> = vec![EVENTS_HEADER.iter().map(|h| h.to_string()).collect()];
        match db::replace_sheet(pool, sheet, &header).await {
            Ok(()) => tracing::info!(sheet, "events sheet created"),
            Err(e) => tracing::error!(error = ?e, "failed to create events sheet"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sitefeed=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)
        .context("failed to parse DATABASE_URL")?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await
        .context("failed to connect to db")?;

    db::create_schema(&pool)
        .await
        .context("failed to create schema")?;
    seed_database_if_empty(&pool, &config.events_sheet).await;

    let addr = format!("0.0.0.0:{}", config.port);
    let app_state = AppState::new(pool, config).context("failed to build http client")?;
    let app = sitefeed::router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
