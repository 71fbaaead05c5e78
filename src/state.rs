use crate::config::Config;
use crate::contact::SubmissionLocks;
use crate::feed::{FeedClient, FeedError};
use crate::kv::{KvStore, MemoryKv};
use crate::sheets::{SheetStore, SqliteSheets};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub sheets: Arc<dyn SheetStore>,
    pub kv: Arc<dyn KvStore>,
    pub contact_locks: Arc<SubmissionLocks>,
    pub feed: FeedClient,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Result<Self, FeedError> {
        Ok(Self {
            sheets: Arc::new(SqliteSheets::new(pool.clone())),
            kv: Arc::new(MemoryKv::default()),
            contact_locks: Arc::new(SubmissionLocks::default()),
            feed: FeedClient::new()?,
            config: Arc::new(config),
            pool,
        })
    }
}
