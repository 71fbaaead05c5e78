use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::db;
use crate::error::AppError;

/// Named grids of display strings, the way a spreadsheet exposes them.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// All rows of the sheet, or `None` when no sheet has that name.
    async fn read_sheet(&self, name: &str) -> Result<Option<Vec<Vec<String>>>, AppError>;
    /// Replaces the whole sheet, creating it if needed.
    async fn write_sheet(&self, name: &str, rows: Vec<Vec<String>>) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SqliteSheets {
    pool: SqlitePool,
}

impl SqliteSheets {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SheetStore for SqliteSheets {
    async fn read_sheet(&self, name: &str) -> Result<Option<Vec<Vec<String>>>, AppError> {
        db::read_sheet(&self.pool, name).await
    }

    async fn write_sheet(&self, name: &str, rows: Vec<Vec<String>>) -> Result<(), AppError> {
        db::replace_sheet(&self.pool, name, &rows).await
    }
}

#[derive(Default)]
pub struct MemorySheets {
    sheets: RwLock<HashMap<String, Vec<Vec<String>>>>,
}

impl MemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(self, name: &str, rows: Vec<Vec<String>>) -> Self {
        self.sheets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), rows);
        self
    }
}

#[async_trait]
impl SheetStore for MemorySheets {
    async fn read_sheet(&self, name: &str) -> Result<Option<Vec<Vec<String>>>, AppError> {
        Ok(self
            .sheets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned())
    }

    async fn write_sheet(&self, name: &str, rows: Vec<Vec<String>>) -> Result<(), AppError> {
        self.sheets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), rows);
        Ok(())
    }
}
