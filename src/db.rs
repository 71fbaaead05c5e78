use crate::error::AppError;
use crate::models::ContactMessage;
use nanoid::nanoid;
use sqlx::SqlitePool;

pub async fn create_schema(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS sheets (
            name TEXT PRIMARY KEY,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS sheet_cells (
            sheet TEXT NOT NULL,
            row_idx INTEGER NOT NULL,
            col_idx INTEGER NOT NULL,
            value TEXT NOT NULL,
            FOREIGN KEY (sheet) REFERENCES sheets (name) ON DELETE CASCADE,
            PRIMARY KEY (sheet, row_idx, col_idx)
        );",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS contact_messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            public_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            message TEXT NOT NULL,
            client TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn count_sheets(pool: &SqlitePool) -> Result<i64, AppError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sheets")
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}

/// Reads a sheet back as a rectangular grid; cells never written are `""`.
pub async fn read_sheet(pool: &SqlitePool, name: &str) -> Result<Option<Vec<Vec<String>>>, AppError> {
    let exists: Option<(String,)> = sqlx::query_as("SELECT name FROM sheets WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Ok(None);
    }

    let cells: Vec<(i64, i64, String)> = sqlx::query_as(
        "SELECT row_idx, col_idx, value FROM sheet_cells WHERE sheet = ? ORDER BY row_idx, col_idx",
    )
    .bind(name)
    .fetch_all(pool)
    .await?;

    Ok(Some(cells_to_grid(cells)))
}

fn cells_to_grid(cells: Vec<(i64, i64, String)>) -> Vec<Vec<String>> {
    let cells: Vec<(usize, usize, String)> = cells
        .into_iter()
        .filter_map(|(row, col, value)| {
            Some((usize::try_from(row).ok()?, usize::try_from(col).ok()?, value))
        })
        .collect();

    let height = cells.iter().map(|(row, _, _)| row + 1).max().unwrap_or(0);
    let width = cells.iter().map(|(_, col, _)| col + 1).max().unwrap_or(0);
    let mut grid = vec![vec![String::new(); width]; height];
    for (row, col, value) in cells {
        grid[row][col] = value;
    }
    grid
}

pub async fn replace_sheet(pool: &SqlitePool, name: &str, rows: &[Vec<String>]) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO sheets (name) VALUES (?)
         ON CONFLICT(name) DO UPDATE SET updated_at = CURRENT_TIMESTAMP",
    )
    .bind(name)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM sheet_cells WHERE sheet = ?")
        .bind(name)
        .execute(&mut *tx)
        .await?;

    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            sqlx::query(
                "INSERT INTO sheet_cells (sheet, row_idx, col_idx, value) VALUES (?, ?, ?, ?)",
            )
            .bind(name)
            .bind(row_idx as i64)
            .bind(col_idx as i64)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }
    }
    tx.commit().await?;
    Ok(())
}

pub async fn insert_contact_message(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    message: &str,
    client: &str,
) -> Result<ContactMessage, AppError> {
    let public_id = nanoid!(10);
    let saved = sqlx::query_as(
        "INSERT INTO contact_messages (public_id, name, email, message, client) VALUES (?, ?, ?, ?, ?)
         RETURNING public_id, name, email, message, client, created_at",
    )
    .bind(public_id)
    .bind(name)
    .bind(email)
    .bind(message)
    .bind(client)
    .fetch_one(pool)
    .await?;
    Ok(saved)
}

pub async fn list_contact_messages(pool: &SqlitePool) -> Result<Vec<ContactMessage>, AppError> {
    sqlx::query_as(
        "SELECT public_id, name, email, message, client, created_at FROM contact_messages ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_padded_to_a_rectangle() {
        let grid = cells_to_grid(vec![
            (0, 0, "title".to_string()),
            (0, 1, "start".to_string()),
            (2, 0, "Gala".to_string()),
        ]);
        assert_eq!(
            grid,
            vec![
                vec!["title".to_string(), "start".to_string()],
                vec![String::new(), String::new()],
                vec!["Gala".to_string(), String::new()],
            ]
        );
    }

    #[test]
    fn no_cells_is_an_empty_grid() {
        assert!(cells_to_grid(Vec::new()).is_empty());
    }
}
