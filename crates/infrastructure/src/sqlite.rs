use crate::TodoRepository;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use domain::{
    creation_timestamp, sort_newest_first, TodoError, TodoId, TodoItem, TodoPayload, TodoResult,
};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS todos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT,
        completed BOOLEAN DEFAULT FALSE,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )";

const SELECT_COLUMNS: &str = "SELECT id, title, description, completed, created_at FROM todos";

/// 単一ファイル SQLite の実装
///
/// 接続は保持せず、呼び出しごとに開いてブロッキングスレッド上で処理する。
pub struct SqliteTodoRepository {
    path: PathBuf,
}

impl SqliteTodoRepository {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn with_connection<T, F>(&self, f: F) -> TodoResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> TodoResult<T> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&path).map_err(TodoError::storage)?;
            f(&conn)
        })
        .await
        .map_err(TodoError::storage)?
    }
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn init(&self) -> TodoResult<()> {
        self.with_connection(|conn| {
            conn.execute(CREATE_TABLE, [])
                .map_err(TodoError::storage)?;
            Ok(())
        })
        .await?;

        info!(path = %self.path.display(), "SQLite schema ready");
        Ok(())
    }

    async fn list(&self) -> TodoResult<Vec<TodoItem>> {
        let mut items = self
            .with_connection(|conn| {
                let mut stmt = conn.prepare(SELECT_COLUMNS).map_err(TodoError::storage)?;
                let rows = stmt
                    .query_map([], row_to_todo)
                    .map_err(TodoError::storage)?;
                rows.collect::<Result<Vec<_>, _>>()
                    .map_err(TodoError::storage)
            })
            .await?;

        // 既定値の `CURRENT_TIMESTAMP` 形式と RFC 3339 が混在しうるため、文字列ではなく時刻で並べる
        sort_newest_first(&mut items);
        debug!(count = items.len(), "Listed todos");
        Ok(items)
    }

    async fn get(&self, id: &TodoId) -> TodoResult<TodoItem> {
        let row_id = id.as_row_id()?;
        self.with_connection(move |conn| {
            select_one(conn, row_id)?.ok_or_else(|| TodoError::NotFound(row_id.to_string()))
        })
        .await
    }

    async fn create(&self, payload: &TodoPayload) -> TodoResult<TodoItem> {
        let payload = payload.clone();
        let created_at = creation_timestamp();

        let item = self
            .with_connection(move |conn| {
                conn.execute(
                    "INSERT INTO todos (title, description, completed, created_at) VALUES (?1, ?2, ?3, ?4)",
                    params![
                        payload.title,
                        payload.description,
                        payload.completed,
                        format_timestamp(&created_at)
                    ],
                )
                .map_err(TodoError::storage)?;

                let id = TodoId::from_row_id(conn.last_insert_rowid());
                Ok(TodoItem::new(id, &payload, created_at))
            })
            .await?;

        info!(todo_id = %item.id, "Todo created");
        Ok(item)
    }

    async fn update(&self, id: &TodoId, payload: &TodoPayload) -> TodoResult<TodoItem> {
        let row_id = id.as_row_id()?;
        let payload = payload.clone();

        let item = self
            .with_connection(move |conn| {
                let changed = conn
                    .execute(
                        "UPDATE todos SET title = ?1, description = ?2, completed = ?3 WHERE id = ?4",
                        params![payload.title, payload.description, payload.completed, row_id],
                    )
                    .map_err(TodoError::storage)?;
                if changed == 0 {
                    return Err(TodoError::NotFound(row_id.to_string()));
                }

                select_one(conn, row_id)?.ok_or_else(|| TodoError::NotFound(row_id.to_string()))
            })
            .await?;

        info!(todo_id = %item.id, "Todo updated");
        Ok(item)
    }

    async fn delete(&self, id: &TodoId) -> TodoResult<()> {
        let row_id = id.as_row_id()?;

        self.with_connection(move |conn| {
            let changed = conn
                .execute("DELETE FROM todos WHERE id = ?1", params![row_id])
                .map_err(TodoError::storage)?;
            if changed == 0 {
                return Err(TodoError::NotFound(row_id.to_string()));
            }
            Ok(())
        })
        .await?;

        info!(todo_id = row_id, "Todo deleted");
        Ok(())
    }
}

fn select_one(conn: &Connection, row_id: i64) -> TodoResult<Option<TodoItem>> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = ?1"),
        params![row_id],
        row_to_todo,
    )
    .optional()
    .map_err(TodoError::storage)
}

fn row_to_todo(row: &Row<'_>) -> rusqlite::Result<TodoItem> {
    let created_at: String = row.get(4)?;
    let created_at = parse_timestamp(&created_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(TodoItem {
        id: TodoId::from_row_id(row.get(0)?),
        title: row.get(1)?,
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        completed: row.get::<_, Option<bool>>(3)?.unwrap_or(false),
        created_at,
    })
}

/// 文字列比較で時系列順に並ぶよう桁数固定で書き出す
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// RFC 3339 に加えて、`CURRENT_TIMESTAMP` 既定値や
/// タイムゾーン無しの ISO 形式（UTC とみなす）も受け付ける
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
}
