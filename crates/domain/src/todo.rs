use crate::errors::{TodoError, TodoResult};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Todo の識別子
///
/// ストレージ層が採番する。SQLite では自動採番の整数、DynamoDB では ULID。
/// どちらの場合もクライアントには文字列として公開する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    pub fn from_row_id(row_id: i64) -> Self {
        Self(row_id.to_string())
    }

    /// 新しい ULID 形式の ID を生成
    pub fn new_ulid() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 整数 ID として解釈する（1 以上のみ有効）
    pub fn as_row_id(&self) -> TodoResult<i64> {
        match self.0.parse::<i64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(TodoError::InvalidArgument(self.0.clone())),
        }
    }

    /// ULID として解釈する
    pub fn as_ulid(&self) -> TodoResult<ulid::Ulid> {
        ulid::Ulid::from_string(&self.0).map_err(|_| TodoError::InvalidArgument(self.0.clone()))
    }

    /// 大文字の正規表記に揃えた ULID の ID（キー検索用）
    pub fn canonical_ulid(&self) -> TodoResult<TodoId> {
        self.as_ulid().map(|ulid| Self(ulid.to_string()))
    }
}

impl From<String> for TodoId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 作成時刻（保存形式と同じマイクロ秒精度に切り捨て）
pub fn creation_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// 永続化された Todo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: TodoId,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl TodoItem {
    /// ペイロードから新しい Todo を組み立てる
    pub fn new(id: TodoId, payload: &TodoPayload, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: payload.title.clone(),
            description: payload.description.clone(),
            completed: payload.completed,
            created_at,
        }
    }

    /// 可変フィールド（title / description / completed）だけを上書きする
    pub fn apply(&mut self, payload: &TodoPayload) {
        self.title = payload.title.clone();
        self.description = payload.description.clone();
        self.completed = payload.completed;
    }
}

/// POST / PUT のリクエストボディ
///
/// `id` と `created_at` が含まれていても無視する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPayload {
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

impl TodoPayload {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            completed: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    pub fn validate(&self) -> TodoResult<()> {
        if self.title.trim().is_empty() {
            return Err(TodoError::Validation("Title cannot be empty".to_string()));
        }
        Ok(())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// 一覧の並び順（created_at 降順、同時刻は ID 降順）
pub fn sort_newest_first(items: &mut [TodoItem]) {
    items.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| compare_ids(&b.id, &a.id))
    });
}

fn compare_ids(a: &TodoId, b: &TodoId) -> std::cmp::Ordering {
    match (a.as_str().parse::<i64>(), b.as_str().parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}
