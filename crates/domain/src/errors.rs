use thiserror::Error;

/// Todo 操作で発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TodoError {
    /// 指定された ID の Todo が存在しない
    #[error("Todo not found: {0}")]
    NotFound(String),

    /// ID がバックエンドの識別子形式に合致しない
    #[error("Invalid todo id: {0}")]
    InvalidArgument(String),

    /// 入力値が不正（空のタイトルなど）
    #[error("Validation error: {0}")]
    Validation(String),

    /// 接続・読み込み・書き込みの失敗
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl TodoError {
    pub fn storage(e: impl std::fmt::Display) -> Self {
        TodoError::StorageUnavailable(e.to_string())
    }
}

pub type TodoResult<T> = Result<T, TodoError>;
