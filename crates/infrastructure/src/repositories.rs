use crate::{DynamoDbTodoRepository, InMemoryTodoRepository, SqliteTodoRepository};
use async_trait::async_trait;
use domain::{TodoId, TodoItem, TodoPayload, TodoResult};
use shared::{Config, StorageBackend};
use std::sync::Arc;
use tracing::info;

/// Todo コレクションに対するストレージ抽象
///
/// 実装ごとに ID 形式が異なる（SQLite / メモリは整数、DynamoDB は ULID）。
/// 更新・削除はどの実装でも存在確認を行い、無い場合は `NotFound`、
/// 形式不正の ID は `InvalidArgument` を返す。
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// ログ出力用のバックエンド名
    fn backend(&self) -> &'static str;

    /// 起動時の初期化（テーブル作成など）
    async fn init(&self) -> TodoResult<()> {
        Ok(())
    }

    /// created_at 降順の全件
    async fn list(&self) -> TodoResult<Vec<TodoItem>>;

    async fn get(&self, id: &TodoId) -> TodoResult<TodoItem>;

    /// ID と created_at を採番して保存
    async fn create(&self, payload: &TodoPayload) -> TodoResult<TodoItem>;

    /// title / description / completed を上書き
    async fn update(&self, id: &TodoId, payload: &TodoPayload) -> TodoResult<TodoItem>;

    async fn delete(&self, id: &TodoId) -> TodoResult<()>;

    /// 終了時の後始末
    async fn shutdown(&self) -> TodoResult<()> {
        Ok(())
    }
}

/// 設定に従ってリポジトリを構築し、初期化まで済ませて返す
pub async fn connect(config: &Config) -> TodoResult<Arc<dyn TodoRepository>> {
    let repo: Arc<dyn TodoRepository> = match config.storage_backend {
        StorageBackend::Sqlite => Arc::new(SqliteTodoRepository::new(&config.sqlite_path)),
        StorageBackend::DynamoDb => Arc::new(DynamoDbTodoRepository::from_config(config).await),
        StorageBackend::Memory => Arc::new(InMemoryTodoRepository::default()),
    };

    repo.init().await?;
    info!(backend = repo.backend(), "Storage initialized");

    Ok(repo)
}
