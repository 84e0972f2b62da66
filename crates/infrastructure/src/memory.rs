use crate::TodoRepository;
use async_trait::async_trait;
use domain::{
    creation_timestamp, sort_newest_first, TodoError, TodoId, TodoItem, TodoPayload, TodoResult,
};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// プロセス内メモリの実装（開発/テスト用）
///
/// ID は SQLite と同じく 1 から始まる整数で、削除済みの ID は再利用しない。
#[derive(Default)]
pub struct InMemoryTodoRepository {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    items: BTreeMap<i64, TodoItem>,
}

impl InMemoryTodoRepository {
    fn lock(&self) -> TodoResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| TodoError::StorageUnavailable("memory store poisoned".to_string()))
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list(&self) -> TodoResult<Vec<TodoItem>> {
        let mut items: Vec<TodoItem> = self.lock()?.items.values().cloned().collect();
        sort_newest_first(&mut items);
        Ok(items)
    }

    async fn get(&self, id: &TodoId) -> TodoResult<TodoItem> {
        let row_id = id.as_row_id()?;
        self.lock()?
            .items
            .get(&row_id)
            .cloned()
            .ok_or_else(|| TodoError::NotFound(id.to_string()))
    }

    async fn create(&self, payload: &TodoPayload) -> TodoResult<TodoItem> {
        let mut state = self.lock()?;
        state.last_id += 1;
        let row_id = state.last_id;

        let item = TodoItem::new(TodoId::from_row_id(row_id), payload, creation_timestamp());
        state.items.insert(row_id, item.clone());
        debug!(todo_id = row_id, "Todo stored in memory");

        Ok(item)
    }

    async fn update(&self, id: &TodoId, payload: &TodoPayload) -> TodoResult<TodoItem> {
        let row_id = id.as_row_id()?;
        let mut state = self.lock()?;
        let item = state
            .items
            .get_mut(&row_id)
            .ok_or_else(|| TodoError::NotFound(id.to_string()))?;

        item.apply(payload);
        Ok(item.clone())
    }

    async fn delete(&self, id: &TodoId) -> TodoResult<()> {
        let row_id = id.as_row_id()?;
        self.lock()?
            .items
            .remove(&row_id)
            .map(|_| ())
            .ok_or_else(|| TodoError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repo = InMemoryTodoRepository::default();

        let first = repo.create(&TodoPayload::new("A")).await.unwrap();
        let second = repo.create(&TodoPayload::new("B")).await.unwrap();

        assert_eq!(first.id.as_str(), "1");
        assert_eq!(second.id.as_str(), "2");
        assert_eq!(first.description, "");
        assert!(!first.completed);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let repo = InMemoryTodoRepository::default();
        let first = repo.create(&TodoPayload::new("A")).await.unwrap();

        repo.delete(&first.id).await.unwrap();
        let second = repo.create(&TodoPayload::new("B")).await.unwrap();

        assert_eq!(second.id.as_str(), "2");
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_id() {
        let repo = InMemoryTodoRepository::default();
        let kept = repo.create(&TodoPayload::new("keep")).await.unwrap();
        let missing = TodoId::from_row_id(99);

        assert_eq!(
            repo.update(&missing, &TodoPayload::new("x")).await,
            Err(TodoError::NotFound("99".to_string()))
        );
        assert_eq!(
            repo.delete(&missing).await,
            Err(TodoError::NotFound("99".to_string()))
        );

        // 他のレコードは変更されていない
        assert_eq!(repo.list().await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn test_malformed_id_is_invalid_argument() {
        let repo = InMemoryTodoRepository::default();
        let bad = TodoId::from_string("not-a-number".to_string());

        assert!(matches!(
            repo.get(&bad).await,
            Err(TodoError::InvalidArgument(_))
        ));
        assert!(matches!(
            repo.delete(&bad).await,
            Err(TodoError::InvalidArgument(_))
        ));
    }
}
