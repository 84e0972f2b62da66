use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, SecondsFormat, Utc};
use domain::{TodoError, TodoId, TodoItem, TodoResult};
use std::collections::HashMap;

/// DynamoDB アイテムの属性名
pub mod attr {
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const COMPLETED: &str = "completed";
    pub const CREATED_AT: &str = "created_at";
}

/// TodoItem を DynamoDB AttributeValue マップに変換
pub fn todo_to_item(todo: &TodoItem) -> HashMap<String, AttributeValue> {
    let mut map = HashMap::new();

    map.insert(attr::ID.to_string(), AttributeValue::S(todo.id.to_string()));
    map.insert(attr::TITLE.to_string(), AttributeValue::S(todo.title.clone()));
    map.insert(
        attr::DESCRIPTION.to_string(),
        AttributeValue::S(todo.description.clone()),
    );
    map.insert(
        attr::COMPLETED.to_string(),
        AttributeValue::Bool(todo.completed),
    );
    map.insert(
        attr::CREATED_AT.to_string(),
        AttributeValue::S(todo.created_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
    );

    map
}

/// DynamoDB AttributeValue マップから TodoItem を復元
///
/// description が欠けている、または空文字列のアイテムは空文字として扱う。
pub fn item_to_todo(item: &HashMap<String, AttributeValue>) -> TodoResult<TodoItem> {
    let id = get_s(item, attr::ID)?;
    let title = get_s(item, attr::TITLE)?;

    let description = item
        .get(attr::DESCRIPTION)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .unwrap_or_default();

    let completed = item
        .get(attr::COMPLETED)
        .and_then(|v| v.as_bool().ok())
        .copied()
        .unwrap_or(false);

    let created_at_raw = get_s(item, attr::CREATED_AT)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_raw)
        .map_err(|e| malformed(format!("created_at: {e}")))?
        .with_timezone(&Utc);

    Ok(TodoItem {
        id: TodoId::from_string(id),
        title,
        description,
        completed,
        created_at,
    })
}

fn get_s(item: &HashMap<String, AttributeValue>, name: &str) -> TodoResult<String> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| malformed(format!("missing {name}")))
}

fn malformed(message: String) -> TodoError {
    TodoError::StorageUnavailable(format!("Malformed todo item: {message}"))
}
