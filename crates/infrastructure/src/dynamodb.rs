use crate::models::{attr, item_to_todo, todo_to_item};
use crate::TodoRepository;
use async_trait::async_trait;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType, ReturnValue,
    ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;
use domain::{
    creation_timestamp, sort_newest_first, TodoError, TodoId, TodoItem, TodoPayload, TodoResult,
};
use shared::Config;
use tracing::{debug, error, info};

/// DynamoDB（ホスト型ドキュメントストア）の実装
///
/// クライアントは起動時に一度だけ構築して使い回す。ID は ULID。
/// 更新・削除は `attribute_exists(id)` 条件付きで書き込み、
/// 条件不成立を `NotFound` として返す。
#[derive(Clone)]
pub struct DynamoDbTodoRepository {
    client: Client,
    table_name: String,
}

impl DynamoDbTodoRepository {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// 設定からクライアントを構築（DYNAMODB_ENDPOINT があれば DynamoDB Local へ）
    pub async fn from_config(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()));
        if let Some(endpoint) = &config.dynamodb_endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let aws_config = loader.load().await;

        Self::new(Client::new(&aws_config), config.dynamodb_table.clone())
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn table_exists(&self) -> TodoResult<bool> {
        match self
            .client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_resource_not_found_exception()) =>
            {
                Ok(false)
            }
            Err(e) => Err(storage_error("describe_table", e)),
        }
    }

    async fn create_table(&self) -> TodoResult<()> {
        let attribute = AttributeDefinition::builder()
            .attribute_name(attr::ID)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(TodoError::storage)?;
        let key = KeySchemaElement::builder()
            .attribute_name(attr::ID)
            .key_type(KeyType::Hash)
            .build()
            .map_err(TodoError::storage)?;

        self.client
            .create_table()
            .table_name(&self.table_name)
            .billing_mode(BillingMode::PayPerRequest)
            .attribute_definitions(attribute)
            .key_schema(key)
            .send()
            .await
            .map_err(|e| storage_error("create_table", e))?;

        info!(table = %self.table_name, "DynamoDB table created");
        Ok(())
    }
}

#[async_trait]
impl TodoRepository for DynamoDbTodoRepository {
    fn backend(&self) -> &'static str {
        "dynamodb"
    }

    async fn init(&self) -> TodoResult<()> {
        if !self.table_exists().await? {
            self.create_table().await?;
        }
        info!(table = %self.table_name, "DynamoDB table ready");
        Ok(())
    }

    async fn list(&self) -> TodoResult<Vec<TodoItem>> {
        let mut todos = Vec::new();
        let mut start_key = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|e| storage_error("scan", e))?;

            for item in output.items() {
                todos.push(item_to_todo(item)?);
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        sort_newest_first(&mut todos);
        debug!(count = todos.len(), "Listed todos");
        Ok(todos)
    }

    async fn get(&self, id: &TodoId) -> TodoResult<TodoItem> {
        let id = &id.canonical_ulid()?;

        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(attr::ID, AttributeValue::S(id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| storage_error("get_item", e))?;

        let item = output
            .item()
            .ok_or_else(|| TodoError::NotFound(id.to_string()))?;
        item_to_todo(item)
    }

    async fn create(&self, payload: &TodoPayload) -> TodoResult<TodoItem> {
        let todo = TodoItem::new(TodoId::new_ulid(), payload, creation_timestamp());

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(todo_to_item(&todo)))
            .condition_expression("attribute_not_exists(#id)")
            .expression_attribute_names("#id", attr::ID)
            .send()
            .await
            .map_err(|e| storage_error("put_item", e))?;

        info!(todo_id = %todo.id, "Todo created");
        Ok(todo)
    }

    async fn update(&self, id: &TodoId, payload: &TodoPayload) -> TodoResult<TodoItem> {
        let id = &id.canonical_ulid()?;

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(attr::ID, AttributeValue::S(id.to_string()))
            .update_expression("SET #title = :title, #description = :description, #completed = :completed")
            .condition_expression("attribute_exists(#id)")
            .expression_attribute_names("#id", attr::ID)
            .expression_attribute_names("#title", attr::TITLE)
            .expression_attribute_names("#description", attr::DESCRIPTION)
            .expression_attribute_names("#completed", attr::COMPLETED)
            .expression_attribute_values(":title", AttributeValue::S(payload.title.clone()))
            .expression_attribute_values(
                ":description",
                AttributeValue::S(payload.description.clone()),
            )
            .expression_attribute_values(":completed", AttributeValue::Bool(payload.completed))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                return Err(TodoError::NotFound(id.to_string()));
            }
            Err(e) => return Err(storage_error("update_item", e)),
        };

        let item = output
            .attributes()
            .ok_or_else(|| TodoError::NotFound(id.to_string()))?;
        let todo = item_to_todo(item)?;

        info!(todo_id = %todo.id, "Todo updated");
        Ok(todo)
    }

    async fn delete(&self, id: &TodoId) -> TodoResult<()> {
        let id = &id.canonical_ulid()?;

        let result = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key(attr::ID, AttributeValue::S(id.to_string()))
            .condition_expression("attribute_exists(#id)")
            .expression_attribute_names("#id", attr::ID)
            .send()
            .await;

        match result {
            Ok(_) => {
                info!(todo_id = %id, "Todo deleted");
                Ok(())
            }
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                Err(TodoError::NotFound(id.to_string()))
            }
            Err(e) => Err(storage_error("delete_item", e)),
        }
    }

    async fn shutdown(&self) -> TodoResult<()> {
        info!(table = %self.table_name, "DynamoDB client released");
        Ok(())
    }
}

fn storage_error<E>(operation: &str, e: E) -> TodoError
where
    E: std::error::Error,
{
    let message = aws_sdk_dynamodb::error::DisplayErrorContext(&e).to_string();
    error!(operation, error = %message, "DynamoDB error");
    TodoError::StorageUnavailable(message)
}
