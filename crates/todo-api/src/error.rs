use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::TodoError;
use serde_json::json;
use thiserror::Error;

/// ハンドラ境界のエラー
///
/// どのエラーも `{"detail": "..."}` 形式のボディで返す。
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Todo(#[from] TodoError),

    #[error("Invalid request body: {0}")]
    Body(#[from] JsonRejection),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Todo(TodoError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Todo(TodoError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            ApiError::Todo(TodoError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Todo(TodoError::StorageUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Body(rejection) => rejection.status(),
        }
    }

    /// クライアント向けの説明（ストレージ内部の詳細は出さない）
    pub fn detail(&self) -> String {
        match self {
            ApiError::Todo(TodoError::NotFound(_)) => "Todo not found".to_string(),
            ApiError::Todo(TodoError::StorageUnavailable(_)) => "Storage unavailable".to_string(),
            ApiError::Todo(e) => e.to_string(),
            ApiError::Body(rejection) => rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(TodoError::NotFound("1".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(TodoError::InvalidArgument("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(TodoError::Validation("blank".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(TodoError::StorageUnavailable("io".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_storage_detail_is_not_leaked() {
        let err = ApiError::from(TodoError::StorageUnavailable(
            "unable to open database file: /var/lib/todos.db".into(),
        ));
        assert_eq!(err.detail(), "Storage unavailable");
    }

    #[test]
    fn test_invalid_id_detail() {
        let err = ApiError::from(TodoError::InvalidArgument("abc".into()));
        assert_eq!(err.detail(), "Invalid todo id: abc");
    }
}
