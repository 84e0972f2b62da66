//! Todo List の HTTP API（axum）
//!
//! | Method | Path | 応答 |
//! |---|---|---|
//! | GET | `/` | `{"message": "Todo List API"}` |
//! | GET | `/todos` | TodoItem の配列（created_at 降順） |
//! | GET | `/todos/:id` | TodoItem |
//! | POST | `/todos` | 作成した TodoItem（201） |
//! | PUT | `/todos/:id` | 更新後の TodoItem |
//! | DELETE | `/todos/:id` | `{"message": "Todo deleted successfully"}` |
//!
//! ID はどのバックエンドでも JSON 文字列で返す（SQLite / memory は `"1"` のような整数、
//! DynamoDB は ULID）。TodoItem には同じ値の `_id` も付ける。
//! 存在しない ID への GET / PUT / DELETE は 404、バックエンドの形式に合わない ID は 400。エラーは常に `{"detail": "..."}`。

pub mod error;
pub mod handlers;

use axum::{http::HeaderValue, routing::get, Router};
use infrastructure::TodoRepository;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

/// アプリケーションの共有状態
#[derive(Clone)]
pub struct AppState {
    repo: Arc<dyn TodoRepository>,
}

impl AppState {
    pub fn new(repo: Arc<dyn TodoRepository>) -> Self {
        Self { repo }
    }
}

/// ルータを構築して返します。
pub fn app(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/todos", get(handlers::list_todos).post(handlers::create_todo))
        .route(
            "/todos/:id",
            get(handlers::get_todo)
                .put(handlers::update_todo)
                .delete(handlers::delete_todo),
        )
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 許可リストのオリジンからのみ、全メソッド・全ヘッダ・資格情報付きで許可
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // 資格情報を許可する場合はワイルドカードが使えないため、要求内容をそのまま返す
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
