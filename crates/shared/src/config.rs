use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown storage backend: {0}")]
    UnknownBackend(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// 永続化先の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// ローカルの単一ファイル SQLite
    Sqlite,
    /// DynamoDB（ホスト型ドキュメントストア）
    DynamoDb,
    /// プロセス内メモリ（開発/テスト用）
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::DynamoDb => "dynamodb",
            StorageBackend::Memory => "memory",
        }
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "dynamodb" => Ok(StorageBackend::DynamoDb),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_backend: StorageBackend,
    pub sqlite_path: String,
    pub dynamodb_table: String,
    pub dynamodb_endpoint: Option<String>,
    pub aws_region: String,
    pub host: IpAddr,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の取得関数から設定を組み立てる（テスト用に環境変数を差し替え可能）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let storage_backend = var("STORAGE_BACKEND", "sqlite").parse::<StorageBackend>()?;

        let host_raw = var("HOST", "0.0.0.0");
        let host: IpAddr = host_raw.parse().map_err(|_| ConfigError::InvalidValue {
            name: "HOST",
            value: host_raw.clone(),
        })?;

        let port_raw = var("PORT", "8000");
        let port: u16 = port_raw.parse().map_err(|_| ConfigError::InvalidValue {
            name: "PORT",
            value: port_raw.clone(),
        })?;

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Config {
            storage_backend,
            sqlite_path: var("SQLITE_PATH", "todos.db"),
            dynamodb_table: var("DYNAMODB_TABLE", "todos"),
            dynamodb_endpoint: lookup("DYNAMODB_ENDPOINT").filter(|s| !s.is_empty()),
            aws_region: var("AWS_REGION", "ap-northeast-1"),
            host,
            port,
            cors_allowed_origins,
            environment: var("ENVIRONMENT", "dev"),
        })
    }

    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
