use crate::errors::AppError;
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_url: String,
    pub db_max_connections: u32,
    pub schema_init_path: Option<PathBuf>,
    pub host: String,
    pub server_port: u16,
    pub rust_log: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let db_url = lookup("DATABASE_URL").unwrap_or_else(|| "sqlite:./tasks.db".to_string());

        let db_max_connections = parse_var(&lookup, "DB_MAX_CONNECTIONS", 5)?;

        let schema_init_path = lookup("SCHEMA_INIT_PATH")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let server_port = parse_var(&lookup, "SERVER_PORT", 9090)?;

        let rust_log = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("") | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "LOG_FORMAT '{}' must be 'text' or 'json'",
                    other
                )));
            }
        };

        Ok(Config {
            db_url,
            db_max_connections,
            schema_init_path,
            host,
            server_port,
            rust_log,
            log_format,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.server_port)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError> {
    match lookup(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{} '{}' is not a valid number", key, raw))),
        None => Ok(default),
    }
}
