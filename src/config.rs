//! Environment-backed settings for the LLM endpoint and the ERP database.
//!
//! Values are read once at startup (a `.env` file is honored via dotenv) and
//! passed into the pipeline explicitly; nothing here is a process-wide
//! mutable singleton.

use crate::db::ConnectionParams;
use std::env;

/// Runtime settings, one instance per process invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    /// OpenAI-compatible base URL, e.g. `http://vllm-service:8000/v1`.
    pub llm_endpoint: String,
    pub llm_model: String,
    pub connection: ConnectionParams,
    /// LIKE pattern restricting which base tables enter the catalog.
    pub table_filter: String,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Settings {
    /// Load settings from the environment, falling back to the deployment
    /// defaults.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(1433);

        Self {
            llm_endpoint: var_or("VLLM_ENDPOINT", "http://vllm-service:8000/v1"),
            llm_model: var_or("LLM_MODEL", "Qwen2.5-Coder-1.5B-Instruct"),
            connection: ConnectionParams {
                scheme: var_or("SQL_SCHEME", "mysql"),
                host: var_or("SQL_SERVER", "localhost"),
                port,
                user: var_or("SQL_USER", ""),
                password: var_or("SQL_PASSWORD", ""),
                database: var_or("SQL_DATABASE", "ERP0"),
            },
            table_filter: var_or("TABLE_FILTER", "%clothes%"),
        }
    }
}
