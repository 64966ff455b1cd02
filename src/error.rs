use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistantError {
    /// Model's table-selection reply was not valid JSON after fence-stripping.
    /// Carries the offending text for diagnostic display.
    #[error("無法解析 LLM 回傳的 JSON：{raw}")]
    SelectionParse { raw: String },

    /// Model returned a syntactically valid but empty table list.
    #[error("LLM 沒有回傳任何表，請檢查需求或表清單。")]
    EmptySelection,

    /// No SELECT span found in the synthesizer's reply.
    #[error("LLM 回傳 SQL 無法解析：{raw}")]
    SqlUnparsable { raw: String },

    /// Safety gate found a data- or schema-mutating keyword. Carries the
    /// refused statement so the caller can still display it.
    #[error("偵測到 DML 語句，出於安全只允許 SELECT！")]
    MutationRejected { sql: String },

    /// Database rejected or failed to run the statement.
    #[error("執行 SQL 失敗：{0}")]
    Execution(String),

    /// Catalog or schema fetch could not reach the database.
    #[error("SQL Server 連線失敗：{0}")]
    Connectivity(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AssistantError>;
