//! The full natural-language-to-SQL pipeline.
//!
//! One user request drives one pass: table selection → schema fetch → SQL
//! synthesis → safety gate → execution. Each stage's output feeds the next;
//! any failure aborts the run with a stage-specific error and nothing is
//! retried. A [`QueryPipeline`] owns only its collaborators — all
//! intermediate state lives in the run, so independent requests never share
//! anything.

use crate::catalog::Catalog;
use crate::db::Database;
use crate::error::{AssistantError, Result};
use crate::llm::LlmProvider;
use crate::result::QueryResult;
use crate::safety::is_mutating;
use crate::schema::render_schema_text;
use crate::selector::select_tables;
use crate::synthesizer::synthesize;
use std::sync::Arc;
use tracing::info;

/// Everything a completed run surfaces to the UI: the chosen tables (for
/// transparency), the synthesized SQL (for inspection), and the result.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub selected_tables: Vec<String>,
    pub sql: String,
    pub result: QueryResult,
}

pub struct QueryPipeline {
    llm: Arc<dyn LlmProvider>,
    db: Arc<dyn Database>,
}

impl QueryPipeline {
    pub fn new(llm: Arc<dyn LlmProvider>, db: Arc<dyn Database>) -> Self {
        Self { llm, db }
    }

    /// Run one request end to end against the given catalog.
    pub async fn run(&self, prompt: &str, catalog: &Catalog) -> Result<PipelineRun> {
        let selected_tables = select_tables(self.llm.as_ref(), prompt, catalog).await?;

        let schemas = self.db.fetch_schemas(&selected_tables).await?;
        let schema_text = render_schema_text(&schemas);

        let sql = synthesize(self.llm.as_ref(), prompt, &schema_text, &selected_tables).await?;
        info!(%sql, "LLM 產生 SQL");

        if is_mutating(&sql) {
            return Err(AssistantError::MutationRejected { sql });
        }

        let result = self.db.run_select(&sql).await?;
        info!(rows = result.row_count(), "查詢完成");

        Ok(PipelineRun { selected_tables, sql, result })
    }
}
