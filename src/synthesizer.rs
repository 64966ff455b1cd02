//! SQL synthesis — the second LLM stage of the pipeline.
//!
//! The model receives the flattened schema of the selected tables and a
//! fixed set of dialect constraints: SQL Server 2008 syntax (`TOP N`, never
//! `LIMIT`), SELECT only, every selected table joined explicitly, Chinese
//! column aliases, and alias prefixes whenever joined tables collide on a
//! column name. The reply is treated as untrusted prose from which the first
//! `SELECT` span is extracted.

use crate::error::{AssistantError, Result};
use crate::llm::{ChatMessage, LlmProvider};
use crate::selector::strip_code_fences;
use regex::Regex;
use std::sync::OnceLock;

const SYNTHESIS_SYSTEM_PROMPT: &str = "You are a SQL Server 2008 expert specializing in ERP systems.\n\
You are given the COMPLETE schema of the selected tables, including table names and their columns.\n\n\
CRITICAL REQUIREMENTS:\n\
1. Return ONLY the SQL statement - no explanations, no comments.\n\
2. Use SQL Server 2008 syntax: SELECT TOP N instead of LIMIT.\n\
3. Use ALL provided tables in the query with proper JOINs, and use a maximum of 3 tables.\n\
4. Follow the Primary Key (PK) and Foreign Key (FK) relationships exactly.\n\
5. Use meaningful Chinese column aliases based on business terms provided.\n\
6. Return raw SQL only - no markdown formatting, no explanations.\n\
7. Use ONLY columns listed in the provided schema. Do not invent new columns.\n\
8. If two tables share columns with the same name, use the column from the table in the FROM clause first, unless the user explicitly requests otherwise.\n\
9. Use proper table aliases and fully qualify columns (e.g., c.clothes_no, cc.c_color_no).\n\
10. All selected tables MUST appear in the JOIN clause with correct ON conditions.\n\
11. Generate SELECT statements with correct column-table mapping based on the schema.\n\
12. If two tables share the same COLUMN_NAME, they are considered related and must be joined together.\n\
13. If multiple tables contain columns with the same name, you MUST give them distinct column aliases \
by prefixing with the table alias name (e.g., c.input_date AS clothes_input_date, cc.input_date AS color_input_date) \
so that every column in the result set has a unique name.";

fn select_span_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Case-sensitive on purpose: the prompt demands uppercase SQL, and the
    // span anchor doubles as a format check.
    RE.get_or_init(|| Regex::new(r"(?s)SELECT .*").unwrap())
}

/// Extract the SQL statement from a raw model reply: the first `SELECT ...`
/// span to end of text, with any residual code-fence markers removed. No
/// span at all is a [`AssistantError::SqlUnparsable`].
pub fn extract_select(raw: &str) -> Result<String> {
    let span = select_span_re()
        .find(raw)
        .ok_or_else(|| AssistantError::SqlUnparsable { raw: raw.to_string() })?;
    Ok(strip_code_fences(span.as_str()))
}

fn build_user_message(prompt: &str, schema_text: &str, selected_tables: &[String]) -> String {
    let allowed = if selected_tables.is_empty() {
        String::new()
    } else {
        format!("只允許使用以下表格：{}\n", selected_tables.join(", "))
    };

    format!(
        "資料庫結構：\n{}\n\n\
         {}\n\
         規則：\n\
         1. **極度重要**：你必須使用 SQL Server 2008 語法。當需要限制筆數時，**絕對不准使用 LIMIT**，請使用 `TOP N` 語法，例如：`SELECT TOP 10 * FROM ...`。\n\
         2. 只允許使用上面列出的表格，不可使用其他表，最多使用3張表。\n\
         3. 所有選出的表必須使用，並根據 join key 自動加入 JOIN。\n\
         4. 回傳結果使用中文欄位名稱。\n\
         5. 僅生成 SELECT，禁止 INSERT/UPDATE/DELETE/ALTER/DROP。\n\
         6. 不使用 MySQL 語法，如 LIMIT；如需要限制筆數，請使用 SQL Server 2008 語法 (TOP 或 ROW_NUMBER())。\n\
         7. 聚合請使用 SUM(), COUNT(), AVG() 等 SQL Server 2008 標準函數。\n\
         8. **僅回傳 SQL，不要任何文字說明、SQL 語句、假設條件或代碼塊。**\n\n\
         使用者需求：\n{}",
        schema_text, allowed, prompt
    )
}

/// Ask the model for one read-only SQL statement over the provided schema.
pub async fn synthesize(
    llm: &dyn LlmProvider,
    prompt: &str,
    schema_text: &str,
    selected_tables: &[String],
) -> Result<String> {
    let messages = [
        ChatMessage::system(SYNTHESIS_SYSTEM_PROMPT),
        ChatMessage::user(build_user_message(prompt, schema_text, selected_tables)),
    ];
    let raw = llm.chat(&messages, 1024).await?;
    extract_select(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_select_after_preamble() {
        let raw = "Sure, here's the query:\nSELECT * FROM clothes";
        assert_eq!(extract_select(raw).unwrap(), "SELECT * FROM clothes");
    }

    #[test]
    fn extracts_fenced_select() {
        let raw = "```sql\nSELECT TOP 10 * FROM clothes\n```";
        assert_eq!(extract_select(raw).unwrap(), "SELECT TOP 10 * FROM clothes");
    }

    #[test]
    fn keeps_multiline_statement_to_end_of_text() {
        let raw = "SELECT c.clothes_no AS 衣服編號\nFROM clothes c\nJOIN clothes_color cc ON c.clothes_no = cc.clothes_no";
        let sql = extract_select(raw).unwrap();
        assert!(sql.contains("JOIN clothes_color"));
    }

    #[test]
    fn reply_without_select_is_unparsable() {
        let err = extract_select("抱歉，我無法產生查詢。").unwrap_err();
        assert!(matches!(err, AssistantError::SqlUnparsable { .. }));
    }

    #[test]
    fn lowercase_select_is_not_accepted() {
        assert!(extract_select("select * from clothes").is_err());
    }

    #[test]
    fn user_message_lists_schema_and_allowed_tables() {
        let msg = build_user_message(
            "列出所有顏色",
            "clothes: clothes_no(varchar)",
            &["clothes".to_string(), "clothes_color".to_string()],
        );
        assert!(msg.contains("clothes: clothes_no(varchar)"));
        assert!(msg.contains("只允許使用以下表格：clothes, clothes_color"));
        assert!(msg.contains("TOP N"));
    }
}
