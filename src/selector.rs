//! Table selection — the first LLM stage of the pipeline.
//!
//! The model sees the full catalog (names plus optional Chinese business
//! labels) and must answer with a bare JSON array naming the minimal
//! sufficient subset of tables, at most three. Response post-processing is a
//! tolerant extractor kept separate from prompt construction so it can be
//! unit-tested against adversarial model output.

use crate::catalog::Catalog;
use crate::error::{AssistantError, Result};
use crate::llm::{ChatMessage, LlmProvider};
use tracing::{info, warn};

/// Hard cap on how many tables one query may involve.
pub const MAX_TABLES: usize = 3;

const SELECTION_SYSTEM_PROMPT: &str = "You are a JSON generator. Your task is to select ONLY the tables that are absolutely necessary \
to answer the user's request.

RULES:
1. Return a JSON array of table names ONLY.
2. DO NOT include unrelated tables.
3. You MUST select the minimal number of tables required to answer the request. \
If a single table is enough, return only that table.
4. Select up to 3 tables only if absolutely necessary.
5. Do NOT include extra tables under any circumstances.";

/// Strip leading/trailing markdown code-fence markers (```, ```json, ```sql)
/// from a model reply, leaving the fenced payload.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let without_prefix = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```sql"))
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let without_suffix = without_prefix
        .trim_end()
        .strip_suffix("```")
        .unwrap_or(without_prefix);
    without_suffix.trim().to_string()
}

/// Parse the model's selection reply into table names. Fences are stripped
/// first; anything that then fails to parse as a JSON string array is a
/// [`AssistantError::SelectionParse`] carrying the offending text.
pub fn parse_selection(raw: &str) -> Result<Vec<String>> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str::<Vec<String>>(&cleaned)
        .map_err(|_| AssistantError::SelectionParse { raw: cleaned })
}

/// Catalog listing sent verbatim as model context, one `name (label)` line
/// per table.
fn catalog_listing(catalog: &Catalog) -> String {
    catalog
        .tables()
        .iter()
        .map(|t| format!("{} ({})", t.name, t.description.as_deref().unwrap_or("")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_user_message(prompt: &str, catalog: &Catalog) -> String {
    format!(
        "資料庫所有表如下：\n{}\n\n\
         使用者需求：\n{}\n\n\
         請只選用戶需求絕對需要的表。\n\
         如果一張表就足夠，不要加入其他表。\n\
         最多回傳3張表，但如果1張就夠，就只回1張。\n\
         請回傳 JSON，例如：\n\
         [\"clothes\"]\n\
         不要解釋，不要加程式碼區塊，僅回傳 JSON。",
        catalog_listing(catalog),
        prompt
    )
}

/// Ask the model which tables the request needs. A successful selection is
/// non-empty and holds at most [`MAX_TABLES`] names; an over-long reply is
/// truncated rather than discarded. Names are not validated against the
/// catalog here — a phantom table surfaces later as a schema or execution
/// error.
pub async fn select_tables(
    llm: &dyn LlmProvider,
    prompt: &str,
    catalog: &Catalog,
) -> Result<Vec<String>> {
    let messages = [
        ChatMessage::system(SELECTION_SYSTEM_PROMPT),
        ChatMessage::user(build_user_message(prompt, catalog)),
    ];
    let raw = llm.chat(&messages, 512).await?;
    let mut tables = parse_selection(&raw)?;

    if tables.is_empty() {
        return Err(AssistantError::EmptySelection);
    }
    if tables.len() > MAX_TABLES {
        warn!(
            returned = tables.len(),
            "model exceeded the table cap, truncating to {}", MAX_TABLES
        );
        tables.truncate(MAX_TABLES);
    }
    info!(?tables, "LLM 選出的表");
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TableDescriptor;

    #[test]
    fn strips_json_fence_round_trip() {
        let fenced = "```json\n[\"clothes\"]\n```";
        assert_eq!(strip_code_fences(fenced), "[\"clothes\"]");
        assert_eq!(parse_selection(fenced).unwrap(), parse_selection("[\"clothes\"]").unwrap());
    }

    #[test]
    fn strips_bare_fence_without_language_tag() {
        assert_eq!(strip_code_fences("```\n[\"a\",\"b\"]\n```"), "[\"a\",\"b\"]");
    }

    #[test]
    fn unfenced_text_passes_through() {
        assert_eq!(strip_code_fences("[\"orders\"]"), "[\"orders\"]");
    }

    #[test]
    fn prose_reply_is_a_selection_parse_error() {
        let err = parse_selection("I think you need the clothes table.").unwrap_err();
        match err {
            AssistantError::SelectionParse { raw } => assert!(raw.contains("clothes table")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn listing_includes_names_and_labels() {
        let catalog = Catalog::new(vec![
            TableDescriptor::with_description("clothes", "衣服主檔"),
            TableDescriptor::new("orders"),
        ]);
        let listing = catalog_listing(&catalog);
        assert_eq!(listing, "clothes (衣服主檔)\norders ()");
    }

    #[test]
    fn user_message_carries_prompt_and_catalog() {
        let catalog = Catalog::new(vec![TableDescriptor::new("clothes")]);
        let msg = build_user_message("列出所有顏色", &catalog);
        assert!(msg.contains("列出所有顏色"));
        assert!(msg.contains("clothes"));
        assert!(msg.contains("僅回傳 JSON"));
    }
}
