//! Closed-world chat mode.
//!
//! A session is seeded with the assistant persona and a small embedded ERP
//! JSON dataset, then accumulates user/assistant turns. The model is told to
//! answer from that data only, in Traditional Chinese, preferring CSV-shaped
//! answers the caller can render as a table. Reasoning `<think>` spans some
//! models emit are stripped before the answer enters the history.

use crate::error::Result;
use crate::llm::{ChatMessage, LlmProvider};
use regex::Regex;
use std::sync::OnceLock;

const CHAT_PERSONA: &str = "你是一個 ERP 助理，會根據 ERP JSON 資料回答問題。請用繁體中文，不要產生 SQL。回答格式優先考慮 CSV。表格內容全部使用中文";

fn think_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").unwrap())
}

/// Remove `<think>...</think>` spans from a model reply.
pub fn remove_think_tags(text: &str) -> String {
    think_re().replace_all(text, "").trim().to_string()
}

/// Rough check whether an answer is CSV-shaped and worth rendering as a
/// table.
pub fn looks_like_csv(answer: &str) -> bool {
    answer.contains(',')
}

/// One chat conversation over an embedded dataset.
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(erp_data: &serde_json::Value) -> Result<Self> {
        let data = serde_json::to_string_pretty(erp_data)?;
        Ok(Self {
            messages: vec![
                ChatMessage::system(CHAT_PERSONA),
                ChatMessage::system(format!("以下是 ERP JSON 資料：\n{}", data)),
            ],
        })
    }

    /// Ask one question; the full history is sent so earlier turns stay in
    /// context.
    pub async fn ask(&mut self, llm: &dyn LlmProvider, question: &str) -> Result<String> {
        self.messages.push(ChatMessage::user(question));
        let raw = llm.chat(&self.messages, 1024).await?;
        let answer = remove_think_tags(&raw);
        self.messages.push(ChatMessage::assistant(answer.clone()));
        Ok(answer)
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.messages
    }
}
