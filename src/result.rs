//! Tabular query results and their CSV rendering.

use crate::catalog::UTF8_BOM;
use crate::error::{AssistantError, Result};
use serde::{Deserialize, Serialize};

/// Materialized result of one executed SELECT: column names (the Chinese
/// aliases the synthesizer asked for) plus every row as display text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Render as downloadable CSV bytes: UTF-8 BOM, header row, one record
    /// per result row (the `utf-8-sig` convention spreadsheet tools expect).
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let body = writer
            .into_inner()
            .map_err(|e| AssistantError::Execution(format!("CSV buffer error: {}", e)))?;

        let mut bytes = Vec::with_capacity(UTF8_BOM.len() + body.len());
        bytes.extend_from_slice(UTF8_BOM);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Plain-text table for terminal display: header, separator, rows.
    pub fn to_display(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.columns.join(" | "));
        out.push('\n');
        out.push_str(&"-".repeat(self.columns.join(" | ").chars().count().max(4)));
        for row in &self.rows {
            out.push('\n');
            out.push_str(&row.join(" | "));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_starts_with_bom_and_header() {
        let result = QueryResult {
            columns: vec!["衣服編號".to_string(), "顏色".to_string()],
            rows: vec![vec!["B00022".to_string(), "紅".to_string()]],
        };
        let bytes = result.to_csv().unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("衣服編號,顏色"));
        assert_eq!(lines.next(), Some("B00022,紅"));
    }

    #[test]
    fn csv_quotes_embedded_commas() {
        let result = QueryResult {
            columns: vec!["名稱".to_string()],
            rows: vec![vec!["a,b".to_string()]],
        };
        let bytes = result.to_csv().unwrap();
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert!(text.contains("\"a,b\""));
    }
}
