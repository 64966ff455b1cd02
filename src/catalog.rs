//! Table catalog — the set of tables the selector may choose from.
//!
//! The catalog is loaded once per session, either straight from the
//! database's information schema or from a CSV a human has annotated with
//! Chinese business names, and is immutable for the duration of a pipeline
//! run.

use crate::error::{AssistantError, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// UTF-8 byte-order marker, prepended to CSV downloads so spreadsheet tools
/// detect the encoding (the `utf-8-sig` convention).
pub const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

const NAME_HEADER: &str = "TABLE_NAME";
const DESCRIPTION_HEADER: &str = "中文名稱";

/// One selectable table, identified by name, optionally carrying a
/// human-supplied business label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub description: Option<String>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), description: None }
    }

    pub fn with_description(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: Some(description.into()) }
    }
}

/// An ordered, name-unique collection of [`TableDescriptor`]s.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: Vec<TableDescriptor>,
}

impl Catalog {
    /// Build a catalog, keeping the first descriptor for any duplicated name.
    pub fn new(tables: Vec<TableDescriptor>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let tables = tables
            .into_iter()
            .filter(|t| seen.insert(t.name.clone()))
            .collect();
        Self { tables }
    }

    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Render the catalog as CSV bytes (BOM + header row) for download, so a
    /// human can fill in the Chinese-name column and upload it back.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([NAME_HEADER, DESCRIPTION_HEADER])?;
        for table in &self.tables {
            writer.write_record([
                table.name.as_str(),
                table.description.as_deref().unwrap_or(""),
            ])?;
        }
        let body = writer
            .into_inner()
            .map_err(|e| AssistantError::Config(format!("CSV buffer error: {}", e)))?;

        let mut bytes = Vec::with_capacity(UTF8_BOM.len() + body.len());
        bytes.extend_from_slice(UTF8_BOM);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Parse an uploaded table list. The `TABLE_NAME` column is required
    /// (falling back to the first column when the header is absent); the
    /// `中文名稱` column is optional.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();

        let name_idx = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(NAME_HEADER))
            .unwrap_or(0);
        let desc_idx = headers.iter().position(|h| h == DESCRIPTION_HEADER);

        let mut tables = Vec::new();
        for record in reader.records() {
            let record = record?;
            let name = match record.get(name_idx) {
                Some(n) if !n.trim().is_empty() => n.trim().to_string(),
                _ => continue,
            };
            let description = desc_idx
                .and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string);
            tables.push(TableDescriptor { name, description });
        }

        Ok(Self::new(tables))
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduplicates_by_name_keeping_first() {
        let catalog = Catalog::new(vec![
            TableDescriptor::with_description("clothes", "衣服"),
            TableDescriptor::new("orders"),
            TableDescriptor::new("clothes"),
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.tables()[0].description.as_deref(), Some("衣服"));
    }

    #[test]
    fn csv_round_trip_preserves_names_and_descriptions() {
        let catalog = Catalog::new(vec![
            TableDescriptor::with_description("clothes", "衣服主檔"),
            TableDescriptor::new("clothes_color"),
        ]);
        let bytes = catalog.to_csv().unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let parsed = Catalog::from_csv_reader(&bytes[UTF8_BOM.len()..]).unwrap();
        assert_eq!(parsed.tables(), catalog.tables());
    }

    #[test]
    fn upload_without_description_column() {
        let csv = "TABLE_NAME\nclothes\norders\n";
        let catalog = Catalog::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.tables().iter().all(|t| t.description.is_none()));
    }

    #[test]
    fn upload_skips_blank_names() {
        let csv = "TABLE_NAME,中文名稱\nclothes,衣服\n,孤兒列\n";
        let catalog = Catalog::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 1);
    }
}
