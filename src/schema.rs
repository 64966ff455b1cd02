//! Structured column metadata and its flattening into prompt text.
//!
//! The synthesizer prompt consumes plain text, not objects, so the schema of
//! the selected tables is serialized as one `table: col(type), ...` line per
//! table. That format is deliberately stable; tests pin it.

use serde::{Deserialize, Serialize};

/// One column of a table, ordered by the database's ordinal position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub sql_type: String,
}

/// The full column listing of one selected table. Derived on demand per run;
/// never cached, since the schema may change between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    /// `table: col1(type1), col2(type2), ...`
    pub fn render_line(&self) -> String {
        let cols = self
            .columns
            .iter()
            .map(|c| format!("{}({})", c.name, c.sql_type))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}: {}", self.table, cols)
    }
}

/// Flatten the schemas of the selected tables, in input order, into the text
/// blob handed to the SQL synthesizer.
pub fn render_schema_text(schemas: &[TableSchema]) -> String {
    schemas
        .iter()
        .map(TableSchema::render_line)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(table: &str, cols: &[(&str, &str)]) -> TableSchema {
        TableSchema {
            table: table.to_string(),
            columns: cols
                .iter()
                .map(|(n, t)| ColumnDescriptor { name: n.to_string(), sql_type: t.to_string() })
                .collect(),
        }
    }

    #[test]
    fn renders_one_line_per_table_in_input_order() {
        let schemas = vec![
            schema("clothes", &[("clothes_no", "varchar"), ("input_date", "datetime")]),
            schema("clothes_color", &[("clothes_no", "varchar"), ("c_color_no", "varchar")]),
        ];
        let text = render_schema_text(&schemas);
        assert_eq!(
            text,
            "clothes: clothes_no(varchar), input_date(datetime)\n\
             clothes_color: clothes_no(varchar), c_color_no(varchar)"
        );
    }

    #[test]
    fn table_without_columns_still_renders_its_name() {
        let text = render_schema_text(&[schema("empty_table", &[])]);
        assert_eq!(text, "empty_table: ");
    }
}
