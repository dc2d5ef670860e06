//! Bounds checks against the live extents of an open document.
//!
//! Indices arrive as `i64` straight from the request so negative values can
//! be reported as such instead of wrapping.

use crate::docx::Document;
use crate::docx::model::Table;
use crate::error::{DocError, DocResult};

pub fn validate_section(document: &Document, section: i64) -> DocResult<usize> {
    bounded(section, document.section_count(), "section", || {
        "document".to_string()
    })
}

/// Returns `(section, paragraph)` once both are in range.
pub fn validate_paragraph(
    document: &Document,
    paragraph: i64,
    section: i64,
) -> DocResult<(usize, usize)> {
    let section = validate_section(document, section)?;
    let count = document.sections[section].paragraph_count();
    let paragraph = bounded(paragraph, count, "paragraph", || format!("section {section}"))?;
    Ok((section, paragraph))
}

/// Returns `(section, table)` once both are in range.
pub fn validate_table(document: &Document, table: i64, section: i64) -> DocResult<(usize, usize)> {
    let section = validate_section(document, section)?;
    let count = document.sections[section].table_count();
    let table = bounded(table, count, "table", || format!("section {section}"))?;
    Ok((section, table))
}

pub fn validate_row(table: &Table, row: i64) -> DocResult<usize> {
    bounded(row, table.row_count(), "row", || "table".to_string())
}

/// Columns are checked against the first row; tables are assumed rectangular.
pub fn validate_column(table: &Table, column: i64) -> DocResult<usize> {
    bounded(column, table.column_count(), "column", || "table".to_string())
}

/// Accepts `0..=count`, i.e. any existing position or the end.
pub fn validate_insert_position(index: i64, count: usize, what: &str) -> DocResult<usize> {
    match usize::try_from(index) {
        Ok(position) if position <= count => Ok(position),
        _ => Err(DocError::Index(format!(
            "invalid {what} index: {index} (valid insert positions are 0..={count})"
        ))),
    }
}

fn bounded(
    index: i64,
    count: usize,
    what: &str,
    container: impl FnOnce() -> String,
) -> DocResult<usize> {
    if index < 0 {
        return Err(DocError::Index(format!(
            "{what} index cannot be negative: {index}"
        )));
    }
    match usize::try_from(index) {
        Ok(position) if position < count => Ok(position),
        _ => Err(DocError::Index(format!(
            "{what} index {index} out of range ({} has {count} {what}s)",
            container()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::model::{Block, Paragraph, Section};

    fn document() -> Document {
        let mut document = Document::blank();
        let section = &mut document.sections[0];
        section.blocks.push(Block::Paragraph(Paragraph::with_text("one")));
        section.blocks.push(Block::Table(Table::new(3, 2)));
        section.blocks.push(Block::Paragraph(Paragraph::with_text("two")));
        document.sections.push(Section::default());
        document
    }

    #[test]
    fn sections_and_paragraphs() {
        let document = document();
        assert_eq!(validate_section(&document, 1).expect("section"), 1);
        assert!(validate_section(&document, 2).is_err());
        assert!(validate_section(&document, -1).is_err());

        assert_eq!(validate_paragraph(&document, 1, 0).expect("paragraph"), (0, 1));
        assert!(validate_paragraph(&document, 2, 0).is_err());
        assert!(validate_paragraph(&document, 0, 1).is_err());
        let err = validate_paragraph(&document, 0, 5).expect_err("bad section");
        assert!(err.message().contains("section index 5"));
    }

    #[test]
    fn tables_rows_and_columns() {
        let document = document();
        let (section, index) = validate_table(&document, 0, 0).expect("table");
        assert!(validate_table(&document, 1, 0).is_err());

        let table = document.sections[section].table(index).expect("table");
        assert_eq!(validate_row(table, 2).expect("row"), 2);
        let err = validate_row(table, 5).expect_err("row 5");
        assert_eq!(err.code(), "INDEX_ERROR");
        assert_eq!(validate_column(table, 1).expect("column"), 1);
        assert!(validate_column(table, 2).is_err());
        assert!(validate_column(table, -3).is_err());
    }

    #[test]
    fn insert_position_allows_the_end() {
        assert_eq!(validate_insert_position(2, 2, "paragraph").expect("end"), 2);
        assert_eq!(validate_insert_position(0, 0, "paragraph").expect("empty"), 0);
        assert!(validate_insert_position(3, 2, "paragraph").is_err());
        assert!(validate_insert_position(-1, 2, "paragraph").is_err());
    }
}
