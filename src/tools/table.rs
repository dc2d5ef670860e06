use serde_json::json;
use tracing::{info, warn};

use super::Outcome;
use crate::docx::model::Table;
use crate::docx::resolve_table_style;
use crate::error::{DocError, DocResult};
use crate::input::Args;
use crate::mcp::contracts::{MAX_TABLE_COLUMNS, MAX_TABLE_ROWS};
use crate::state::ServerState;
use crate::validate::{
    validate_column, validate_paragraph, validate_row, validate_section, validate_table,
};

/// Where a new table goes relative to the section's paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// After `paragraph_index` when given, otherwise at the end.
    Optional,
    /// After `paragraph_index`, defaulting to the first paragraph.
    AfterParagraph,
    SectionEnd,
}

pub fn create_table(state: &ServerState, args: Args, placement: Placement) -> DocResult<Outcome> {
    let path = state.resolve(args.required_str("document_name")?)?;
    let rows = args.integer("rows")?;
    let columns = args.integer("columns")?;
    if rows < 1 || columns < 1 {
        return Err(DocError::Dimension(format!(
            "table dimensions must be positive, got {rows}x{columns}"
        )));
    }
    if rows > MAX_TABLE_ROWS || columns > MAX_TABLE_COLUMNS {
        return Err(DocError::Dimension(format!(
            "table dimensions too large (max: {MAX_TABLE_ROWS} rows, {MAX_TABLE_COLUMNS} columns), got {rows}x{columns}"
        )));
    }
    let section_index = args.index_or("section_index", 0)?;
    let after_paragraph = match placement {
        Placement::Optional => args.optional_index("paragraph_index")?,
        Placement::AfterParagraph => Some(args.index_or("paragraph_index", 0)?),
        Placement::SectionEnd => None,
    };
    let requested_style = args.optional_str("style")?;
    let style = requested_style.and_then(resolve_table_style);
    if let Some(requested) = requested_style
        && style.is_none()
    {
        warn!(style = requested, "unknown table style, creating the table without it");
    }

    let data = state.mutate(&path, |session| {
        let document = session.document_mut()?;
        let (section_index, paragraph_index) = match after_paragraph {
            Some(paragraph) => {
                let (section, paragraph) = validate_paragraph(document, paragraph, section_index)?;
                (section, Some(paragraph))
            }
            None => (validate_section(document, section_index)?, None),
        };

        let mut table = Table::new(rows as usize, columns as usize);
        table.style = style.map(str::to_string);
        let section = &mut document.sections[section_index];
        let table_index = section.insert_table(paragraph_index, table);
        Ok(json!({
            "table_index": table_index,
            "section_index": section_index,
            "paragraph_index": paragraph_index,
            "dimensions": { "rows": rows, "columns": columns },
            "style": requested_style,
            "style_applied": style.is_some(),
            "applied_style": style,
            "total_tables_in_section": section.table_count(),
        }))
    })?;
    info!(path = %path.display(), rows, columns, "table created");

    Ok(Outcome::new("Table created successfully", data))
}

pub fn get_table_info(state: &ServerState, args: Args) -> DocResult<Outcome> {
    let path = state.resolve(args.required_str("document_name")?)?;
    let table_index = args.index("table_index")?;
    let section_index = args.index_or("section_index", 0)?;

    let data = state.read(&path, |session| {
        let document = session.document()?;
        let (section, index) = validate_table(document, table_index, section_index)?;
        let table = document.sections[section].table(index).ok_or_else(missing)?;
        let cells: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|row| row.cells.iter().map(|cell| cell.text()).collect())
            .collect();
        Ok(json!({
            "table_index": index,
            "section_index": section,
            "rows": table.row_count(),
            "columns": table.column_count(),
            "total_cells": table.row_count() * table.column_count(),
            "style": table.style,
            "cells": cells,
        }))
    })?;
    Ok(Outcome::new("Table info retrieved successfully", data))
}

pub fn delete_table(state: &ServerState, args: Args) -> DocResult<Outcome> {
    let path = state.resolve(args.required_str("document_name")?)?;
    let table_index = args.index("table_index")?;
    let section_index = args.index_or("section_index", 0)?;

    let data = state.mutate(&path, |session| {
        let document = session.document_mut()?;
        let (section, index) = validate_table(document, table_index, section_index)?;
        let section_ref = &mut document.sections[section];
        let deleted = section_ref.remove_table(index).ok_or_else(missing)?;
        Ok(json!({
            "section_index": section,
            "table_index": index,
            "deleted_dimensions": {
                "rows": deleted.row_count(),
                "columns": deleted.column_count(),
            },
            "total_tables_remaining": section_ref.table_count(),
        }))
    })?;
    info!(path = %path.display(), table_index, "table deleted");

    Ok(Outcome::new("Table deleted successfully", data))
}

pub fn set_cell_text(state: &ServerState, args: Args) -> DocResult<Outcome> {
    let path = state.resolve(args.required_str("document_name")?)?;
    let table_index = args.index("table_index")?;
    let row = args.index("row")?;
    let column = args.index("column")?;
    let text = args.required_str("text")?;
    let section_index = args.index_or("section_index", 0)?;

    let data = state.mutate(&path, |session| {
        let document = session.document_mut()?;
        let (section, index) = validate_table(document, table_index, section_index)?;
        let table = document.sections[section].table_mut(index).ok_or_else(missing)?;
        let row = validate_row(table, row)?;
        let column = validate_column(table, column)?;
        let cell = table.cell_mut(row, column).ok_or_else(|| {
            DocError::Index(format!(
                "cell ({row}, {column}) does not exist; row {row} is shorter than the first row"
            ))
        })?;
        let original_text = cell.set_text(text);
        Ok(json!({
            "section_index": section,
            "table_index": index,
            "row": row,
            "column": column,
            "original_text": original_text,
            "new_text": text,
        }))
    })?;

    Ok(Outcome::new("Cell text set successfully", data))
}

fn missing() -> DocError {
    DocError::Index("table disappeared while the document was open".to_string())
}
