use serde_json::json;

pub mod contracts;
pub mod errors;

use contracts::*;

pub fn tool_definitions() -> Vec<serde_json::Value> {
    let tools = [
        (
            TOOL_CREATE_DOCUMENT,
            "Create a new Word document, optionally copying a template.",
            create_document_schema(),
        ),
        (
            TOOL_GET_DOCUMENT_INFO,
            "Report sections, paragraph and table counts, protection and watermark of a document.",
            document_only_schema(),
        ),
        (
            TOOL_SET_DOCUMENT_PROTECTION,
            "Set or remove document protection, optionally with a password.",
            set_document_protection_schema(),
        ),
        (
            TOOL_FIND_AND_REPLACE,
            "Replace every occurrence of a text in body and table paragraphs.",
            find_and_replace_schema(),
        ),
        (
            TOOL_MERGE_DOCUMENTS,
            "Append the sections of one document to a copy of another and save the result.",
            merge_documents_schema(),
        ),
        (
            TOOL_ADD_TEXT_WATERMARK,
            "Add a text watermark to every page.",
            add_text_watermark_schema(),
        ),
        (
            TOOL_GET_PARAGRAPH_TEXT,
            "Read the text of a paragraph.",
            paragraph_ref_schema(),
        ),
        (
            TOOL_GET_PARAGRAPH_INFO,
            "Read text, alignment and style of a paragraph.",
            paragraph_ref_schema(),
        ),
        (
            TOOL_ADD_PARAGRAPH,
            "Insert a paragraph at a position or append it to a section.",
            add_paragraph_schema(),
        ),
        (
            TOOL_UPDATE_PARAGRAPH_TEXT,
            "Replace the text of a paragraph.",
            update_paragraph_text_schema(),
        ),
        (
            TOOL_DELETE_PARAGRAPH,
            "Delete a paragraph; later paragraphs shift down by one.",
            paragraph_ref_schema(),
        ),
        (
            TOOL_FORMAT_PARAGRAPH,
            "Change alignment, indents and spacing of a paragraph.",
            format_paragraph_schema(),
        ),
        (
            TOOL_GET_PARAGRAPH_FORMAT,
            "Read the formatting of a paragraph.",
            paragraph_ref_schema(),
        ),
        (
            TOOL_CREATE_TABLE,
            "Create a table after a paragraph or at the end of a section.",
            create_table_schema(),
        ),
        (
            TOOL_ADD_TABLE_AFTER_PARAGRAPH,
            "Create a table right after a paragraph.",
            add_table_after_paragraph_schema(),
        ),
        (
            TOOL_ADD_TABLE_TO_SECTION,
            "Append a table to the end of a section.",
            add_table_to_section_schema(),
        ),
        (
            TOOL_GET_TABLE_INFO,
            "Read dimensions, style and cell texts of a table.",
            table_ref_schema(),
        ),
        (
            TOOL_DELETE_TABLE,
            "Delete a table; later tables shift down by one.",
            table_ref_schema(),
        ),
        (
            TOOL_SET_CELL_TEXT,
            "Set the text of a table cell.",
            set_cell_text_schema(),
        ),
        (
            TOOL_CONVERT_DOCUMENT,
            "Convert a document to docx, txt, md, html, rtf or xml.",
            convert_document_schema(),
        ),
        (
            TOOL_GET_CONVERSION_STATUS,
            "Report the most recent conversion attempt for a document.",
            document_only_schema(),
        ),
        (
            TOOL_GET_CONVERSION_HISTORY,
            "List every conversion attempt for a document since the server started.",
            document_only_schema(),
        ),
    ];

    tools
        .into_iter()
        .map(|(name, description, schema)| {
            json!({
                "name": name,
                "description": description,
                "inputSchema": schema
            })
        })
        .collect()
}
