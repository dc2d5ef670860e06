use serde_json::{Value, json};
use tracing::warn;

use crate::error::{DocError, DocResult};
use crate::input::Args;
use crate::mcp::contracts::*;
use crate::state::ServerState;

pub mod conversion;
pub mod document;
pub mod format;
pub mod paragraph;
pub mod table;

/// Successful tool output before it is wrapped in the envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub message: String,
    pub data: Value,
}

impl Outcome {
    pub fn new(message: impl Into<String>, data: Value) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

pub fn envelope(result: &DocResult<Outcome>) -> Value {
    match result {
        Ok(outcome) => json!({
            "success": true,
            "message": outcome.message,
            "data": outcome.data,
        }),
        Err(err) => json!({
            "success": false,
            "message": err.message(),
            "error": {
                "code": err.code(),
                "type": err.type_name(),
                "details": err.message(),
                "suggestion": err.suggestion(),
            },
        }),
    }
}

/// Wraps an envelope as an MCP tool result. The text content carries the
/// whole envelope for clients that ignore `structuredContent`.
pub fn tool_result(envelope: Value) -> Value {
    let is_error = !envelope
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let text = serde_json::to_string(&envelope).unwrap_or_default();
    json!({
        "content": [{"type": "text", "text": text}],
        "structuredContent": envelope,
        "isError": is_error
    })
}

/// Runs the named tool and always answers with an envelope.
pub fn call(state: &ServerState, name: &str, arguments: &Value) -> Value {
    let result = Args::new(arguments).and_then(|args| dispatch(state, name, args));
    if let Err(err) = &result {
        warn!(tool = name, code = err.code(), "{err}");
    }
    tool_result(envelope(&result))
}

fn dispatch(state: &ServerState, name: &str, args: Args) -> DocResult<Outcome> {
    match name {
        TOOL_CREATE_DOCUMENT => document::create_document(state, args),
        TOOL_GET_DOCUMENT_INFO => document::get_document_info(state, args),
        TOOL_SET_DOCUMENT_PROTECTION => document::set_document_protection(state, args),
        TOOL_FIND_AND_REPLACE => document::find_and_replace(state, args),
        TOOL_MERGE_DOCUMENTS => document::merge_documents(state, args),
        TOOL_ADD_TEXT_WATERMARK => document::add_text_watermark(state, args),
        TOOL_GET_PARAGRAPH_TEXT => paragraph::get_paragraph_text(state, args),
        TOOL_GET_PARAGRAPH_INFO => paragraph::get_paragraph_info(state, args),
        TOOL_ADD_PARAGRAPH => paragraph::add_paragraph(state, args),
        TOOL_UPDATE_PARAGRAPH_TEXT => paragraph::update_paragraph_text(state, args),
        TOOL_DELETE_PARAGRAPH => paragraph::delete_paragraph(state, args),
        TOOL_FORMAT_PARAGRAPH => format::format_paragraph(state, args),
        TOOL_GET_PARAGRAPH_FORMAT => format::get_paragraph_format(state, args),
        TOOL_CREATE_TABLE => table::create_table(state, args, table::Placement::Optional),
        TOOL_ADD_TABLE_AFTER_PARAGRAPH => {
            table::create_table(state, args, table::Placement::AfterParagraph)
        }
        TOOL_ADD_TABLE_TO_SECTION => table::create_table(state, args, table::Placement::SectionEnd),
        TOOL_GET_TABLE_INFO => table::get_table_info(state, args),
        TOOL_DELETE_TABLE => table::delete_table(state, args),
        TOOL_SET_CELL_TEXT => table::set_cell_text(state, args),
        TOOL_CONVERT_DOCUMENT => conversion::convert_document(state, args),
        TOOL_GET_CONVERSION_STATUS => conversion::get_conversion_status(state, args),
        TOOL_GET_CONVERSION_HISTORY => conversion::get_conversion_history(state, args),
        _ => Err(DocError::Validation(format!("tool not implemented: {name}"))),
    }
}
