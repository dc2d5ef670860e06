use serde_json::{Value, json};

use crate::docx::color::NamedColor;
use crate::docx::export::Target;
use crate::docx::model::{Alignment, LineSpacingRule, ProtectionLevel, WatermarkLayout};

pub const TOOL_CREATE_DOCUMENT: &str = "docx.create_document";
pub const TOOL_GET_DOCUMENT_INFO: &str = "docx.get_document_info";
pub const TOOL_SET_DOCUMENT_PROTECTION: &str = "docx.set_document_protection";
pub const TOOL_FIND_AND_REPLACE: &str = "docx.find_and_replace";
pub const TOOL_MERGE_DOCUMENTS: &str = "docx.merge_documents";
pub const TOOL_ADD_TEXT_WATERMARK: &str = "docx.add_text_watermark";

pub const TOOL_GET_PARAGRAPH_TEXT: &str = "docx.get_paragraph_text";
pub const TOOL_GET_PARAGRAPH_INFO: &str = "docx.get_paragraph_info";
pub const TOOL_ADD_PARAGRAPH: &str = "docx.add_paragraph";
pub const TOOL_UPDATE_PARAGRAPH_TEXT: &str = "docx.update_paragraph_text";
pub const TOOL_DELETE_PARAGRAPH: &str = "docx.delete_paragraph";

pub const TOOL_FORMAT_PARAGRAPH: &str = "docx.format_paragraph";
pub const TOOL_GET_PARAGRAPH_FORMAT: &str = "docx.get_paragraph_format";

pub const TOOL_CREATE_TABLE: &str = "docx.create_table";
pub const TOOL_ADD_TABLE_AFTER_PARAGRAPH: &str = "docx.add_table_after_paragraph";
pub const TOOL_ADD_TABLE_TO_SECTION: &str = "docx.add_table_to_section";
pub const TOOL_GET_TABLE_INFO: &str = "docx.get_table_info";
pub const TOOL_DELETE_TABLE: &str = "docx.delete_table";
pub const TOOL_SET_CELL_TEXT: &str = "docx.set_cell_text";

pub const TOOL_CONVERT_DOCUMENT: &str = "docx.convert_document";
pub const TOOL_GET_CONVERSION_STATUS: &str = "docx.get_conversion_status";
pub const TOOL_GET_CONVERSION_HISTORY: &str = "docx.get_conversion_history";

pub const MAX_TABLE_ROWS: i64 = 1000;
pub const MAX_TABLE_COLUMNS: i64 = 100;
pub const MIN_WATERMARK_FONT_SIZE: i64 = 1;
pub const MAX_WATERMARK_FONT_SIZE: i64 = 500;
pub const DEFAULT_WATERMARK_FONT_SIZE: i64 = 65;
pub const DEFAULT_WATERMARK_COLOR: &str = "Red";
/// Largest indent or spacing Word accepts, in points.
pub const MAX_FORMAT_POINTS: f64 = 1584.0;

fn document_name() -> Value {
    json!({ "type": "string", "description": "File name inside the documents directory" })
}

fn index(description: &str) -> Value {
    json!({ "type": "integer", "minimum": 0, "description": description })
}

fn section_index() -> Value {
    json!({ "type": "integer", "minimum": 0, "default": 0 })
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

pub fn create_document_schema() -> Value {
    object(
        json!({
            "document_name": document_name(),
            "template_path": { "type": "string", "description": "Template file name inside the documents directory" }
        }),
        &["document_name"],
    )
}

pub fn document_only_schema() -> Value {
    object(json!({ "document_name": document_name() }), &["document_name"])
}

pub fn set_document_protection_schema() -> Value {
    object(
        json!({
            "document_name": document_name(),
            "protection_level": { "type": "string", "enum": ProtectionLevel::NAMES },
            "password": { "type": "string" }
        }),
        &["document_name", "protection_level"],
    )
}

pub fn find_and_replace_schema() -> Value {
    object(
        json!({
            "document_name": document_name(),
            "find_text": { "type": "string", "minLength": 1 },
            "replace_text": { "type": "string" },
            "match_case": { "type": "boolean", "default": false },
            "match_whole_word": { "type": "boolean", "default": false }
        }),
        &["document_name", "find_text", "replace_text"],
    )
}

pub fn merge_documents_schema() -> Value {
    object(
        json!({
            "original_document": document_name(),
            "merge_document": document_name(),
            "output_document": document_name()
        }),
        &["original_document", "merge_document", "output_document"],
    )
}

pub fn add_text_watermark_schema() -> Value {
    object(
        json!({
            "document_name": document_name(),
            "text": { "type": "string", "minLength": 1 },
            "font_size": {
                "type": "integer",
                "minimum": MIN_WATERMARK_FONT_SIZE,
                "maximum": MAX_WATERMARK_FONT_SIZE,
                "default": DEFAULT_WATERMARK_FONT_SIZE
            },
            "color": { "type": "string", "enum": NamedColor::names().collect::<Vec<_>>(), "default": DEFAULT_WATERMARK_COLOR },
            "layout": { "type": "string", "enum": WatermarkLayout::NAMES, "default": "diagonal" }
        }),
        &["document_name", "text"],
    )
}

pub fn paragraph_ref_schema() -> Value {
    object(
        json!({
            "document_name": document_name(),
            "paragraph_index": index("Zero-based paragraph index within the section"),
            "section_index": section_index()
        }),
        &["document_name", "paragraph_index"],
    )
}

pub fn add_paragraph_schema() -> Value {
    object(
        json!({
            "document_name": document_name(),
            "text": { "type": "string" },
            "section_index": section_index(),
            "paragraph_index": index("Insert position; appends when omitted")
        }),
        &["document_name", "text"],
    )
}

pub fn update_paragraph_text_schema() -> Value {
    object(
        json!({
            "document_name": document_name(),
            "paragraph_index": index("Zero-based paragraph index within the section"),
            "new_text": { "type": "string" },
            "section_index": section_index()
        }),
        &["document_name", "paragraph_index", "new_text"],
    )
}

pub fn format_paragraph_schema() -> Value {
    let points = json!({ "type": "number", "minimum": 0, "maximum": MAX_FORMAT_POINTS, "description": "Points" });
    object(
        json!({
            "document_name": document_name(),
            "paragraph_index": index("Zero-based paragraph index within the section"),
            "section_index": section_index(),
            "alignment": { "type": "string", "enum": Alignment::NAMES },
            "first_line_indent": points,
            "left_indent": points,
            "right_indent": points,
            "line_spacing": { "type": "number", "minimum": 0, "maximum": MAX_FORMAT_POINTS, "description": "Points; 12 is single spacing for the multiple rule" },
            "line_spacing_rule": { "type": "string", "enum": LineSpacingRule::NAMES },
            "before_spacing": points,
            "after_spacing": points
        }),
        &["document_name", "paragraph_index"],
    )
}

fn table_properties(paragraph_index: Option<Value>) -> Value {
    let mut properties = json!({
        "document_name": document_name(),
        "rows": { "type": "integer", "minimum": 1, "maximum": MAX_TABLE_ROWS },
        "columns": { "type": "integer", "minimum": 1, "maximum": MAX_TABLE_COLUMNS },
        "section_index": section_index(),
        "style": { "type": "string", "description": "Table style name, applied when recognised" }
    });
    if let Some(paragraph_index) = paragraph_index
        && let Some(map) = properties.as_object_mut()
    {
        map.insert("paragraph_index".to_string(), paragraph_index);
    }
    properties
}

pub fn create_table_schema() -> Value {
    object(
        table_properties(Some(index("Place the table after this paragraph; appends when omitted"))),
        &["document_name", "rows", "columns"],
    )
}

pub fn add_table_after_paragraph_schema() -> Value {
    object(
        table_properties(Some(json!({ "type": "integer", "minimum": 0, "default": 0 }))),
        &["document_name", "rows", "columns"],
    )
}

pub fn add_table_to_section_schema() -> Value {
    object(table_properties(None), &["document_name", "rows", "columns"])
}

pub fn table_ref_schema() -> Value {
    object(
        json!({
            "document_name": document_name(),
            "table_index": index("Zero-based table index within the section"),
            "section_index": section_index()
        }),
        &["document_name", "table_index"],
    )
}

pub fn set_cell_text_schema() -> Value {
    object(
        json!({
            "document_name": document_name(),
            "table_index": index("Zero-based table index within the section"),
            "row": index("Zero-based row"),
            "column": index("Zero-based column"),
            "text": { "type": "string" },
            "section_index": section_index()
        }),
        &["document_name", "table_index", "row", "column", "text"],
    )
}

pub fn convert_document_schema() -> Value {
    object(
        json!({
            "document_name": document_name(),
            "target_format": { "type": "string", "enum": Target::NAMES },
            "output_path": { "type": "string", "description": "Output file name; its extension is forced to the target format" }
        }),
        &["document_name", "target_format"],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemas_list_their_required_fields() {
        let schema = set_cell_text_schema();
        let required = schema["required"].as_array().expect("required");
        assert_eq!(required.len(), 5);
        for field in required {
            let field = field.as_str().expect("string");
            assert!(schema["properties"].get(field).is_some(), "{field} missing");
        }
    }

    #[test]
    fn only_create_table_variants_take_a_paragraph() {
        assert!(create_table_schema()["properties"].get("paragraph_index").is_some());
        assert_eq!(
            add_table_after_paragraph_schema()["properties"]["paragraph_index"]["default"],
            0
        );
        assert!(add_table_to_section_schema()["properties"].get("paragraph_index").is_none());
    }
}
