use std::fs;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use regex::RegexBuilder;
use serde_json::{Value, json};
use tracing::info;

use super::Outcome;
use crate::docx::color::NamedColor;
use crate::docx::model::{PasswordHash, Protection, ProtectionLevel, Watermark, WatermarkLayout};
use crate::docx::Document;
use crate::error::{DocError, DocResult};
use crate::input::Args;
use crate::mcp::contracts::{
    DEFAULT_WATERMARK_COLOR, DEFAULT_WATERMARK_FONT_SIZE, MAX_WATERMARK_FONT_SIZE,
    MIN_WATERMARK_FONT_SIZE,
};
use crate::session::{self, DocumentSession, OpenMode};
use crate::state::ServerState;

pub fn create_document(state: &ServerState, args: Args) -> DocResult<Outcome> {
    let name = args.required_str("document_name")?;
    let path = state.resolve(name)?;
    session::check_path(&path)?;

    let mut template_applied = false;
    let mut document = Document::blank();
    if let Some(template) = args.optional_str("template_path")? {
        let template_path = state.resolve(template)?;
        if template_path.is_file() {
            let template_session = DocumentSession::open(&template_path, OpenMode::Existing)?;
            document = template_session.document()?.clone();
            template_applied = true;
        } else {
            info!(template, "template not found, creating a blank document");
        }
    }

    state.exclusive(&path, || DocumentSession::create(&path, document).save())?;
    info!(path = %path.display(), template_applied, "document created");

    let mut data = file_facts(&path)?;
    data["template_applied"] = json!(template_applied);
    Ok(Outcome::new("Document created successfully", data))
}

pub fn get_document_info(state: &ServerState, args: Args) -> DocResult<Outcome> {
    let path = state.resolve(args.required_str("document_name")?)?;
    let mut data = state.read(&path, |session| {
        let document = session.document()?;
        let sections: Vec<Value> = document
            .sections
            .iter()
            .enumerate()
            .map(|(index, section)| {
                json!({
                    "section_index": index,
                    "paragraphs": section.paragraph_count(),
                    "tables": section.table_count(),
                })
            })
            .collect();
        let watermark = document.watermark.as_ref().map(|watermark| {
            json!({
                "text": watermark.text,
                "font_size": watermark.font_size,
                "color": NamedColor::from_hex(&watermark.color)
                    .map(|color| color.name().to_string())
                    .unwrap_or_else(|| format!("#{}", watermark.color)),
                "layout": watermark.layout.as_str(),
            })
        });
        Ok(json!({
            "section_count": document.section_count(),
            "paragraph_count": document.sections.iter().map(|s| s.paragraph_count()).sum::<usize>(),
            "table_count": document.sections.iter().map(|s| s.table_count()).sum::<usize>(),
            "sections": sections,
            "protection": {
                "protection_level": document.protection.level.as_str(),
                "is_protected": document.protection.is_protected(),
                "has_password": document.protection.password.is_some(),
            },
            "watermark": watermark,
        }))
    })?;
    let facts = file_facts(&path)?;
    if let (Some(map), Value::Object(facts)) = (data.as_object_mut(), facts) {
        map.extend(facts);
    }
    Ok(Outcome::new("Document info retrieved successfully", data))
}

pub fn set_document_protection(state: &ServerState, args: Args) -> DocResult<Outcome> {
    let path = state.resolve(args.required_str("document_name")?)?;
    let requested = args.required_str("protection_level")?;
    let level = ProtectionLevel::parse(requested).ok_or_else(|| {
        DocError::Validation(format!(
            "invalid protection level: {requested}. Valid values: {}",
            ProtectionLevel::NAMES.join(", ")
        ))
    })?;
    let password = args.optional_str("password")?.filter(|value| !value.is_empty());

    let protection = state.mutate(&path, |session| {
        let document = session.document_mut()?;
        if let Some(existing) = &document.protection.password
            && document.protection.is_protected()
            && !password.is_some_and(|candidate| existing.matches(candidate))
        {
            return Err(DocError::Validation(
                "document protection is password protected; supply the current password"
                    .to_string(),
            ));
        }
        document.protection = match level {
            ProtectionLevel::None => Protection::default(),
            level => Protection {
                level,
                password: password.map(PasswordHash::new),
            },
        };
        Ok(document.protection.clone())
    })?;
    info!(path = %path.display(), level = level.as_str(), "protection updated");

    Ok(Outcome::new(
        "Document protection set successfully",
        json!({
            "protection_level": protection.level.as_str(),
            "is_protected": protection.is_protected(),
            "has_password": protection.password.is_some(),
        }),
    ))
}

pub fn find_and_replace(state: &ServerState, args: Args) -> DocResult<Outcome> {
    let path = state.resolve(args.required_str("document_name")?)?;
    let find_text = args.required_str("find_text")?;
    let replace_text = args.required_str("replace_text")?;
    let match_case = args.bool_or("match_case", false)?;
    let match_whole_word = args.bool_or("match_whole_word", false)?;
    if find_text.is_empty() {
        return Err(DocError::Validation("find text cannot be empty".to_string()));
    }

    let pattern = RegexBuilder::new(&regex::escape(find_text))
        .case_insensitive(!match_case)
        .build()
        .map_err(|err| DocError::Validation(format!("cannot search for {find_text:?}: {err}")))?;

    let replacements = state.mutate(&path, |session| {
        Ok(session.document_mut()?.replace_text(&pattern, replace_text, match_whole_word))
    })?;
    info!(path = %path.display(), replacements, "text replaced");

    Ok(Outcome::new(
        "Text replacement completed successfully",
        json!({
            "replacements": replacements,
            "search_params": {
                "find_text": find_text,
                "replace_text": replace_text,
                "match_case": match_case,
                "match_whole_word": match_whole_word,
            },
        }),
    ))
}

pub fn merge_documents(state: &ServerState, args: Args) -> DocResult<Outcome> {
    let original_name = args.required_str("original_document")?;
    let merge_name = args.required_str("merge_document")?;
    let output_name = args.required_str("output_document")?;
    let original_path = state.resolve(original_name)?;
    let merge_path = state.resolve(merge_name)?;
    let output_path = state.resolve(output_name)?;

    if !merge_path.is_file() {
        return Err(DocError::Merge(format!(
            "document to merge not found: {merge_name}"
        )));
    }
    if output_path == original_path {
        return Err(DocError::Validation(
            "output document must differ from the original document".to_string(),
        ));
    }
    session::check_path(&output_path)?;

    let mut merged = state.read(&original_path, |session| Ok(session.document()?.clone()))?;
    let source = state.read(&merge_path, |session| Ok(session.document()?.clone()))?;
    let sections_before = merged.section_count();
    let sections_merged = source.section_count();
    merged.append_document(source);
    let total_sections = merged.section_count();

    state.exclusive(&output_path, || {
        DocumentSession::create(&output_path, merged).save()
    })?;
    info!(output = %output_path.display(), total_sections, "documents merged");

    Ok(Outcome::new(
        "Documents merged successfully",
        json!({
            "output_path": output_path.display().to_string(),
            "merge_stats": {
                "original_document": original_name,
                "merge_document": merge_name,
                "output_document": output_name,
                "original_sections": sections_before,
                "merged_sections": sections_merged,
                "total_sections": total_sections,
            },
        }),
    ))
}

pub fn add_text_watermark(state: &ServerState, args: Args) -> DocResult<Outcome> {
    let path = state.resolve(args.required_str("document_name")?)?;
    let text = args.required_str("text")?;
    if text.trim().is_empty() {
        return Err(DocError::Validation("watermark text cannot be empty".to_string()));
    }
    let font_size = args.integer_or("font_size", DEFAULT_WATERMARK_FONT_SIZE)?;
    if !(MIN_WATERMARK_FONT_SIZE..=MAX_WATERMARK_FONT_SIZE).contains(&font_size) {
        return Err(DocError::Validation(format!(
            "font size must be between {MIN_WATERMARK_FONT_SIZE} and {MAX_WATERMARK_FONT_SIZE}, got {font_size}"
        )));
    }
    let color_name = args.str_or("color", DEFAULT_WATERMARK_COLOR)?;
    let color = NamedColor::parse(color_name).ok_or_else(|| {
        DocError::Validation(format!(
            "unknown color: {color_name}. Valid colors: {}",
            NamedColor::names().collect::<Vec<_>>().join(", ")
        ))
    })?;
    let layout_name = args.str_or("layout", WatermarkLayout::Diagonal.as_str())?;
    let layout = WatermarkLayout::parse(layout_name).ok_or_else(|| {
        DocError::Validation(format!(
            "invalid layout: {layout_name}. Valid values: {}",
            WatermarkLayout::NAMES.join(", ")
        ))
    })?;

    let watermark = Watermark {
        text: text.to_string(),
        font_size: font_size as u32,
        color: color.hex().to_string(),
        layout,
    };
    state.mutate(&path, |session| {
        session.document_mut()?.watermark = Some(watermark);
        Ok(())
    })?;
    info!(path = %path.display(), "watermark added");

    Ok(Outcome::new(
        "Text watermark added successfully",
        json!({
            "watermark_info": {
                "text": text,
                "font_size": font_size,
                "color": color.name(),
                "layout": layout.as_str(),
            },
        }),
    ))
}

fn file_facts(path: &Path) -> DocResult<Value> {
    let metadata = fs::metadata(path).map_err(|err| {
        DocError::Load(format!("cannot read file metadata {}: {err}", path.display()))
    })?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(json!({
        "path": path.display().to_string(),
        "name": name,
        "size": metadata.len(),
        "created": metadata.created().ok().map(rfc3339),
        "modified": metadata.modified().ok().map(rfc3339),
    }))
}

fn rfc3339(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339()
}
