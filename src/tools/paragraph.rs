use serde_json::json;

use super::Outcome;
use crate::docx::model::Paragraph;
use crate::error::{DocError, DocResult};
use crate::input::Args;
use crate::state::ServerState;
use crate::validate::{validate_insert_position, validate_paragraph, validate_section};

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn line_count(text: &str) -> usize {
    if text.is_empty() { 0 } else { text.split('\n').count() }
}

pub fn get_paragraph_text(state: &ServerState, args: Args) -> DocResult<Outcome> {
    let path = state.resolve(args.required_str("document_name")?)?;
    let paragraph_index = args.index("paragraph_index")?;
    let section_index = args.index_or("section_index", 0)?;

    let data = state.read(&path, |session| {
        let document = session.document()?;
        let (section, index) = validate_paragraph(document, paragraph_index, section_index)?;
        let text = &document.sections[section].paragraph(index).ok_or_else(missing)?.text;
        Ok(json!({
            "section_index": section,
            "paragraph_index": index,
            "text": text,
            "text_length": text.chars().count(),
            "has_text": !text.trim().is_empty(),
            "word_count": word_count(text),
            "line_count": line_count(text),
        }))
    })?;
    Ok(Outcome::new("Paragraph text retrieved successfully", data))
}

pub fn get_paragraph_info(state: &ServerState, args: Args) -> DocResult<Outcome> {
    let path = state.resolve(args.required_str("document_name")?)?;
    let paragraph_index = args.index("paragraph_index")?;
    let section_index = args.index_or("section_index", 0)?;

    let data = state.read(&path, |session| {
        let document = session.document()?;
        let (section, index) = validate_paragraph(document, paragraph_index, section_index)?;
        let paragraph = document.sections[section].paragraph(index).ok_or_else(missing)?;
        Ok(json!({
            "section_index": section,
            "paragraph_index": index,
            "text": paragraph.text,
            "text_length": paragraph.text.chars().count(),
            "has_text": !paragraph.text.trim().is_empty(),
            "alignment": paragraph.format.alignment.as_str(),
            "style_name": paragraph.style,
        }))
    })?;
    Ok(Outcome::new("Paragraph info retrieved successfully", data))
}

pub fn add_paragraph(state: &ServerState, args: Args) -> DocResult<Outcome> {
    let path = state.resolve(args.required_str("document_name")?)?;
    let text = args.required_str("text")?;
    let section_index = args.index_or("section_index", 0)?;
    let insert_at = args.optional_index("paragraph_index")?;

    let data = state.mutate(&path, |session| {
        let document = session.document_mut()?;
        let section_index = validate_section(document, section_index)?;
        let section = &mut document.sections[section_index];
        let position = insert_at
            .map(|index| validate_insert_position(index, section.paragraph_count(), "paragraph"))
            .transpose()?;
        let index = section.insert_paragraph(position, Paragraph::with_text(text));
        Ok(json!({
            "section_index": section_index,
            "paragraph_index": index,
            "text": text,
            "text_length": text.chars().count(),
            "word_count": word_count(text),
            "total_paragraphs_in_section": section.paragraph_count(),
        }))
    })?;
    Ok(Outcome::new("Paragraph added successfully", data))
}

pub fn update_paragraph_text(state: &ServerState, args: Args) -> DocResult<Outcome> {
    let path = state.resolve(args.required_str("document_name")?)?;
    let paragraph_index = args.index("paragraph_index")?;
    let new_text = args.required_str("new_text")?;
    let section_index = args.index_or("section_index", 0)?;

    let data = state.mutate(&path, |session| {
        let document = session.document_mut()?;
        let (section, index) = validate_paragraph(document, paragraph_index, section_index)?;
        let paragraph = document.sections[section]
            .paragraph_mut(index)
            .ok_or_else(missing)?;
        let original_text = std::mem::replace(&mut paragraph.text, new_text.to_string());
        Ok(json!({
            "section_index": section,
            "paragraph_index": index,
            "original_text": original_text,
            "new_text": new_text,
            "text_length": new_text.chars().count(),
            "word_count": word_count(new_text),
        }))
    })?;
    Ok(Outcome::new("Paragraph text updated successfully", data))
}

pub fn delete_paragraph(state: &ServerState, args: Args) -> DocResult<Outcome> {
    let path = state.resolve(args.required_str("document_name")?)?;
    let paragraph_index = args.index("paragraph_index")?;
    let section_index = args.index_or("section_index", 0)?;

    let data = state.mutate(&path, |session| {
        let document = session.document_mut()?;
        let (section, index) = validate_paragraph(document, paragraph_index, section_index)?;
        let section_ref = &mut document.sections[section];
        let deleted = section_ref.remove_paragraph(index).ok_or_else(missing)?;
        Ok(json!({
            "section_index": section,
            "paragraph_index": index,
            "deleted_text": deleted.text,
            "remaining_paragraphs": section_ref.paragraph_count(),
        }))
    })?;
    Ok(Outcome::new("Paragraph deleted successfully", data))
}

/// Only reachable if a validated index stops resolving.
fn missing() -> DocError {
    DocError::Index("paragraph disappeared while the document was open".to_string())
}
