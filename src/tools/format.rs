use serde_json::{Value, json};
use tracing::info;

use super::Outcome;
use crate::docx::model::{Alignment, LineSpacingRule, ParagraphFormat};
use crate::error::{DocError, DocResult};
use crate::input::Args;
use crate::mcp::contracts::MAX_FORMAT_POINTS;
use crate::state::ServerState;
use crate::validate::validate_paragraph;

/// Every field a caller may set. `None` leaves the current value alone.
#[derive(Debug, Default, Clone, Copy)]
struct FormatChanges {
    alignment: Option<Alignment>,
    first_line_indent: Option<f64>,
    left_indent: Option<f64>,
    right_indent: Option<f64>,
    line_spacing: Option<f64>,
    line_spacing_rule: Option<LineSpacingRule>,
    before_spacing: Option<f64>,
    after_spacing: Option<f64>,
}

impl FormatChanges {
    /// Parses and checks every field before anything is touched.
    fn from_args(args: &Args) -> DocResult<Self> {
        let alignment = match args.optional_str("alignment")? {
            Some(value) => Some(Alignment::parse(value).ok_or_else(|| {
                DocError::Validation(format!(
                    "invalid alignment: {value}. Valid values: {}",
                    Alignment::NAMES.join(", ")
                ))
            })?),
            None => None,
        };
        let line_spacing_rule = match args.optional_str("line_spacing_rule")? {
            Some(value) => Some(LineSpacingRule::parse(value).ok_or_else(|| {
                DocError::Validation(format!(
                    "invalid line spacing rule: {value}. Valid values: {}",
                    LineSpacingRule::NAMES.join(", ")
                ))
            })?),
            None => None,
        };
        Ok(Self {
            alignment,
            first_line_indent: non_negative(args, "first_line_indent")?,
            left_indent: non_negative(args, "left_indent")?,
            right_indent: non_negative(args, "right_indent")?,
            line_spacing: non_negative(args, "line_spacing")?,
            line_spacing_rule,
            before_spacing: non_negative(args, "before_spacing")?,
            after_spacing: non_negative(args, "after_spacing")?,
        })
    }

    fn apply(&self, format: &mut ParagraphFormat) {
        if let Some(alignment) = self.alignment {
            format.alignment = alignment;
        }
        if let Some(value) = self.first_line_indent {
            format.first_line_indent = value;
        }
        if let Some(value) = self.left_indent {
            format.left_indent = value;
        }
        if let Some(value) = self.right_indent {
            format.right_indent = value;
        }
        if let Some(value) = self.line_spacing {
            format.line_spacing = value;
        }
        if let Some(rule) = self.line_spacing_rule {
            format.line_spacing_rule = rule;
        }
        if let Some(value) = self.before_spacing {
            format.before_spacing = value;
        }
        if let Some(value) = self.after_spacing {
            format.after_spacing = value;
        }
    }

    fn applied(&self) -> Value {
        json!({
            "alignment": self.alignment.is_some(),
            "first_line_indent": self.first_line_indent.is_some(),
            "left_indent": self.left_indent.is_some(),
            "right_indent": self.right_indent.is_some(),
            "line_spacing": self.line_spacing.is_some(),
            "line_spacing_rule": self.line_spacing_rule.is_some(),
            "before_spacing": self.before_spacing.is_some(),
            "after_spacing": self.after_spacing.is_some(),
        })
    }
}

fn non_negative(args: &Args, key: &str) -> DocResult<Option<f64>> {
    match args.optional_f64(key)? {
        Some(value) if value < 0.0 => Err(DocError::Validation(format!(
            "{key} cannot be negative: {value}"
        ))),
        Some(value) if value > MAX_FORMAT_POINTS => Err(DocError::Validation(format!(
            "{key} cannot exceed {MAX_FORMAT_POINTS} pt: {value}"
        ))),
        other => Ok(other),
    }
}

fn snapshot(format: &ParagraphFormat) -> DocResult<Value> {
    serde_json::to_value(format)
        .map_err(|err| DocError::Validation(format!("cannot describe paragraph format: {err}")))
}

pub fn format_paragraph(state: &ServerState, args: Args) -> DocResult<Outcome> {
    let path = state.resolve(args.required_str("document_name")?)?;
    let paragraph_index = args.index("paragraph_index")?;
    let section_index = args.index_or("section_index", 0)?;
    let changes = FormatChanges::from_args(&args)?;

    let data = state.mutate(&path, |session| {
        let document = session.document_mut()?;
        let (section, index) = validate_paragraph(document, paragraph_index, section_index)?;
        let paragraph = document.sections[section]
            .paragraph_mut(index)
            .ok_or_else(|| DocError::Index(format!("paragraph {index} not found")))?;
        let original = snapshot(&paragraph.format)?;
        changes.apply(&mut paragraph.format);
        Ok(json!({
            "section_index": section,
            "paragraph_index": index,
            "original_formatting": original,
            "current_formatting": snapshot(&paragraph.format)?,
            "changes_applied": changes.applied(),
        }))
    })?;
    info!(path = %path.display(), paragraph_index, "paragraph formatted");

    Ok(Outcome::new(
        format!("Formatting applied to paragraph {paragraph_index}"),
        data,
    ))
}

pub fn get_paragraph_format(state: &ServerState, args: Args) -> DocResult<Outcome> {
    let path = state.resolve(args.required_str("document_name")?)?;
    let paragraph_index = args.index("paragraph_index")?;
    let section_index = args.index_or("section_index", 0)?;

    let data = state.read(&path, |session| {
        let document = session.document()?;
        let (section, index) = validate_paragraph(document, paragraph_index, section_index)?;
        let paragraph = document.sections[section]
            .paragraph(index)
            .ok_or_else(|| DocError::Index(format!("paragraph {index} not found")))?;
        Ok(json!({
            "section_index": section,
            "paragraph_index": index,
            "formatting": snapshot(&paragraph.format)?,
        }))
    })?;

    Ok(Outcome::new(
        format!("Retrieved formatting for paragraph {paragraph_index}"),
        data,
    ))
}
