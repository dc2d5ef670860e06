use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tracing::info;

use super::Outcome;
use crate::docx::export::{self, Target};
use crate::error::{DocError, DocResult};
use crate::input::Args;
use crate::state::ServerState;
use crate::tracker::ConversionRecord;

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn convert_document(state: &ServerState, args: Args) -> DocResult<Outcome> {
    let path = state.resolve(args.required_str("document_name")?)?;
    let target_format = args.required_str("target_format")?;
    let output_name = args.optional_str("output_path")?;
    let source_format = extension_of(&path);
    let requested = target_format.trim().trim_start_matches('.').to_ascii_lowercase();

    let mut output_path: Option<PathBuf> = None;
    let result = (|| -> DocResult<PathBuf> {
        let target = Target::parse(&requested).ok_or_else(|| {
            DocError::Conversion(format!(
                "unsupported format: {target_format}. Supported formats: {}",
                Target::NAMES.join(", ")
            ))
        })?;
        let output = match output_name {
            Some(name) => state.resolve(name)?.with_extension(target.extension()),
            None => path.with_extension(target.extension()),
        };
        output_path = Some(output.clone());

        let document = state.read(&path, |session| Ok(session.document()?.clone()))?;
        state.exclusive(&output, || {
            export::export(&document, target, &output).map_err(|err| {
                DocError::Conversion(format!("failed to convert document: {err}"))
            })
        })?;
        Ok(output)
    })();

    match result {
        Ok(output) => {
            let record = ConversionRecord::success(&source_format, &requested, &output);
            state.tracker.record(&path, record.clone());
            info!(source = %path.display(), output = %output.display(), "document converted");
            Ok(Outcome::new(
                format!("Document converted to {requested} successfully"),
                json!({
                    "document": file_name(&path),
                    "source_format": record.source_format,
                    "target_format": record.target_format,
                    "output_path": record.output_path,
                    "timestamp": record.timestamp,
                }),
            ))
        }
        Err(err) => {
            state.tracker.record(
                &path,
                ConversionRecord::failed(
                    &source_format,
                    &requested,
                    output_path.as_deref(),
                    err.message(),
                ),
            );
            Err(err)
        }
    }
}

pub fn get_conversion_status(state: &ServerState, args: Args) -> DocResult<Outcome> {
    let path = state.resolve(args.required_str("document_name")?)?;
    let mut data = match state.tracker.latest(&path) {
        Some(record) => to_value(&record)?,
        None => json!({ "status": "none" }),
    };
    data["document"] = json!(file_name(&path));
    Ok(Outcome::new("Conversion status retrieved successfully", data))
}

pub fn get_conversion_history(state: &ServerState, args: Args) -> DocResult<Outcome> {
    let path = state.resolve(args.required_str("document_name")?)?;
    let history = state.tracker.history(&path);
    Ok(Outcome::new(
        "Conversion history retrieved successfully",
        json!({
            "document": file_name(&path),
            "total_conversions": history.len(),
            "history": to_value(&history)?,
        }),
    ))
}

fn to_value(value: &impl serde::Serialize) -> DocResult<Value> {
    serde_json::to_value(value)
        .map_err(|err| DocError::Conversion(format!("cannot describe conversion record: {err}")))
}
