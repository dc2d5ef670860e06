use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value, json};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;
mod docx;
mod error;
mod input;
mod mcp;
mod paths;
mod session;
mod state;
mod tools;
mod tracker;
mod validate;

use config::{BASE_DIR_ENV, Config};
use state::ServerState;

#[derive(Parser)]
#[command(name = "mcp-docx")]
#[command(version, about = "Word document tools served over MCP, plus a small CLI")]
struct Cli {
    /// Directory documents are resolved in (defaults to ./word_files)
    #[arg(long, global = true, env = BASE_DIR_ENV)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct InfoArgs {
    /// Document file name inside the base directory
    #[arg(long)]
    name: String,
    /// Output JSON structuredContent
    #[arg(long)]
    json: bool,
}

#[derive(Args, Clone)]
struct ConvertArgs {
    /// Document file name inside the base directory
    #[arg(long)]
    name: String,
    /// Target format: docx, txt, md, html, rtf or xml
    #[arg(long)]
    to: String,
    /// Output file name; its extension is replaced by the target format
    #[arg(long)]
    output: Option<String>,
    /// Output JSON structuredContent
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP stdio server
    Serve {
        /// Serve MCP over stdio (NDJSON)
        #[arg(long)]
        stdio: bool,
    },
    /// Show sections, counts, protection and watermark of a document
    Info(InfoArgs),
    /// Convert a document to another format
    Convert(ConvertArgs),
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let state = ServerState::new(Config::new(cli.base_dir));

    match cli.command {
        Commands::Serve { stdio } => {
            if stdio {
                run_stdio_server(&state)
            } else {
                anyhow::bail!("only --stdio transport is supported")
            }
        }
        Commands::Info(args) => run_info(&state, args),
        Commands::Convert(args) => run_convert(&state, args),
    }
}

/// Logs go to stderr; stdout carries protocol traffic only.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run_info(state: &ServerState, args: InfoArgs) -> Result<()> {
    let mut map = Map::new();
    map.insert("document_name".to_string(), json!(args.name));
    let result = tools::call(
        state,
        mcp::contracts::TOOL_GET_DOCUMENT_INFO,
        &Value::Object(map),
    );
    print_tool_result(result, args.json)
}

fn run_convert(state: &ServerState, args: ConvertArgs) -> Result<()> {
    let mut map = Map::new();
    map.insert("document_name".to_string(), json!(args.name));
    map.insert("target_format".to_string(), json!(args.to));
    if let Some(output) = args.output {
        map.insert("output_path".to_string(), json!(output));
    }
    let result = tools::call(
        state,
        mcp::contracts::TOOL_CONVERT_DOCUMENT,
        &Value::Object(map),
    );
    print_tool_result(result, args.json)
}

fn print_tool_result(result: Value, json_output: bool) -> Result<()> {
    let envelope = result
        .get("structuredContent")
        .cloned()
        .unwrap_or_else(|| json!({}));
    let is_error = result
        .get("isError")
        .and_then(|value| value.as_bool())
        .unwrap_or(false);

    if is_error {
        let message = envelope
            .get("message")
            .and_then(|value| value.as_str())
            .unwrap_or("tool error");
        eprintln!("{message}");
        process::exit(1);
    }

    if json_output {
        let output = serde_json::to_string_pretty(&envelope)?;
        println!("{output}");
        return Ok(());
    }

    let message = envelope
        .get("message")
        .and_then(|value| value.as_str())
        .unwrap_or("");
    println!("{message}");
    if let Some(data) = envelope.get("data").and_then(|value| value.as_object()) {
        for (key, value) in data {
            match value {
                Value::String(text) => println!("{key}: {text}"),
                other => println!("{key}: {other}"),
            }
        }
    }
    Ok(())
}

fn run_stdio_server(state: &ServerState) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let reader = stdin.lock().lines();
    let mut writer = io::BufWriter::new(stdout.lock());
    info!(base_dir = %state.base_dir().display(), "serving MCP over stdio");

    for line in reader {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let request: Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(err) => {
                debug!("skipping unparsable line: {err}");
                continue;
            }
        };

        let method = request.get("method").and_then(|value| value.as_str());
        let id = request.get("id").cloned();
        let response = match (method, id) {
            (Some("initialize"), Some(id)) => Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "protocolVersion": "2025-11-25",
                    "capabilities": {
                        "tools": {}
                    },
                    "serverInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }
            })),
            (Some("ping"), Some(id)) => Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {}
            })),
            (Some("tools/list"), Some(id)) => Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "tools": mcp::tool_definitions()
                }
            })),
            (Some("tools/call"), Some(id)) => Some(match handle_tool_call(state, &request) {
                Ok(result) => json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": result
                }),
                Err(message) => json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": {
                        "code": mcp::errors::INVALID_PARAMS,
                        "message": message
                    }
                }),
            }),
            (Some(method), Some(id)) => Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {
                    "code": mcp::errors::METHOD_NOT_FOUND,
                    "message": format!("method not found: {method}")
                }
            })),
            _ => None,
        };

        if let Some(response) = response {
            let serialized =
                serde_json::to_string(&response).context("failed to serialize response")?;
            writeln!(writer, "{serialized}").context("failed to write response")?;
            writer.flush().context("failed to flush response")?;
        }
    }

    Ok(())
}

/// Malformed `params` are a protocol error; everything past that point is
/// answered with a tool envelope.
fn handle_tool_call(state: &ServerState, request: &Value) -> Result<Value, String> {
    let Some(params) = request.get("params").and_then(|value| value.as_object()) else {
        return Err("params must be an object".to_string());
    };
    let Some(name) = params.get("name").and_then(|value| value.as_str()) else {
        return Err("params.name must be a string".to_string());
    };
    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| json!({}));
    debug!(tool = name, "tools/call");
    Ok(tools::call(state, name, &arguments))
}
