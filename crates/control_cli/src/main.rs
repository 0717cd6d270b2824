use base64::Engine as _;
use clap::{Parser, Subcommand, ValueEnum};
use dotenvy::from_path as dotenv_from_path;
use drift_core::{CoreError, Engine, EngineConfig};
use serde_json::json;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "DRIFT_LOG";
const BYTES_ENCODING_ENV: &str = "DRIFT_BYTES_ENCODING";

#[derive(Debug, Error)]
enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("invalid hex bytes: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("invalid base64 bytes: {0}")]
    Base64(#[from] base64::DecodeError),
}

#[derive(Parser)]
#[command(name = "drift", version, about = "Deterministic JSON normalization, hashing and Struct encoding")]
struct Args {
    /// Read JSON (or encoded bytes) from this file instead of stdin
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BytesEncoding {
    Hex,
    Base64,
}

impl BytesEncoding {
    /// Flag first, then `DRIFT_BYTES_ENCODING`, then hex.
    fn resolve(flag: Option<BytesEncoding>) -> Self {
        if let Some(encoding) = flag {
            return encoding;
        }
        match std::env::var(BYTES_ENCODING_ENV) {
            Ok(raw) => BytesEncoding::from_str(raw.trim(), true).unwrap_or_else(|_| {
                warn!(value = %raw, "ignoring invalid {BYTES_ENCODING_ENV}, using hex");
                BytesEncoding::Hex
            }),
            Err(_) => BytesEncoding::Hex,
        }
    }

    fn encode(self, bytes: &[u8]) -> String {
        match self {
            BytesEncoding::Hex => hex::encode(bytes),
            BytesEncoding::Base64 => base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    fn decode(self, text: &str) -> Result<Vec<u8>, CliError> {
        let text = text.trim();
        Ok(match self {
            BytesEncoding::Hex => hex::decode(text)?,
            BytesEncoding::Base64 => base64::engine::general_purpose::STANDARD.decode(text)?,
        })
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the canonical form of the input JSON.
    Normalize,

    /// Print the SHA-256 (lowercase hex) of the canonical form.
    Hash,

    /// Print {"deterministic_hash", "normalized_json"} computed from one parse.
    NormalizeAndHash,

    /// Encode a top-level JSON object as google.protobuf.Struct bytes.
    StructBytes {
        /// Output encoding for the bytes (default from DRIFT_BYTES_ENCODING, else hex)
        #[arg(long, value_enum)]
        encoding: Option<BytesEncoding>,
    },

    /// Print the number of top-level fields of the encoded Struct.
    StructFieldCount,

    /// Decode Struct bytes (hex or base64 text) and print them as canonical JSON.
    StructDecode {
        /// Input encoding for the bytes (default from DRIFT_BYTES_ENCODING, else hex)
        #[arg(long, value_enum)]
        encoding: Option<BytesEncoding>,
    },

    /// Run the export-payload pipeline and print its outputs as one JSON object.
    ///
    /// Struct bytes are base64 encoded in the output.
    ExportPayload {
        /// Path to a JSON object of schema merges keyed by top-level payload key
        #[arg(long)]
        merges: Option<PathBuf>,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("ERROR: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn run() -> Result<(), CliError> {
    // Best-effort: a missing .env is the normal case.
    if Path::new(".env").exists() {
        let _ = dotenv_from_path(".env");
    }
    init_tracing();

    let args = Args::parse();
    let engine = Engine::new(EngineConfig::from_env());
    let input = read_input(args.input.as_deref())?;

    match args.cmd {
        Command::Normalize => {
            println!("{}", engine.normalize_json(input_text(&input)?)?);
        }
        Command::Hash => {
            println!("{}", engine.deterministic_hash(input_text(&input)?)?);
        }
        Command::NormalizeAndHash => {
            let out = engine.normalize_and_hash(input_text(&input)?)?;
            let body = json!({
                "deterministic_hash": out.deterministic_hash,
                "normalized_json": out.normalized_json,
            });
            println!("{}", serde_json::to_string(&body)?);
        }
        Command::StructBytes { encoding } => {
            let bytes = engine.object_to_protobuf_struct_bytes(input_text(&input)?)?;
            println!("{}", BytesEncoding::resolve(encoding).encode(&bytes));
        }
        Command::StructFieldCount => {
            println!("{}", engine.object_to_protobuf_struct_field_count(input_text(&input)?)?);
        }
        Command::StructDecode { encoding } => {
            let bytes = BytesEncoding::resolve(encoding).decode(input_text(&input)?)?;
            let value = drift_core::struct_bytes_to_json(&bytes)?;
            println!("{}", drift_core::canonicalize(&value));
        }
        Command::ExportPayload { merges } => {
            let merges = merges.map(fs::read_to_string).transpose()?;
            let out = engine.process_export_payload(input_text(&input)?, merges.as_deref())?;
            let body = json!({
                "normalized_json": out.normalized_json,
                "decoded_json": out.decoded_json,
                "decoded_value_hash": out.decoded_value_hash,
                "decoded_schema_json": out.decoded_schema_json,
                "decoded_schema_hash": out.decoded_schema_hash,
                "protobuf_struct_bytes": BytesEncoding::Base64.encode(&out.protobuf_struct_bytes),
            });
            println!("{}", serde_json::to_string(&body)?);
        }
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>, CliError> {
    let bytes = match path {
        Some(p) => fs::read(p)?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };
    debug!(len = bytes.len(), from_file = path.is_some(), "read input");
    Ok(bytes)
}

fn input_text(bytes: &[u8]) -> Result<&str, CliError> {
    Ok(std::str::from_utf8(bytes).map_err(CoreError::from)?)
}
