// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for CLI commands.

use std::path::{Path, PathBuf};

use clap::Args;

use bagrecord::io::detect_storage;
use bagrecord::{BagReader, CodecValue, ReaderOptions};

pub use anyhow::Result as CliResult;
pub type Result<T = ()> = CliResult<T>;

/// Arguments locating a recording.
#[derive(Args, Clone, Debug)]
pub struct InputArgs {
    /// Recording file or bag directory (may come from --config instead)
    #[arg(value_name = "BAG")]
    pub input: Option<PathBuf>,

    /// Storage backend (sqlite3 or mcap); detected when omitted
    #[arg(short, long, value_name = "ID")]
    pub storage: Option<String>,

    /// Directory searched for .msg files (repeatable)
    #[arg(short = 'I', long = "message-path", value_name = "DIR")]
    pub message_paths: Vec<PathBuf>,
}

/// Build reader options from the command line and an optional config file.
///
/// The positional path and `--storage` override the file. With neither a
/// `--storage` nor a config file the backend is detected from the path.
pub fn reader_options(args: &InputArgs, config: Option<&Path>) -> Result<ReaderOptions> {
    let mut options = match config {
        Some(file) => Some(ReaderOptions::from_file(file)?),
        None => None,
    };

    let path = match (&args.input, &options) {
        (Some(input), _) => input.clone(),
        (None, Some(options)) => options.path.clone(),
        (None, None) => anyhow::bail!("no recording given (pass a path or --config)"),
    };

    let storage_id = match (&args.storage, &options) {
        (Some(storage), _) => storage.clone(),
        (None, Some(options)) if args.input.is_none() => options.storage_id.clone(),
        _ => detect_storage(&path)?.as_str().to_string(),
    };

    let mut merged = match options.take() {
        Some(options) => ReaderOptions { path, ..options },
        None => ReaderOptions::new(path),
    }
    .with_storage_id(storage_id);
    for dir in &args.message_paths {
        merged = merged.with_message_path(dir.clone());
    }
    merged.validate()?;
    Ok(merged)
}

/// Open a reader for the command line arguments.
pub fn open_reader(args: &InputArgs, config: Option<&Path>) -> Result<BagReader> {
    let options = reader_options(args, config)?;
    Ok(BagReader::with_options(options)?)
}

/// Format a duration in nanoseconds to human-readable string.
pub fn format_duration(nanos: u64) -> String {
    let secs = nanos / 1_000_000_000;
    let millis = (nanos % 1_000_000_000) / 1_000_000;

    if secs >= 3600 {
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        format!("{}h {}m", hours, minutes)
    } else if secs >= 60 {
        let minutes = secs / 60;
        let remaining_secs = secs % 60;
        format!("{}m {}s", minutes, remaining_secs)
    } else if secs > 0 {
        format!("{}.{:03}s", secs, millis)
    } else {
        format!("{}ms", millis)
    }
}

/// Format a timestamp in nanoseconds to human-readable string.
pub fn format_timestamp(nanos: i64) -> String {
    let secs = nanos.div_euclid(1_000_000_000);
    let subsec = nanos.rem_euclid(1_000_000_000) as u32;
    match chrono::DateTime::<chrono::Utc>::from_timestamp(secs, subsec) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string(),
        None => format!("{} ns", nanos),
    }
}

/// Render a value on one line; byte buffers are shown as hex.
pub fn format_value(value: &CodecValue) -> String {
    match value {
        CodecValue::Bytes(bytes) if bytes.len() > 32 => {
            format!("0x{}... ({} bytes)", hex::encode(&bytes[..32]), bytes.len())
        }
        CodecValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
        CodecValue::Array(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        CodecValue::Struct(fields) => {
            let items: Vec<String> = fields
                .iter()
                .map(|(name, value)| format!("{name}: {}", format_value(value)))
                .collect();
            format!("{{{}}}", items.join(", "))
        }
        other => other.to_string(),
    }
}
