// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Records command - print decoded records.

use std::io::Write as _;
use std::path::Path;

use clap::{Args, ValueEnum};
use tracing::warn;

use crate::common::{format_timestamp, format_value, open_reader, InputArgs, Result};
use bagrecord::io::reader::{TIME_KEY, TOPIC_KEY, TYPE_KEY};
use bagrecord::{CodecValue, Fields};

/// Output format for records.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable lines
    Text,
}

/// Print records in timestamp order.
#[derive(Args, Clone, Debug)]
pub struct RecordsCmd {
    #[command(flatten)]
    input: InputArgs,

    /// Only read this topic (repeatable)
    #[arg(short, long = "topic", value_name = "TOPIC")]
    topics: Vec<String>,

    /// Stop after this many records
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = RecordFormat::Json)]
    format: RecordFormat,

    /// Log undecodable records and keep going
    #[arg(long)]
    skip_errors: bool,
}

impl RecordsCmd {
    pub fn run(self, config: Option<&Path>) -> Result<()> {
        let mut reader = open_reader(&self.input, config)?;
        if !self.topics.is_empty() {
            reader.set_filter(self.topics.iter().cloned())?;
        }

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let limit = self.limit.unwrap_or(usize::MAX);
        let mut printed = 0usize;

        for record in reader.iter() {
            if printed >= limit {
                break;
            }
            let record = match record {
                Ok(record) => record,
                Err(e) if self.skip_errors => {
                    warn!(stage = e.stage(), error = %e, "skipping record");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            match self.format {
                RecordFormat::Json => writeln!(out, "{}", serde_json::to_string(&record)?)?,
                RecordFormat::Text => writeln!(out, "{}", format_record(&record))?,
            }
            printed += 1;
        }
        out.flush()?;
        Ok(())
    }
}

fn format_record(record: &Fields) -> String {
    let time = record
        .get(TIME_KEY)
        .and_then(CodecValue::as_i64)
        .map(format_timestamp)
        .unwrap_or_default();
    let topic = record.get(TOPIC_KEY).and_then(CodecValue::as_str).unwrap_or("");
    let type_name = record.get(TYPE_KEY).and_then(CodecValue::as_str).unwrap_or("");
    let fields: Vec<String> = record
        .iter()
        .filter(|(name, _)| ![TOPIC_KEY, TIME_KEY, TYPE_KEY].contains(name))
        .map(|(name, value)| format!("{name}={}", format_value(value)))
        .collect();
    format!("{time} {topic} [{type_name}] {}", fields.join(" "))
}
