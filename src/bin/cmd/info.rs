// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Info command - recording summary.

use std::path::Path;

use clap::Args;

use crate::common::{format_duration, format_timestamp, reader_options, InputArgs, Result};
use bagrecord::BagReader;

/// Show storage, duration and per-topic counts.
#[derive(Args, Clone, Debug)]
pub struct InfoCmd {
    #[command(flatten)]
    input: InputArgs,
}

impl InfoCmd {
    pub fn run(self, config: Option<&Path>) -> Result<()> {
        let options = reader_options(&self.input, config)?;
        let storage_id = options.storage_id.clone();
        let reader = BagReader::with_options(options)?;

        let stats = reader.statistics()?;
        let topics = reader.topics_and_types()?;

        println!("=== Recording ===");
        if let Some(path) = reader.path() {
            println!("Path:     {}", path.display());
        }
        println!("Storage:  {storage_id}");
        println!("Messages: {}", stats.message_count);
        println!("Topics:   {}", topics.len());
        if let (Some(start), Some(end)) = (stats.start_time_ns, stats.end_time_ns) {
            println!("Duration: {}", format_duration(stats.duration_ns().max(0) as u64));
            println!("Start:    {}", format_timestamp(start));
            println!("End:      {}", format_timestamp(end));
        }

        println!();
        println!("=== Topics ===");
        for topic in &topics {
            let count = stats
                .topic_counts
                .iter()
                .find(|(name, _)| *name == topic.name)
                .map_or(0, |(_, count)| *count);
            let definition = if topic.definition.is_some() {
                " (embedded definition)"
            } else {
                ""
            };
            println!(
                "  {} [{}] {} messages{}",
                topic.name, topic.type_name, count, definition
            );
        }
        Ok(())
    }
}
