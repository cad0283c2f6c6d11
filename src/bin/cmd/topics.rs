// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Topics and types commands.

use std::collections::BTreeMap;
use std::path::Path;

use clap::Args;

use crate::common::{open_reader, InputArgs, Result};

/// List topic names.
#[derive(Args, Clone, Debug)]
pub struct TopicsCmd {
    #[command(flatten)]
    input: InputArgs,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,
}

impl TopicsCmd {
    pub fn run(self, config: Option<&Path>) -> Result<()> {
        let reader = open_reader(&self.input, config)?;
        let topics = reader.topics()?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&topics)?);
        } else {
            for topic in topics {
                println!("{topic}");
            }
        }
        Ok(())
    }
}

/// Print the topic to type mapping.
#[derive(Args, Clone, Debug)]
pub struct TypesCmd {
    #[command(flatten)]
    input: InputArgs,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,
}

impl TypesCmd {
    pub fn run(self, config: Option<&Path>) -> Result<()> {
        let reader = open_reader(&self.input, config)?;
        let types: BTreeMap<String, String> = reader.type_map()?.into_iter().collect();
        if self.json {
            println!("{}", serde_json::to_string_pretty(&types)?);
        } else {
            let width = types.keys().map(String::len).max().unwrap_or(0);
            for (topic, type_name) in &types {
                println!("{topic:<width$}  {type_name}");
            }
        }
        Ok(())
    }
}
