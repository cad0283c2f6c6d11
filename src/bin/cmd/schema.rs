// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Schema command - show the resolved fields of a message type.

use std::path::Path;

use clap::Args;

use crate::common::{open_reader, InputArgs, Result};
use bagrecord::schema::TypeDescriptor;

/// Show the fields of a message type or of a topic's type.
#[derive(Args, Clone, Debug)]
pub struct SchemaCmd {
    #[command(flatten)]
    input: InputArgs,

    /// Topic name or message type
    #[arg(short = 'T', long = "target", value_name = "TOPIC|TYPE")]
    target: String,

    /// Only print the root type's fields
    #[arg(long)]
    shallow: bool,
}

impl SchemaCmd {
    pub fn run(self, config: Option<&Path>) -> Result<()> {
        let reader = open_reader(&self.input, config)?;
        let type_map = reader.type_map()?;
        let type_name = type_map
            .get(&self.target)
            .cloned()
            .unwrap_or_else(|| self.target.clone());

        let descriptor = reader.registry().resolve(&type_name)?;
        println!("=== {} ===", descriptor.type_name());
        let max_depth = if self.shallow { 0 } else { usize::MAX };
        print_type(&descriptor, descriptor.type_name(), 1, max_depth);
        Ok(())
    }
}

fn print_type(descriptor: &TypeDescriptor, name: &str, indent: usize, max_depth: usize) {
    let Some(msg_type) = descriptor.get_type(name) else {
        return;
    };
    let pad = "  ".repeat(indent);
    for field in &msg_type.fields {
        println!("{pad}{} {}", field.type_name, field.name);
        if indent <= max_depth {
            if let Some(nested) = field.type_name.nested_name() {
                print_type(descriptor, nested, indent + 1, max_depth);
            }
        }
    }
}
