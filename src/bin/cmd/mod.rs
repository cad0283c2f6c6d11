// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI subcommands.

mod info;
mod records;
mod schema;
mod topics;

pub use info::InfoCmd;
pub use records::RecordsCmd;
pub use schema::SchemaCmd;
pub use topics::{TopicsCmd, TypesCmd};
