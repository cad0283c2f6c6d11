// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Message specification strings.
//!
//! A specification names an interface type as `package/category/Name`,
//! e.g. `example_interfaces/msg/String`. Recordings store type names in this
//! form; .msg files may reference types relatively (`Header`) or without the
//! category (`geometry_msgs/Point`), which [`normalize_reference`] expands.

use std::fmt;
use std::str::FromStr;

use crate::core::{BagError, Result};

/// Default interface category for message types.
pub const MSG_CATEGORY: &str = "msg";

/// A parsed `package/category/Name` specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageSpec {
    /// Interface package (e.g., `std_msgs`)
    pub package: String,
    /// Interface category (`msg`, `srv`, `action`)
    pub category: String,
    /// Type name (e.g., `Header`)
    pub name: String,
}

impl MessageSpec {
    /// Parse a specification string.
    ///
    /// The string must split on `/` into exactly three non-empty components.
    pub fn parse(specification: &str) -> Result<Self> {
        let parts: Vec<&str> = specification.split('/').collect();
        match parts.as_slice() {
            [package, category, name]
                if !package.is_empty() && !category.is_empty() && !name.is_empty() =>
            {
                Ok(Self {
                    package: package.to_string(),
                    category: category.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(BagError::specification_format(specification, parts.len())),
        }
    }

    /// Relative path of the interface file under a share directory.
    pub fn relative_path(&self) -> String {
        format!("{}/{}/{}.{}", self.package, self.category, self.name, self.category)
    }
}

impl fmt::Display for MessageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.package, self.category, self.name)
    }
}

impl FromStr for MessageSpec {
    type Err = BagError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Expand a type reference from a .msg file into a full spec string.
///
/// - `Name` resolves inside `owning_package` (`Header` is always `std_msgs`)
/// - `pkg/Name` becomes `pkg/msg/Name`
/// - `pkg/category/Name` is kept as is
pub fn normalize_reference(reference: &str, owning_package: Option<&str>) -> String {
    let reference = reference.trim().replace("::", "/");
    let parts: Vec<&str> = reference.split('/').collect();
    match parts.as_slice() {
        ["Header"] => format!("std_msgs/{MSG_CATEGORY}/Header"),
        [name] => match owning_package {
            Some(package) => format!("{package}/{MSG_CATEGORY}/{name}"),
            None => name.to_string(),
        },
        [package, name] => format!("{package}/{MSG_CATEGORY}/{name}"),
        _ => reference.clone(),
    }
}
