// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Resolved type descriptors.
//!
//! A [`TypeDescriptor`] is a root message type together with every type it
//! references, directly or transitively. Deserializers only ever see
//! descriptors, so decoding never has to go back to the registry.

use std::collections::HashMap;

use crate::schema::ast::{FieldType, MessageType};

/// Information about a field of the root type.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Field name
    pub name: String,
    /// Field type
    pub type_name: FieldType,
    /// Field index (for ordered access)
    pub index: usize,
}

/// A fully-resolved message type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    name: String,
    types: HashMap<String, MessageType>,
}

impl TypeDescriptor {
    /// Build a descriptor from its root name and the closure of its types.
    ///
    /// `types` must contain `name`; the registry guarantees this.
    pub(crate) fn new(name: String, types: HashMap<String, MessageType>) -> Self {
        Self { name, types }
    }

    /// Spec string of the root type.
    pub fn type_name(&self) -> &str {
        &self.name
    }

    /// The root message type.
    pub fn root(&self) -> Option<&MessageType> {
        self.types.get(&self.name)
    }

    /// Look up a referenced type by spec string.
    pub fn get_type(&self, name: &str) -> Option<&MessageType> {
        self.types.get(name)
    }

    /// Number of types in the closure, the root included.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Fields of the root type, in declared order.
    pub fn fields(&self) -> Vec<FieldInfo> {
        self.root()
            .map(|msg_type| {
                msg_type
                    .fields
                    .iter()
                    .enumerate()
                    .map(|(index, field)| FieldInfo {
                        name: field.name.clone(),
                        type_name: field.type_name.clone(),
                        index,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check whether a dotted field path exists (e.g. `["header", "stamp"]`).
    pub fn has_nested_field(&self, path: &[&str]) -> bool {
        let Some(mut current) = self.root() else {
            return false;
        };
        let Some((last, parents)) = path.split_last() else {
            return false;
        };

        for segment in parents {
            let next = current
                .field(segment)
                .and_then(|f| match &f.type_name {
                    FieldType::Nested(name) => self.types.get(name),
                    _ => None,
                });
            match next {
                Some(msg_type) => current = msg_type,
                None => return false,
            }
        }
        current.field(last).is_some()
    }
}
