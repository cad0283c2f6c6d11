// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Topic filtering for sequential cursors.

/// Allow-list of topics applied to subsequent reads.
///
/// An empty list means no filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageFilter {
    /// Topics to keep
    pub topics: Vec<String>,
}

impl StorageFilter {
    /// Create a filter from topic names.
    pub fn new<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            topics: topics.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether the filter lets everything through.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Check if a topic should be included.
    pub fn should_include(&self, topic: &str) -> bool {
        self.is_empty() || self.topics.iter().any(|t| t == topic)
    }
}
