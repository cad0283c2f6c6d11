// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Iterator adapter over [`BagReader::read_next`].

use crate::core::{Fields, Result};

use super::BagReader;

/// Iterator over the remaining records of a [`BagReader`].
///
/// Each item advances the shared cursor. Iteration ends with `None` once the
/// cursor is exhausted; an `Err` item aborts only that record.
pub struct Records<'a> {
    reader: &'a mut BagReader,
}

impl<'a> Records<'a> {
    pub(super) fn new(reader: &'a mut BagReader) -> Self {
        Self { reader }
    }
}

impl Iterator for Records<'_> {
    type Item = Result<Fields>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_next().transpose()
    }
}
