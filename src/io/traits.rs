// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core traits for storage backends.
//!
//! Every backend provides a [`SequentialCursor`] for reading and a
//! [`RecordingSink`] for writing. The record reader and writer only talk to
//! these traits.

use std::path::Path;

use crate::core::Result;

use super::filter::StorageFilter;
use super::metadata::{RawEntry, RecordingStats, StorageKind, TopicMetadata};

/// Forward-only cursor over the serialized messages of a recording.
///
/// Messages come out in timestamp order. There is no seek; a fresh cursor
/// must be opened to read again from the start.
///
/// # Example
///
/// ```no_run
/// use bagrecord::io::traits::SequentialCursor;
///
/// fn drain(cursor: &mut dyn SequentialCursor) -> bagrecord::Result<usize> {
///     let mut count = 0;
///     while cursor.has_next()? {
///         cursor.read_next()?;
///         count += 1;
///     }
///     Ok(count)
/// }
/// ```
pub trait SequentialCursor {
    /// Backend of this cursor.
    fn storage_kind(&self) -> StorageKind;

    /// Path the recording was opened from.
    fn path(&self) -> &Path;

    /// Check if another message passes the current filter.
    fn has_next(&mut self) -> Result<bool>;

    /// Read the next message that passes the current filter.
    ///
    /// Fails if the cursor is exhausted; call [`has_next`](Self::has_next) first.
    fn read_next(&mut self) -> Result<RawEntry>;

    /// Topics recorded in the file, in backend order.
    fn topics_and_types(&self) -> Result<Vec<TopicMetadata>>;

    /// Restrict subsequent reads to the filter's topics.
    fn set_filter(&mut self, filter: StorageFilter) -> Result<()>;

    /// Remove any filter.
    fn reset_filter(&mut self) -> Result<()> {
        self.set_filter(StorageFilter::default())
    }

    /// Message counts and time range of the whole recording, ignoring filters.
    fn statistics(&self) -> Result<RecordingStats>;
}

/// Destination for serialized messages.
pub trait RecordingSink {
    /// Backend of this sink.
    fn storage_kind(&self) -> StorageKind;

    /// Path being written.
    fn path(&self) -> &Path;

    /// Declare a topic. Writing to an undeclared topic fails.
    fn create_topic(&mut self, topic: &TopicMetadata) -> Result<()>;

    /// Append one serialized message.
    fn write(&mut self, topic: &str, data: &[u8], time_ns: i64) -> Result<()>;

    /// Flush and close. Further writes fail.
    fn finish(&mut self) -> Result<()>;

    /// Get the number of messages written so far.
    fn message_count(&self) -> u64;

    /// Get the number of topics declared so far.
    fn topic_count(&self) -> usize;
}
