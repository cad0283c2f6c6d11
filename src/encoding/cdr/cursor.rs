// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CDR cursor for reading CDR-encoded data with proper alignment.

use crate::core::{BagError, Result};

/// Size of the CDR encapsulation header (4 bytes).
pub const CDR_HEADER_SIZE: usize = 4;

/// CDR cursor that tracks position and origin for proper alignment.
///
/// Alignment is calculated as `(offset - origin) % size` where `origin` is
/// the first byte after the encapsulation header. Nested structs do not move
/// the origin (XCDR1, as emitted by ROS 2 middlewares).
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use bagrecord::encoding::cdr::cursor::CdrCursor;
///
/// let data = vec![0x00, 0x01, 0x00, 0x00, 0x2A, 0x00, 0x00, 0x00]; // CDR header + value
/// let mut cursor = CdrCursor::new(&data)?;
/// assert_eq!(cursor.read_u32()?, 42);
/// # Ok(())
/// # }
/// ```
pub struct CdrCursor<'a> {
    /// The data buffer (includes CDR header)
    data: &'a [u8],
    /// Current read position
    offset: usize,
    /// Origin offset for alignment calculation
    origin: usize,
    /// Whether the data uses little endian encoding
    little_endian: bool,
}

impl<'a> CdrCursor<'a> {
    /// Create a new CDR cursor from CDR-encoded data.
    ///
    /// # CDR Header Format
    ///
    /// The CDR header is 4 bytes:
    /// - Byte 0: Unused (always 0)
    /// - Byte 1: Encapsulation kind (0 = CDR_BE, 1 = CDR_LE)
    /// - Bytes 2-3: Options (unused)
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if data.len() < CDR_HEADER_SIZE {
            return Err(BagError::buffer_too_short(CDR_HEADER_SIZE, data.len(), 0));
        }

        Ok(Self {
            data,
            offset: CDR_HEADER_SIZE,
            origin: CDR_HEADER_SIZE,
            little_endian: data[1] & 0x01 == 1,
        })
    }

    /// Whether the payload is little endian.
    #[inline]
    pub fn is_little_endian(&self) -> bool {
        self.little_endian
    }

    /// Get the current position relative to the data start.
    #[inline]
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Get the remaining bytes available to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// Check if at end of buffer.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Total buffer length, header included.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer holds nothing past the header.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.len() <= CDR_HEADER_SIZE
    }

    /// Align to the specified boundary, relative to the origin.
    pub fn align(&mut self, size: usize) -> Result<()> {
        let alignment = (self.offset - self.origin) % size;
        if alignment > 0 {
            let padding = size - alignment;
            if self.offset + padding > self.data.len() {
                return Err(BagError::buffer_too_short(
                    padding,
                    self.remaining(),
                    self.offset as u64,
                ));
            }
            self.offset += padding;
        }
        Ok(())
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        if self.offset + N > self.data.len() {
            return Err(BagError::buffer_too_short(
                N,
                self.remaining(),
                self.offset as u64,
            ));
        }
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.data[self.offset..self.offset + N]);
        self.offset += N;
        Ok(bytes)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    /// Read a signed byte.
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Read a u16 value.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.align(2)?;
        let bytes = self.take::<2>()?;
        Ok(if self.little_endian {
            u16::from_le_bytes(bytes)
        } else {
            u16::from_be_bytes(bytes)
        })
    }

    /// Read an i16 value.
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    /// Read a u32 value.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.align(4)?;
        let bytes = self.take::<4>()?;
        Ok(if self.little_endian {
            u32::from_le_bytes(bytes)
        } else {
            u32::from_be_bytes(bytes)
        })
    }

    /// Read an i32 value.
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    /// Read a u64 value.
    pub fn read_u64(&mut self) -> Result<u64> {
        self.align(8)?;
        let bytes = self.take::<8>()?;
        Ok(if self.little_endian {
            u64::from_le_bytes(bytes)
        } else {
            u64::from_be_bytes(bytes)
        })
    }

    /// Read an i64 value.
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(self.read_u64()? as i64)
    }

    /// Read an f32 value.
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Read an f64 value.
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Read a byte slice.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(BagError::buffer_too_short(
                count,
                self.remaining(),
                self.offset as u64,
            ));
        }
        let start = self.offset;
        self.offset += count;
        Ok(&self.data[start..self.offset])
    }

    /// Skip bytes.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.read_bytes(count).map(|_| ())
    }

    /// Peek at the next byte without advancing the position.
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_new() {
        let data = vec![0x00, 0x01, 0x00, 0x00]; // CDR header (little-endian)
        let cursor = CdrCursor::new(&data).unwrap();
        assert_eq!(cursor.position(), 4);
        assert_eq!(cursor.remaining(), 0);
        assert!(cursor.is_at_end());
        assert!(cursor.is_little_endian());
    }

    #[test]
    fn test_cursor_too_short() {
        let data = vec![0x00, 0x01]; // Only 2 bytes
        let result = CdrCursor::new(&data);
        assert!(matches!(result, Err(BagError::BufferTooShort { .. })));
    }

    #[test]
    fn test_read_u8() {
        let data = vec![0x00, 0x01, 0x00, 0x00, 0x42, 0xFF];
        let mut cursor = CdrCursor::new(&data).unwrap();
        assert_eq!(cursor.read_u8().unwrap(), 0x42);
        assert_eq!(cursor.peek(), Some(0xFF));
        assert_eq!(cursor.read_u8().unwrap(), 0xFF);
        assert_eq!(cursor.peek(), None);
    }

    #[test]
    fn test_read_u64_aligned_to_payload_start() {
        let mut data = vec![0x00, 0x01, 0x00, 0x00];
        // (4 - 4) % 8 = 0, no padding needed
        data.extend_from_slice(&0x123456789ABCDEF0u64.to_le_bytes());
        let mut cursor = CdrCursor::new(&data).unwrap();
        assert_eq!(cursor.read_u64().unwrap(), 0x123456789ABCDEF0);
    }

    #[test]
    fn test_alignment_padding() {
        let mut data = vec![0x00, 0x01, 0x00, 0x00];
        data.push(7); // u8
        data.extend_from_slice(&[0, 0, 0]); // padding to 4
        data.extend_from_slice(&99u32.to_le_bytes());
        let mut cursor = CdrCursor::new(&data).unwrap();
        assert_eq!(cursor.read_u8().unwrap(), 7);
        assert_eq!(cursor.read_u32().unwrap(), 99);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_big_endian() {
        let mut data = vec![0x00, 0x00, 0x00, 0x00];
        data.extend_from_slice(&0x0102u16.to_be_bytes());
        data.extend_from_slice(&[0, 0]);
        data.extend_from_slice(&1.5f32.to_be_bytes());
        let mut cursor = CdrCursor::new(&data).unwrap();
        assert!(!cursor.is_little_endian());
        assert_eq!(cursor.read_u16().unwrap(), 0x0102);
        assert_eq!(cursor.read_f32().unwrap(), 1.5);
    }

    #[test]
    fn test_read_past_end() {
        let data = vec![0x00, 0x01, 0x00, 0x00, 0x01, 0x02];
        let mut cursor = CdrCursor::new(&data).unwrap();
        let err = cursor.read_u32().unwrap_err();
        assert!(matches!(
            err,
            BagError::BufferTooShort {
                requested: 4,
                available: 2,
                cursor_pos: 4
            }
        ));
    }

    #[test]
    fn test_read_bytes_and_skip() {
        let data = vec![0x00, 0x01, 0x00, 0x00, 1, 2, 3, 4];
        let mut cursor = CdrCursor::new(&data).unwrap();
        cursor.skip(1).unwrap();
        assert_eq!(cursor.read_bytes(2).unwrap(), &[2, 3]);
        assert!(cursor.read_bytes(2).is_err());
        assert_eq!(cursor.remaining(), 1);
    }
}
