use byteorder::{BigEndian, ByteOrder, LittleEndian};
use encoding_rs::SHIFT_JIS;

use crate::errors::ReadError;

type Result<T> = std::result::Result<T, ReadError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Positioned reader over an in-memory stream with a toggleable byte order.
///
/// Multi-byte reads honor the swap flag, which mirrors how the formats flip
/// a whole stream to big-endian rather than individual fields.
pub struct SpanReader<'a> {
    data: &'a [u8],
    position: usize,
    swapped: bool,
    stack: Vec<usize>,
}

impl<'a> SpanReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        SpanReader {
            data,
            position: 0,
            swapped: false,
            stack: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn tell(&self) -> usize {
        self.position
    }

    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    pub fn skip(&mut self, amount: i64) -> Result<()> {
        let target = self.position as i64 + amount;
        if target < 0 {
            return Err(ReadError::NegativeSeek);
        }
        self.position = target as usize;
        Ok(())
    }

    pub fn push(&mut self) {
        self.stack.push(self.position);
    }

    pub fn pop(&mut self) {
        if let Some(position) = self.stack.pop() {
            self.position = position;
        }
    }

    pub fn set_swap_endian(&mut self, swapped: bool) {
        self.swapped = swapped;
    }

    pub fn swapped_endian(&self) -> bool {
        self.swapped
    }

    pub fn endian(&self) -> Endian {
        if self.swapped {
            Endian::Big
        } else {
            Endian::Little
        }
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    pub fn remaining_slice(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self
            .position
            .checked_add(count)
            .filter(|end| *end <= self.data.len())
            .ok_or(ReadError::OutOfBounds {
                position: self.position,
                count,
                size: self.data.len(),
            })?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(match self.endian() {
            Endian::Little => LittleEndian::read_u16(bytes),
            Endian::Big => BigEndian::read_u16(bytes),
        })
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(match self.endian() {
            Endian::Little => LittleEndian::read_u32(bytes),
            Endian::Big => BigEndian::read_u32(bytes),
        })
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let bytes = self.take(8)?;
        Ok(match self.endian() {
            Endian::Little => LittleEndian::read_u64(bytes),
            Endian::Big => BigEndian::read_u64(bytes),
        })
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let bytes = self.take(4)?;
        Ok(match self.endian() {
            Endian::Little => LittleEndian::read_f32(bytes),
            Endian::Big => BigEndian::read_f32(bytes),
        })
    }

    pub fn read_exact(&mut self, buffer: &mut [u8]) -> Result<()> {
        let bytes = self.take(buffer.len())?;
        buffer.copy_from_slice(bytes);
        Ok(())
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        Ok(self.take(count)?.to_vec())
    }

    /// Reads a NUL-terminated Shift-JIS string out of a fixed-width field,
    /// consuming the entire field.
    pub fn read_cstr(&mut self, width: usize) -> Result<String> {
        let bytes = self.take(width)?;
        let terminated = match bytes.iter().position(|byte| *byte == 0) {
            Some(end) => &bytes[..end],
            None => bytes,
        };
        let (result, _, errors) = SHIFT_JIS.decode(terminated);
        if errors {
            return Err(ReadError::BadText);
        }
        Ok(result.into())
    }
}
