//! Encode/decode for the `COPY`/`INSERT` instruction stream that is the
//! uncompressed payload of a patch frame.
//!
//! Instructions are concatenated with no separators and no end marker; the end of
//! the payload is the end of the stream. A single-byte tag distinguishes `COPY`
//! (`b'C'`) from `INSERT` (`b'I'`).

use crate::{Error, Result};
use byteorder::{ByteOrder, LE};

const TAG_COPY: u8 = b'C';
const TAG_INSERT: u8 = b'I';

/// A single instruction in the diff payload, borrowing its literal bytes (for
/// `Insert`) from the payload it was decoded from.
#[derive(Debug, PartialEq, Eq)]
pub enum Instruction<'a> {
    Copy { source_offset: u64, length: u64 },
    Insert { bytes: &'a [u8] },
}

/// Append a `COPY(source_offset, length)` instruction.
pub fn encode_copy(out: &mut Vec<u8>, source_offset: u64, length: u64) {
    out.push(TAG_COPY);
    let mut b = [0u8; 16];
    LE::write_u64(&mut b[0..8], source_offset);
    LE::write_u64(&mut b[8..16], length);
    out.extend_from_slice(&b);
}

/// Append an `INSERT(length, bytes)` instruction.
pub fn encode_insert(out: &mut Vec<u8>, bytes: &[u8]) {
    out.push(TAG_INSERT);
    let mut len_buf = [0u8; 8];
    LE::write_u64(&mut len_buf, bytes.len() as u64);
    out.extend_from_slice(&len_buf);
    out.extend_from_slice(bytes);
}

/// Forward cursor over an instruction payload.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    /// True if the payload is fully consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Decode the next instruction, or `None` at end of payload.
    ///
    /// Fails with [`Error::Truncated`] if the payload ends mid-instruction.
    pub fn next(&mut self) -> Result<Option<Instruction<'a>>> {
        if self.is_empty() {
            return Ok(None);
        }
        let tag = self.data[self.pos];
        self.pos += 1;
        match tag {
            TAG_COPY => {
                let fields = self.take(16)?;
                let source_offset = LE::read_u64(&fields[0..8]);
                let length = LE::read_u64(&fields[8..16]);
                Ok(Some(Instruction::Copy {
                    source_offset,
                    length,
                }))
            }
            TAG_INSERT => {
                let len_bytes = self.take(8)?;
                let length = LE::read_u64(len_bytes) as usize;
                let bytes = self.take(length)?;
                Ok(Some(Instruction::Insert { bytes }))
            }
            other => Err(Error::Truncated(format!(
                "unknown instruction tag {other:#04x}"
            ))),
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.data.len() {
            return Err(Error::Truncated(format!(
                "instruction payload ended mid-record (needed {n} more bytes at offset {})",
                self.pos
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }
}
