//! Consumes an instruction stream plus the source bytes to reconstruct the target.
//! The inverse of [`crate::Differ`].

use crate::codec::decompress_raw;
use crate::instruction::{Instruction, Reader};
use crate::wire::{self, TAG_PATCH};
use crate::{Buffer, Error, MemoryRange, Result};

/// Parsed patch, ready to be applied against a source.
pub struct Patcher {
    target_size: u64,
    payload: Vec<u8>,
}

impl Patcher {
    /// Parse the patch buffer's header and decompress its instruction payload.
    ///
    /// Fails with [`Error::BadHeader`] on tag mismatch or a too-short buffer.
    pub fn new(patch: &[u8]) -> Result<Self> {
        let header = wire::parse_header(patch, TAG_PATCH)?;
        let payload = decompress_raw(header.payload)?;
        Ok(Patcher {
            target_size: header.size,
            payload,
        })
    }

    /// The target size promised by the patch header, useful for preallocating the
    /// output buffer.
    pub fn hint_target_size(&self) -> u64 {
        self.target_size
    }

    /// Apply this patch to `source`, reconstructing the target.
    ///
    /// Fails with [`Error::BadInstruction`] if any `COPY` references
    /// out-of-range source bytes or either instruction would overflow the target,
    /// and with [`Error::Truncated`] if fewer than `target_size` bytes were
    /// produced by the end of the instruction stream.
    pub fn apply(&self, source: &[u8]) -> Result<Buffer> {
        let target_size = self.target_size as usize;
        let mut target = Vec::with_capacity(target_size);
        let mut reader = Reader::new(&self.payload);

        while let Some(instruction) = reader.next()? {
            match instruction {
                Instruction::Copy {
                    source_offset,
                    length,
                } => {
                    let s = source_offset as usize;
                    let l = length as usize;
                    let end = s.checked_add(l).ok_or_else(|| {
                        Error::BadInstruction(format!(
                            "COPY({s}, {l}) overflows source offset arithmetic"
                        ))
                    })?;
                    if end > source.len() {
                        return Err(Error::BadInstruction(format!(
                            "COPY({s}, {l}) reads past source end ({})",
                            source.len()
                        )));
                    }
                    if target.len() + l > target_size {
                        return Err(Error::BadInstruction(format!(
                            "COPY({s}, {l}) would overflow target size {target_size}"
                        )));
                    }
                    target.extend_from_slice(&source[s..end]);
                }
                Instruction::Insert { bytes } => {
                    if target.len() + bytes.len() > target_size {
                        return Err(Error::BadInstruction(format!(
                            "INSERT({}) would overflow target size {target_size}",
                            bytes.len()
                        )));
                    }
                    target.extend_from_slice(bytes);
                }
            }
        }

        if target.len() != target_size {
            return Err(Error::Truncated(format!(
                "instruction stream produced {} bytes, expected {target_size}",
                target.len()
            )));
        }

        Ok(Buffer::from_vec(target))
    }
}

/// Convenience free function: apply `diff` to `source` with default settings.
pub fn patch<'a>(source: impl Into<MemoryRange<'a>>, diff: impl Into<MemoryRange<'a>>) -> Result<Buffer> {
    let source = source.into();
    let diff = diff.into();
    Patcher::new(diff.as_slice())?.apply(source.as_slice())
}
