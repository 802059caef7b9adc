//! Produces a compressed `COPY`/`INSERT` instruction stream transforming source
//! bytes into target bytes. Generalizes `qbsdiff::Bsdiff`'s suffix-array search from
//! bsdiff's add/copy/seek control format to the simpler two-instruction model of
//! this engine; the inverse is [`crate::Patcher`].

use crate::codec::compress_raw;
use crate::instruction::{encode_copy, encode_insert};
use crate::search::Search;
use crate::wire::{self, TAG_PATCH};
use crate::{Buffer, Error, MemoryRange, Result};

/// Builder for a single diff computation against a fixed source.
///
/// Mirrors `qbsdiff::Bsdiff`'s shape: construction sorts the suffix array once, then
/// `compare` (here, [`Differ::diff`]) can be called against any number of targets.
pub struct Differ<'s> {
    source: &'s [u8],
    search: Search<'s>,
    min_match: usize,
}

impl<'s> Differ<'s> {
    /// Prepare for delta compression and immediately sort the suffix array.
    ///
    /// Fails with [`Error::TooLarge`] if `source` exceeds what the search index can
    /// address.
    pub fn new(source: &'s [u8]) -> Result<Self> {
        if source.len() > Search::max_length() {
            return Err(Error::TooLarge(source.len() as u64));
        }
        Ok(Differ {
            source,
            search: Search::new(source),
            min_match: crate::MIN_MATCH,
        })
    }

    /// Set the minimum match length required to emit a `COPY` instruction rather
    /// than extending a literal run. Clamped to `[4, 32]`.
    pub fn min_match(mut self, min_match: usize) -> Self {
        self.min_match = min_match.clamp(4, 32);
        self
    }

    /// The source bytes this differ was built over.
    pub fn source(&self) -> &'s [u8] {
        self.source
    }

    /// Compute the diff transforming the source into `target`.
    ///
    /// Returns the final framed, compressed patch buffer: a `"yatta patch  "`
    /// header whose size field is `target.len()`, followed by the compressed
    /// instruction payload.
    pub fn diff(&self, target: &[u8]) -> Result<Buffer> {
        let payload = self.build_payload(target);
        let compressed = compress_raw(&payload);

        let mut out = Buffer::new();
        wire::write_header(&mut out, TAG_PATCH, target.len() as u64);
        out.push_raw(&compressed);
        Ok(out)
    }

    fn build_payload(&self, target: &[u8]) -> Vec<u8> {
        let mut payload = Vec::new();
        let mut t = 0usize;
        let mut literal_start: Option<usize> = None;

        while t < target.len() {
            let (offset, length) = self.search.longest_match(&target[t..]);
            if length >= self.min_match {
                if let Some(start) = literal_start.take() {
                    encode_insert(&mut payload, &target[start..t]);
                }
                encode_copy(&mut payload, offset as u64, length as u64);
                t += length;
            } else {
                if literal_start.is_none() {
                    literal_start = Some(t);
                }
                t += 1;
            }
        }
        if let Some(start) = literal_start.take() {
            encode_insert(&mut payload, &target[start..target.len()]);
        }

        payload
    }
}

/// Convenience free function: diff `source` into `target` with default settings.
pub fn diff<'a>(source: impl Into<MemoryRange<'a>>, target: impl Into<MemoryRange<'a>>) -> Result<Buffer> {
    let source = source.into();
    let target = target.into();
    Differ::new(source.as_slice())?.diff(target.as_slice())
}
