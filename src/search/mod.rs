//! Suffix-array-backed longest-match search over the source, generalized from
//! `qbsdiff`'s bsdiff-control search (`Context::search_next`) to the simpler
//! `COPY`/`INSERT` instruction model this engine uses: there is no delta/"add"
//! step, so it only needs the longest exact match at each target cursor, not the
//! mismatch-tolerant fuzzy matching bsdiff uses to extend a match past small
//! differences.

use suffix_array::SuffixArray;

/// Index over the source bytes supporting "longest match starting at any source
/// offset, matching the bytes at a given target cursor".
pub struct Search<'s> {
    sa: SuffixArray<'s>,
}

impl<'s> Search<'s> {
    /// Build the suffix array over `source`. Panics only via the underlying
    /// crate's own `MAX_LENGTH` bound, checked by the caller before construction.
    pub fn new(source: &'s [u8]) -> Self {
        Search {
            sa: SuffixArray::new(source),
        }
    }

    /// Maximum source length the underlying suffix array can address.
    pub fn max_length() -> usize {
        suffix_array::MAX_LENGTH
    }

    /// Find the longest match for `pattern` in the source.
    ///
    /// Returns `(source_offset, length)`. `search_lcp` resolves ties among
    /// equal-length matches to a single, deterministic source offset, which this
    /// crate relies on to always prefer the smallest matching source offset.
    pub fn longest_match(&self, pattern: &[u8]) -> (usize, usize) {
        if pattern.is_empty() {
            return (0, 0);
        }
        let range = self.sa.search_lcp(pattern);
        let length = range.end.saturating_sub(range.start);
        (range.start, length)
    }
}
