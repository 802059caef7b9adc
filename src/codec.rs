//! Stateless compress/decompress over byte spans, framed with a self-describing
//! header.

use crate::wire::{self, TAG_COMPRESS};
use crate::{Buffer, Error, MemoryRange, Result};

/// Raw LZ4 block compression, self-describing its own uncompressed length so
/// callers that already frame the result with their own header (the [`crate::diff`]
/// and [`crate::patch`] modules) don't need to track a second size out of band.
pub(crate) fn compress_raw(data: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(data)
}

/// Inverse of [`compress_raw`].
pub(crate) fn decompress_raw(data: &[u8]) -> Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(data).map_err(|e| Error::DecompressFailure(e.to_string()))
}

/// Compress `data`, returning a buffer framed with the `"yatta compress"` header.
///
/// The header's size field is the *uncompressed* size of `data`, needed by
/// [`decompress`] to sanity-check its output and reported by callers that want to
/// pre-allocate before reading.
pub fn compress<'a>(data: impl Into<MemoryRange<'a>>) -> Result<Buffer> {
    let range = data.into();
    let payload = compress_raw(range.as_slice());

    let mut out = Buffer::new();
    wire::write_header(&mut out, TAG_COMPRESS, range.len() as u64);
    out.push_raw(&payload);
    Ok(out)
}

/// Decompress a buffer produced by [`compress`].
///
/// Fails with [`Error::BadHeader`] if the tag doesn't match or the buffer is
/// shorter than the header, and with [`Error::DecompressFailure`] if the decoder
/// rejects the payload or produces a size other than the header promised.
pub fn decompress<'a>(data: impl Into<MemoryRange<'a>>) -> Result<Buffer> {
    let range = data.into();
    let header = wire::parse_header(range.as_slice(), TAG_COMPRESS)?;

    let decompressed = decompress_raw(header.payload)?;
    if decompressed.len() as u64 != header.size {
        return Err(Error::DecompressFailure(format!(
            "expected {} decompressed bytes, got {}",
            header.size,
            decompressed.len()
        )));
    }

    Ok(Buffer::from_vec(decompressed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compress_decompress_roundtrip() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(10);
        let compressed = compress(data.as_slice()).unwrap();
        let decompressed = decompress(compressed.as_slice()).unwrap();
        assert_eq!(decompressed.as_slice(), data.as_slice());
    }

    #[test]
    fn compress_empty_input() {
        let compressed = compress(&[][..]).unwrap();
        let decompressed = decompress(compressed.as_slice()).unwrap();
        assert!(decompressed.is_empty());
    }

    #[test]
    fn bad_tag_fails_to_decompress() {
        let mut compressed = compress(b"hello".as_slice()).unwrap();
        compressed.as_mut_slice()[0] ^= 0xff;
        assert!(matches!(
            decompress(compressed.as_slice()),
            Err(Error::BadHeader(_))
        ));
    }

    #[test]
    fn truncated_buffer_fails_header_parse() {
        assert!(matches!(
            decompress(&b"short"[..]),
            Err(Error::BadHeader(_))
        ));
    }

    #[quickcheck_macros::quickcheck]
    fn roundtrip_holds_for_any_nonempty_input(data: Vec<u8>) -> bool {
        if data.is_empty() {
            return true;
        }
        let compressed = compress(data.as_slice()).unwrap();
        let decompressed = decompress(compressed.as_slice()).unwrap();
        decompressed.as_slice() == data.as_slice()
    }
}
