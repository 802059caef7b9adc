//! Shared 24-byte frame header: a 16-byte ASCII tag plus a little-endian `u64` size.
//!
//! Every compressed or differenced buffer this crate produces carries this prefix.
//! The payload-size field means different things per tag (uncompressed size for
//! `compress`/`package` frames, target size for `patch` frames, record count for
//! directory-patch frames) — callers interpret it, this module only frames it.
//!
//! Flipping any single bit of the tag must send `parse_header` down the mismatch
//! branch; a tag is never partially trusted.

use crate::{Buffer, Error, Result};
use byteorder::{ByteOrder, LE};

pub const TAG_LEN: usize = 16;
pub const HEADER_LEN: usize = TAG_LEN + 8;

pub const TAG_COMPRESS: &[u8; TAG_LEN] = b"yatta compress\0\0";
pub const TAG_PATCH: &[u8; TAG_LEN] = b"yatta patch  \0\0\0";
pub const TAG_PACKAGE: &[u8; TAG_LEN] = b"yatta package \0\0";

/// Zero-pad an ASCII tag literal out to [`TAG_LEN`] bytes.
fn pad_tag(tag: &[u8]) -> [u8; TAG_LEN] {
    let mut padded = [0u8; TAG_LEN];
    let n = tag.len().min(TAG_LEN);
    padded[..n].copy_from_slice(&tag[..n]);
    padded
}

/// Write a frame header (tag + size) to the front of `out`.
pub fn write_header(out: &mut Buffer, tag: &[u8], size: u64) {
    out.push_raw(&pad_tag(tag));
    let mut buf = [0u8; 8];
    LE::write_u64(&mut buf, size);
    out.push_raw(&buf);
}

/// Parsed frame header: the tag bytes (zero-padding included) and the size field.
pub struct Header<'a> {
    pub tag: &'a [u8],
    pub size: u64,
    pub payload: &'a [u8],
}

/// Parse a frame header from `data`, requiring the tag to exactly match
/// `expected_tag` (already zero-padded to [`TAG_LEN`]). Fails with
/// [`Error::BadHeader`] on a short buffer or a tag mismatch.
pub fn parse_header<'a>(data: &'a [u8], expected_tag: &[u8; TAG_LEN]) -> Result<Header<'a>> {
    if data.len() < HEADER_LEN {
        return Err(Error::BadHeader(format!(
            "buffer too short for frame header: {} bytes",
            data.len()
        )));
    }
    let tag = &data[..TAG_LEN];
    if tag != expected_tag {
        return Err(Error::BadHeader(format!(
            "tag mismatch: expected {:?}, found {:?}",
            String::from_utf8_lossy(expected_tag),
            String::from_utf8_lossy(tag)
        )));
    }
    let size = LE::read_u64(&data[TAG_LEN..HEADER_LEN]);
    Ok(Header {
        tag,
        size,
        payload: &data[HEADER_LEN..],
    })
}
