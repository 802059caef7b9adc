//! Serializes an entire [`DirectoryModel`] into a single compressed package, and
//! back.

use byteorder::{ByteOrder, LE};

use crate::codec::{compress_raw, decompress_raw};
use crate::progress::ProgressSink;
use crate::wire::{self, TAG_PACKAGE};
use crate::{Buffer, Error, Result};

use super::model::{DirectoryModel, VirtualFile};

/// Serialize every file in `model` into a single `"yatta package "`-tagged,
/// compressed buffer.
///
/// Record layout, concatenated with no separators: `u64` path length, path bytes,
/// `u64` data length, data bytes. The header's size field is the uncompressed
/// payload length.
pub fn pack_directory(model: &DirectoryModel, sink: &mut dyn ProgressSink) -> Result<Buffer> {
    let mut payload = Vec::new();
    for file in model.files() {
        write_record(&mut payload, file.path(), file.data().as_slice());
        sink.on_pack_file(file.path(), file.data().len());
    }

    let compressed = compress_raw(&payload);
    let mut out = Buffer::new();
    wire::write_header(&mut out, TAG_PACKAGE, payload.len() as u64);
    out.push_raw(&compressed);
    Ok(out)
}

/// Parse a package buffer produced by [`pack_directory`] back into a model.
///
/// Fails with [`Error::BadHeader`] on tag mismatch, [`Error::Truncated`] if the
/// decompressed payload ends mid-record or short of the header's promised size,
/// and [`Error::BadPath`] if any stored path violates model invariants.
pub fn unpack_directory(package: &[u8]) -> Result<DirectoryModel> {
    let header = wire::parse_header(package, TAG_PACKAGE)?;
    let payload = decompress_raw(header.payload)?;
    if payload.len() as u64 != header.size {
        return Err(Error::Truncated(format!(
            "package payload is {} bytes, header promised {}",
            payload.len(),
            header.size
        )));
    }

    let mut model = DirectoryModel::new();
    let mut pos = 0usize;
    while pos < payload.len() {
        let (path, data, next) = read_record(&payload, pos)?;
        model.insert(VirtualFile::new(path, Buffer::from_vec(data))?)?;
        pos = next;
    }
    Ok(model)
}

fn write_record(out: &mut Vec<u8>, path: &str, data: &[u8]) {
    let mut len_buf = [0u8; 8];
    LE::write_u64(&mut len_buf, path.len() as u64);
    out.extend_from_slice(&len_buf);
    out.extend_from_slice(path.as_bytes());

    LE::write_u64(&mut len_buf, data.len() as u64);
    out.extend_from_slice(&len_buf);
    out.extend_from_slice(data);
}

fn read_record(payload: &[u8], pos: usize) -> Result<(String, Vec<u8>, usize)> {
    let path_len = read_u64(payload, pos)? as usize;
    let path_start = pos + 8;
    let path_end = checked_end(path_start, path_len, payload.len())?;
    let path = String::from_utf8(payload[path_start..path_end].to_vec())
        .map_err(|e| Error::Truncated(format!("invalid utf-8 in package path: {e}")))?;

    let data_len = read_u64(payload, path_end)? as usize;
    let data_start = path_end + 8;
    let data_end = checked_end(data_start, data_len, payload.len())?;
    let data = payload[data_start..data_end].to_vec();

    Ok((path, data, data_end))
}

fn read_u64(payload: &[u8], pos: usize) -> Result<u64> {
    let end = checked_end(pos, 8, payload.len())?;
    Ok(LE::read_u64(&payload[pos..end]))
}

fn checked_end(start: usize, len: usize, total: usize) -> Result<usize> {
    let end = start.checked_add(len).ok_or_else(|| {
        Error::Truncated("package record length overflows usize".to_string())
    })?;
    if end > total {
        return Err(Error::Truncated(format!(
            "package payload ended mid-record (needed {len} more bytes at offset {start})"
        )));
    }
    Ok(end)
}
