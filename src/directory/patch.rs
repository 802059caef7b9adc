//! Computes and applies a patch between two directory models: per-path `update`,
//! `new` and `delete` records, each carrying a per-file delta and hash guard.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LE};

use crate::codec::{compress_raw, decompress_raw};
use crate::progress::ProgressSink;
use crate::wire::{self, TAG_PATCH};
use crate::{Buffer, Error, NullSink, Result};

use super::model::{DirectoryModel, VirtualFile};

const OP_UPDATE: u8 = b'U';
const OP_NEW: u8 = b'N';
const OP_DELETE: u8 = b'D';

/// Compute a patch transforming `old` into `new`.
///
/// For every path present in both models whose content hash differs, emits an
/// `U` (update) record carrying a per-file delta from the old content to the new.
/// For every path only in `new`, emits an `N` (new) record carrying a delta from
/// empty. For every path only in `old`, emits a `D` (delete) record. Paths present
/// in both models with identical hashes produce no record.
///
/// Record layout: `u64` path length, path bytes, `u8` op, `u64` old_hash, `u64`
/// new_hash, `u64` delta length, delta bytes. The whole record sequence is
/// compressed and wrapped in a `"yatta patch  "` header whose size field is the
/// record count.
///
/// `sink.on_patch_record` is called once per emitted record, with the path and op
/// character (`'U'`/`'N'`/`'D'`).
pub fn diff_directories(
    old: &DirectoryModel,
    new: &DirectoryModel,
    sink: &mut dyn ProgressSink,
) -> Result<Buffer> {
    let new_paths: HashSet<&str> = new.files().map(|f| f.path()).collect();
    let mut payload = Vec::new();
    let mut record_count = 0u64;

    for file in new.files() {
        match old.get(file.path()) {
            Some(old_file) => {
                let old_hash = old_file.hash();
                let new_hash = file.hash();
                if old_hash != new_hash {
                    let delta = crate::diff(old_file.data().as_slice(), file.data().as_slice())?;
                    write_record(
                        &mut payload,
                        file.path(),
                        OP_UPDATE,
                        old_hash,
                        new_hash,
                        delta.as_slice(),
                    );
                    sink.on_patch_record(file.path(), OP_UPDATE as char);
                    record_count += 1;
                }
            }
            None => {
                let new_hash = file.hash();
                let delta = crate::diff(&b""[..], file.data().as_slice())?;
                write_record(&mut payload, file.path(), OP_NEW, 0, new_hash, delta.as_slice());
                sink.on_patch_record(file.path(), OP_NEW as char);
                record_count += 1;
            }
        }
    }

    for file in old.files() {
        if !new_paths.contains(file.path()) {
            write_record(&mut payload, file.path(), OP_DELETE, file.hash(), 0, &[]);
            sink.on_patch_record(file.path(), OP_DELETE as char);
            record_count += 1;
        }
    }

    let compressed = compress_raw(&payload);
    let mut out = Buffer::new();
    wire::write_header(&mut out, TAG_PATCH, record_count);
    out.push_raw(&compressed);
    Ok(out)
}

/// Apply a directory patch to `model`, producing the updated model in memory.
///
/// Phase 1 only: no filesystem access. For each `U` record whose path is already
/// at `new_hash`, the record is a no-op; otherwise the path must be present in
/// `model` with a hash equal to the record's `old_hash` (otherwise
/// [`Error::MissingFile`] or [`Error::VersionMismatch`]), and the per-file delta is
/// applied and the result checked against `new_hash` ([`Error::HashMismatch`] on
/// mismatch). For each `N` record whose path is already present with hash equal
/// to `new_hash`, the record is a no-op; otherwise the delta is applied from an
/// empty source and inserted. For each `D` record whose path is present with hash
/// equal to `old_hash`, the file is removed; otherwise it is left alone.
///
/// Every record type is therefore safe to re-apply: running the same patch twice
/// against a model already brought up to date is a no-op, not an error.
///
/// A failure aborts before any change is reflected onto the returned model: the
/// model a caller already has in hand is never left partially patched.
///
/// `sink.on_patch_record` is called once per record read from the patch, before it
/// is staged, with the path and op character (`'U'`/`'N'`/`'D'`).
pub fn apply_directory_patch(
    model: &DirectoryModel,
    patch: &[u8],
    sink: &mut dyn ProgressSink,
) -> Result<DirectoryModel> {
    let header = wire::parse_header(patch, TAG_PATCH)?;
    let record_count = header.size;
    let payload = decompress_raw(header.payload)?;

    let mut updates = Vec::new();
    let mut inserts = Vec::new();
    let mut deletes = Vec::new();

    let mut pos = 0usize;
    let mut seen = 0u64;
    while pos < payload.len() {
        let (path, op, old_hash, new_hash, delta, next) = read_record(&payload, pos)?;
        seen += 1;
        sink.on_patch_record(&path, op as char);

        match op {
            OP_UPDATE => {
                let current = model.get(&path).ok_or_else(|| Error::MissingFile(path.clone()))?;
                let current_hash = current.hash();
                if current_hash == new_hash {
                    // already at the target version: applying twice is a no-op.
                } else if current_hash != old_hash {
                    return Err(Error::VersionMismatch {
                        path,
                        expected: old_hash,
                        found: current_hash,
                    });
                } else {
                    let patched = crate::patch(current.data().as_slice(), delta.as_slice())?;
                    if crate::MemoryRange::from(patched.as_slice()).hash() != new_hash {
                        return Err(Error::HashMismatch { path });
                    }
                    updates.push((path, patched));
                }
            }
            OP_NEW => {
                let existing = model.get(&path);
                let already_current = existing.map(|f| f.hash() == new_hash).unwrap_or(false);
                if !already_current {
                    let patched = crate::patch(&b""[..], delta.as_slice())?;
                    if crate::MemoryRange::from(patched.as_slice()).hash() != new_hash {
                        return Err(Error::HashMismatch { path });
                    }
                    if existing.is_some() {
                        // path collides with a file the model already has at a
                        // different hash: treat like an update, not an insert.
                        updates.push((path, patched));
                    } else {
                        inserts.push((path, patched));
                    }
                }
            }
            OP_DELETE => {
                if let Some(current) = model.get(&path) {
                    if current.hash() == old_hash {
                        deletes.push(path);
                    }
                }
            }
            other => {
                return Err(Error::Truncated(format!("unknown directory patch op {other:#04x}")))
            }
        }

        pos = next;
    }

    if seen != record_count {
        return Err(Error::Truncated(format!(
            "directory patch promised {record_count} records, payload held {seen}"
        )));
    }

    let mut result = model.clone();
    apply_staged(&mut result, updates, inserts, deletes)?;
    Ok(result)
}

fn apply_staged(
    model: &mut DirectoryModel,
    updates: Vec<(String, Buffer)>,
    inserts: Vec<(String, Buffer)>,
    deletes: Vec<String>,
) -> Result<()> {
    let mut rebuilt = DirectoryModel::new();
    for file in model.files() {
        if deletes.contains(&file.path().to_string()) {
            continue;
        }
        if let Some((_, data)) = updates.iter().find(|(p, _)| p == file.path()) {
            rebuilt.insert(VirtualFile::new(file.path(), data.clone())?)?;
        } else {
            rebuilt.insert(file.clone())?;
        }
    }
    for (path, data) in inserts {
        rebuilt.insert(VirtualFile::new(path, data)?)?;
    }
    *model = rebuilt;
    Ok(())
}

/// Bound to a filesystem root, applies a directory patch in two phases: the
/// in-memory computation done by [`apply_directory_patch`], then reflecting the
/// changed set to disk by diffing the old model against the new one.
pub struct DirectoryPatcher {
    root: PathBuf,
}

impl DirectoryPatcher {
    pub fn new(root: impl AsRef<Path>) -> Self {
        DirectoryPatcher {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Compute the new model, then write every changed or added file and remove
    /// every deleted one. If phase 1 fails, no disk write happens at all.
    pub fn apply(&self, model: &DirectoryModel, patch: &[u8]) -> Result<DirectoryModel> {
        self.apply_with_sink(model, patch, &mut NullSink)
    }

    pub fn apply_with_sink(
        &self,
        model: &DirectoryModel,
        patch: &[u8],
        sink: &mut dyn ProgressSink,
    ) -> Result<DirectoryModel> {
        let new_model = apply_directory_patch(model, patch, sink)?;

        for file in new_model.files() {
            let changed = match model.get(file.path()) {
                Some(old_file) => old_file.hash() != file.hash(),
                None => true,
            };
            if changed {
                VirtualFile::new(file.path(), file.data().clone())?
                    .write_under(&self.root, sink)?;
            }
        }
        for old_file in model.files() {
            if new_model.get(old_file.path()).is_none() {
                old_file.remove_under(&self.root)?;
            }
        }

        Ok(new_model)
    }
}

impl VirtualFile {
    fn write_under(&self, root: &Path, sink: &mut dyn ProgressSink) -> Result<()> {
        let mut single = DirectoryModel::new();
        single.insert(self.clone())?;
        single.write(root, sink)
    }

    fn remove_under(&self, root: &Path) -> Result<()> {
        let mut absolute = root.to_path_buf();
        for segment in self.path().split('/') {
            absolute.push(segment);
        }
        match std::fs::remove_file(&absolute) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::IoFailure(e)),
        }
    }
}

fn write_record(
    out: &mut Vec<u8>,
    path: &str,
    op: u8,
    old_hash: u64,
    new_hash: u64,
    delta: &[u8],
) {
    let mut b8 = [0u8; 8];
    LE::write_u64(&mut b8, path.len() as u64);
    out.extend_from_slice(&b8);
    out.extend_from_slice(path.as_bytes());

    out.push(op);

    LE::write_u64(&mut b8, old_hash);
    out.extend_from_slice(&b8);
    LE::write_u64(&mut b8, new_hash);
    out.extend_from_slice(&b8);

    LE::write_u64(&mut b8, delta.len() as u64);
    out.extend_from_slice(&b8);
    out.extend_from_slice(delta);
}

#[allow(clippy::type_complexity)]
fn read_record(payload: &[u8], pos: usize) -> Result<(String, u8, u64, u64, Vec<u8>, usize)> {
    let path_len = read_u64(payload, pos)? as usize;
    let path_start = pos + 8;
    let path_end = checked_end(path_start, path_len, payload.len())?;
    let path = String::from_utf8(payload[path_start..path_end].to_vec())
        .map_err(|e| Error::Truncated(format!("invalid utf-8 in patch record path: {e}")))?;

    let op_pos = path_end;
    if op_pos >= payload.len() {
        return Err(Error::Truncated(
            "directory patch payload ended before record op byte".to_string(),
        ));
    }
    let op = payload[op_pos];

    let old_hash = read_u64(payload, op_pos + 1)?;
    let new_hash = read_u64(payload, op_pos + 9)?;
    let delta_len = read_u64(payload, op_pos + 17)? as usize;
    let delta_start = op_pos + 25;
    let delta_end = checked_end(delta_start, delta_len, payload.len())?;
    let delta = payload[delta_start..delta_end].to_vec();

    Ok((path, op, old_hash, new_hash, delta, delta_end))
}

fn read_u64(payload: &[u8], pos: usize) -> Result<u64> {
    let end = checked_end(pos, 8, payload.len())?;
    Ok(LE::read_u64(&payload[pos..end]))
}

fn checked_end(start: usize, len: usize, total: usize) -> Result<usize> {
    let end = start
        .checked_add(len)
        .ok_or_else(|| Error::Truncated("directory patch record length overflows usize".to_string()))?;
    if end > total {
        return Err(Error::Truncated(format!(
            "directory patch payload ended mid-record (needed {len} more bytes at offset {start})"
        )));
    }
    Ok(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn model_with(files: &[(&str, &[u8])]) -> DirectoryModel {
        let mut model = DirectoryModel::new();
        for (path, data) in files {
            model
                .insert(VirtualFile::new(*path, Buffer::from_slice(data)).unwrap())
                .unwrap();
        }
        model
    }

    #[test]
    fn unchanged_file_produces_no_record() {
        let old = model_with(&[("a.txt", b"same")]);
        let new = model_with(&[("a.txt", b"same")]);
        let patch = diff_directories(&old, &new, &mut NullSink).unwrap();
        let header = wire::parse_header(patch.as_slice(), TAG_PATCH).unwrap();
        assert_eq!(header.size, 0);
    }

    #[test]
    fn add_modify_remove_roundtrips() {
        let old = model_with(&[("keep.txt", b"v1"), ("change.txt", b"old"), ("gone.txt", b"bye")]);
        let new = model_with(&[("keep.txt", b"v1"), ("change.txt", b"new"), ("fresh.txt", b"hi")]);

        let patch = diff_directories(&old, &new, &mut NullSink).unwrap();
        let applied = apply_directory_patch(&old, patch.as_slice(), &mut NullSink).unwrap();

        assert_eq!(applied.file_count(), 3);
        assert_eq!(applied.get("keep.txt").unwrap().data().as_slice(), b"v1");
        assert_eq!(applied.get("change.txt").unwrap().data().as_slice(), b"new");
        assert_eq!(applied.get("fresh.txt").unwrap().data().as_slice(), b"hi");
        assert!(applied.get("gone.txt").is_none());
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let old = model_with(&[("a.txt", b"v1")]);
        let new = model_with(&[("a.txt", b"v2")]);
        let patch = diff_directories(&old, &new, &mut NullSink).unwrap();

        let drifted = model_with(&[("a.txt", b"not what the patch expects")]);
        assert!(matches!(
            apply_directory_patch(&drifted, patch.as_slice(), &mut NullSink),
            Err(Error::VersionMismatch { .. })
        ));
    }

    #[test]
    fn missing_file_for_update_is_rejected() {
        let old = model_with(&[("a.txt", b"v1")]);
        let new = model_with(&[("a.txt", b"v2")]);
        let patch = diff_directories(&old, &new, &mut NullSink).unwrap();

        let empty = DirectoryModel::new();
        assert!(matches!(
            apply_directory_patch(&empty, patch.as_slice(), &mut NullSink),
            Err(Error::MissingFile(_))
        ));
    }

    #[test]
    fn new_record_already_present_is_a_noop() {
        let old = model_with(&[("a.txt", b"v1")]);
        let new = model_with(&[("a.txt", b"v1"), ("b.txt", b"fresh")]);
        let patch = diff_directories(&old, &new, &mut NullSink).unwrap();

        let already_has_b = model_with(&[("a.txt", b"v1"), ("b.txt", b"fresh")]);
        let applied = apply_directory_patch(&already_has_b, patch.as_slice(), &mut NullSink).unwrap();
        assert_eq!(applied.get("b.txt").unwrap().data().as_slice(), b"fresh");
    }

    #[test]
    fn update_record_already_at_new_hash_is_a_noop() {
        let old = model_with(&[("a.txt", b"v1")]);
        let new = model_with(&[("a.txt", b"v2")]);
        let patch = diff_directories(&old, &new, &mut NullSink).unwrap();

        let already_v2 = model_with(&[("a.txt", b"v2")]);
        let applied = apply_directory_patch(&already_v2, patch.as_slice(), &mut NullSink).unwrap();
        assert_eq!(applied.get("a.txt").unwrap().data().as_slice(), b"v2");
    }

    #[test]
    fn delete_record_for_drifted_file_is_left_alone() {
        let old = model_with(&[("a.txt", b"v1")]);
        let new = DirectoryModel::new();
        let patch = diff_directories(&old, &new, &mut NullSink).unwrap();

        let drifted = model_with(&[("a.txt", b"drifted")]);
        let applied = apply_directory_patch(&drifted, patch.as_slice(), &mut NullSink).unwrap();
        assert!(applied.get("a.txt").is_some());
    }

    #[test]
    fn directory_patcher_reflects_changes_to_disk() {
        let root = tempfile::tempdir().unwrap();
        let old = model_with(&[("keep.txt", b"same"), ("gone.txt", b"bye")]);
        old.write(root.path(), &mut NullSink).unwrap();

        let new = model_with(&[("keep.txt", b"same"), ("fresh.txt", b"hi")]);
        let patch = diff_directories(&old, &new, &mut NullSink).unwrap();

        let patcher = DirectoryPatcher::new(root.path());
        let result = patcher.apply(&old, patch.as_slice()).unwrap();

        assert_eq!(fs::read(root.path().join("keep.txt")).unwrap(), b"same");
        assert_eq!(fs::read(root.path().join("fresh.txt")).unwrap(), b"hi");
        assert!(!root.path().join("gone.txt").exists());
        assert_eq!(result.file_count(), 2);
    }
}
