//! Caller-supplied progress/logging sink.
//!
//! The original source's process-wide logging and progress-bar singletons are
//! replaced with an explicit, caller-supplied sink (or the no-op [`NullSink`]
//! default) threaded through each directory-layer operation, rather than
//! reintroducing global state.

/// Observes directory-layer operations without influencing their outcome.
///
/// Every method has a default no-op body, so implementors only need to override
/// the callbacks they care about.
pub trait ProgressSink {
    /// Called once per file read during [`crate::DirectoryModel::scan`].
    fn on_scan_file(&mut self, _relative_path: &str, _bytes: usize) {}

    /// Called once per file written during [`crate::DirectoryModel::write`].
    fn on_write_file(&mut self, _relative_path: &str, _bytes: usize) {}

    /// Called once per file serialized during [`crate::pack_directory`].
    fn on_pack_file(&mut self, _relative_path: &str, _bytes: usize) {}

    /// Called once per record emitted during [`crate::diff_directories`] and once
    /// per record read during [`crate::apply_directory_patch`].
    fn on_patch_record(&mut self, _relative_path: &str, _op: char) {}
}

/// A [`ProgressSink`] that observes nothing; the default when a caller doesn't
/// need progress reporting.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {}
