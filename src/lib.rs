/*!
Content-addressed binary delta engine and directory packaging/patching pipeline.

Given two byte ranges (a source and a target), [`diff`] produces a compact,
compressed instruction stream that [`patch`] can replay against the source to
reconstruct the target. [`DirectoryModel`] virtualizes a directory tree into an
in-memory file collection; [`pack_directory`]/[`unpack_directory`] serialize a whole
model to a single compressed package, and [`diff_directories`]/
[`apply_directory_patch`] compute and apply a cross-version patch between two models
with per-file integrity verification.

```
use yatta::{diff, patch};

fn roundtrip(source: &[u8], target: &[u8]) -> yatta::Result<()> {
    let patch_buf = diff(source, target)?;
    let rebuilt = patch(source, patch_buf.as_slice())?;
    assert_eq!(rebuilt.as_slice(), target);
    Ok(())
}
```
*/

pub mod buffer;
pub mod codec;
pub mod diff;
pub mod directory;
mod instruction;
pub mod memory;
pub mod patch;
pub mod progress;
mod search;
mod wire;

pub use buffer::Buffer;
pub use codec::{compress, decompress};
pub use diff::{diff, Differ};
pub use directory::{
    apply_directory_patch, diff_directories, pack_directory, unpack_directory, DirectoryModel,
    DirectoryPatcher, VirtualFile,
};
pub use memory::MemoryRange;
pub use patch::{patch, Patcher};
pub use progress::{NullSink, ProgressSink};

/// Minimum length of a match the [`Differ`] is willing to emit as a `COPY`
/// instruction rather than folding it into a literal run.
pub const MIN_MATCH: usize = 8;

/// Taxonomy of every expected failure mode of the engine.
///
/// The core never recovers from any of these silently; every failure is surfaced to
/// the caller. The one exception is [`directory::DirectoryPatcher`]'s Phase 1, which
/// treats a file already at its target hash as a deliberate skip rather than an
/// error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Access beyond the logical size of a [`MemoryRange`] or [`Buffer`].
    #[error("index {index} out of bounds (size {size})")]
    OutOfBounds { index: u64, size: u64 },

    /// Pop from an undersized buffer, or pop in the wrong order/width.
    #[error("buffer underflow: tried to pop {requested} bytes from {available} available")]
    Underflow { requested: u64, available: u64 },

    /// Frame tag mismatch or the buffer is too short to hold a header.
    #[error("bad frame header: {0}")]
    BadHeader(String),

    /// The underlying compressor rejected the input.
    #[error("compression failed: {0}")]
    CompressFailure(String),

    /// The underlying decompressor rejected the input or produced a different size
    /// than the header promised.
    #[error("decompression failed: {0}")]
    DecompressFailure(String),

    /// An instruction referenced out-of-range source bytes or would overflow the
    /// target buffer.
    #[error("bad instruction: {0}")]
    BadInstruction(String),

    /// The payload ended mid-record, or short of the promised size.
    #[error("truncated payload: {0}")]
    Truncated(String),

    /// A path violated the [`DirectoryModel`] invariants (non-empty, no `..`
    /// segments, unique).
    #[error("bad path {path:?}: {reason}")]
    BadPath { path: String, reason: &'static str },

    /// A directory patch record referenced a file absent from the model.
    #[error("missing file: {0}")]
    MissingFile(String),

    /// A directory patch record's `old_hash` did not match the file's current
    /// hash (and the file was not already at `new_hash`).
    #[error("version mismatch for {path}: expected hash {expected:#018x}, found {found:#018x}")]
    VersionMismatch {
        path: String,
        expected: u64,
        found: u64,
    },

    /// Applying a patch record produced content that does not hash to the
    /// record's promised `new_hash`.
    #[error("hash mismatch for {path} after patching")]
    HashMismatch { path: String },

    /// Source data is larger than the search index can address.
    #[error("source data is too large to be indexed ({0} bytes)")]
    TooLarge(u64),

    /// Underlying filesystem error raised by [`DirectoryModel::scan`]/`write`.
    #[error("io failure: {0}")]
    IoFailure(#[from] std::io::Error),
}

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;
