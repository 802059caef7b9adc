//! Owning, growable byte container with a cursor-based push/pop protocol.

use crate::memory::MemoryRange;
use crate::{Error, Result};
use byteorder::{ByteOrder, LE};

/// An owning, growable byte container.
///
/// Invariant: `len() <= capacity()`. Growing the logical size beyond the current
/// capacity reallocates to at least twice the requested size; shrinking the size
/// never reallocates. `Buffer` cloning copies the underlying bytes; moving (Rust's
/// ordinary move semantics on the `Vec` field) transfers ownership and leaves the
/// source logically empty, mirroring the C++ original's copy/move constructors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    data: Vec<u8>,
}

impl Buffer {
    /// Construct an empty buffer, allocating nothing.
    pub fn new() -> Self {
        Buffer { data: Vec::new() }
    }

    /// Construct a buffer of exactly `size` zero bytes.
    pub fn with_size(size: usize) -> Self {
        Buffer {
            data: vec![0u8; size],
        }
    }

    /// Wrap an existing byte vector as a buffer.
    pub fn from_vec(data: Vec<u8>) -> Self {
        Buffer { data }
    }

    /// Copy a byte slice into a new buffer.
    pub fn from_slice(data: &[u8]) -> Self {
        Buffer {
            data: data.to_vec(),
        }
    }

    /// True if the logical size is zero.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Logical size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Total allocated capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Borrow the buffer's contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Mutably borrow the buffer's contents.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Borrow the buffer as a [`MemoryRange`].
    pub fn as_range(&self) -> MemoryRange<'_> {
        MemoryRange::new(&self.data)
    }

    /// Unwrap into the backing `Vec<u8>`.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Raise capacity to at least `capacity` bytes without changing `len()`.
    pub fn reserve(&mut self, capacity: usize) {
        let additional = capacity.saturating_sub(self.data.len());
        self.data.reserve(additional);
    }

    /// Raise (or lower) the logical size to `size`.
    ///
    /// Growing beyond the current capacity reallocates to at least `2 * size`; new
    /// bytes are zero-initialized. Shrinking truncates without releasing capacity.
    pub fn resize(&mut self, size: usize) {
        if size > self.data.capacity() {
            self.data.reserve(2 * size - self.data.capacity());
        }
        self.data.resize(size, 0);
    }

    /// Release capacity down to the current logical size.
    pub fn shrink(&mut self) {
        self.data.shrink_to_fit();
    }

    /// Truncate the buffer to `len` bytes (size only, capacity untouched).
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    /// Free the allocation entirely.
    pub fn clear(&mut self) {
        self.data = Vec::new();
    }

    /// Append raw bytes at the logical end, growing as needed.
    pub fn push_raw(&mut self, bytes: &[u8]) {
        let at = self.data.len();
        self.resize(at + bytes.len());
        self.data[at..].copy_from_slice(bytes);
    }

    /// Remove and return the last `len` raw bytes.
    pub fn pop_raw(&mut self, len: usize) -> Result<Vec<u8>> {
        if len > self.data.len() {
            return Err(Error::Underflow {
                requested: len as u64,
                available: self.data.len() as u64,
            });
        }
        let at = self.data.len() - len;
        let tail = self.data[at..].to_vec();
        self.data.truncate(at);
        Ok(tail)
    }

    /// Append a typed value's wire representation at the logical end.
    pub fn push_type<T: WireValue>(&mut self, value: &T) {
        value.push(self);
    }

    /// Remove and decode the last-pushed typed value. Must be called in the
    /// reverse order of the matching `push_type` calls.
    pub fn pop_type<T: WireValue>(&mut self) -> Result<T> {
        T::pop(self)
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(data: Vec<u8>) -> Self {
        Buffer::from_vec(data)
    }
}

/// A value with a fixed wire encoding usable with [`Buffer::push_type`]/
/// [`Buffer::pop_type`].
pub trait WireValue: Sized {
    fn push(&self, buf: &mut Buffer);
    fn pop(buf: &mut Buffer) -> Result<Self>;
}

impl WireValue for u8 {
    fn push(&self, buf: &mut Buffer) {
        buf.push_raw(&[*self]);
    }

    fn pop(buf: &mut Buffer) -> Result<Self> {
        Ok(buf.pop_raw(1)?[0])
    }
}

impl WireValue for u64 {
    fn push(&self, buf: &mut Buffer) {
        let mut b = [0u8; 8];
        LE::write_u64(&mut b, *self);
        buf.push_raw(&b);
    }

    fn pop(buf: &mut Buffer) -> Result<Self> {
        let b = buf.pop_raw(8)?;
        Ok(LE::read_u64(&b))
    }
}

impl WireValue for i64 {
    fn push(&self, buf: &mut Buffer) {
        let mut b = [0u8; 8];
        LE::write_i64(&mut b, *self);
        buf.push_raw(&b);
    }

    fn pop(buf: &mut Buffer) -> Result<Self> {
        let b = buf.pop_raw(8)?;
        Ok(LE::read_i64(&b))
    }
}

impl WireValue for String {
    /// Writes the raw UTF-8 bytes followed by a `u64` length trailer, so the
    /// length sits on top of the stack and `pop` can read it back before
    /// reaching for the bytes beneath it.
    fn push(&self, buf: &mut Buffer) {
        buf.push_raw(self.as_bytes());
        (self.len() as u64).push(buf);
    }

    fn pop(buf: &mut Buffer) -> Result<Self> {
        let len = u64::pop(buf)? as usize;
        let bytes = buf.pop_raw(len)?;
        String::from_utf8(bytes)
            .map_err(|e| Error::Truncated(format!("invalid utf-8 in popped string: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_grows_capacity_by_doubling() {
        let mut b = Buffer::new();
        b.resize(10);
        assert_eq!(b.len(), 10);
        assert!(b.capacity() >= 20);
    }

    #[test]
    fn resize_down_keeps_capacity() {
        let mut b = Buffer::with_size(100);
        let cap = b.capacity();
        b.resize(10);
        assert_eq!(b.len(), 10);
        assert_eq!(b.capacity(), cap);
    }

    #[test]
    fn shrink_releases_capacity() {
        let mut b = Buffer::with_size(100);
        b.resize(4);
        b.shrink();
        assert_eq!(b.capacity(), b.len());
    }

    #[test]
    fn push_pop_u64_roundtrip() {
        let mut b = Buffer::new();
        b.push_type(&42u64);
        let v: u64 = b.pop_type().unwrap();
        assert_eq!(v, 42);
        assert!(b.is_empty());
    }

    #[test]
    fn push_pop_mixed_sequence_is_symmetric() {
        let mut b = Buffer::new();
        b.push_type(&1u64);
        b.push_type(&2u8);
        b.push_type(&(-3i64));

        let a: i64 = b.pop_type().unwrap();
        let c: u8 = b.pop_type().unwrap();
        let d: u64 = b.pop_type().unwrap();
        assert_eq!((d, c, a), (1, 2, -3));
        assert!(b.is_empty());
    }

    #[test]
    fn pop_more_than_pushed_underflows() {
        let mut b = Buffer::new();
        b.push_type(&1u8);
        let result: Result<u64> = b.pop_type();
        assert!(matches!(result, Err(Error::Underflow { .. })));
    }

    #[test]
    fn push_pop_string_roundtrip() {
        let mut b = Buffer::new();
        b.push_type(&"hello world".to_string());
        let s: String = b.pop_type().unwrap();
        assert_eq!(s, "hello world");
        assert!(b.is_empty());
    }

    #[quickcheck_macros::quickcheck]
    fn push_pop_u64_sequence_roundtrips(values: Vec<u64>) -> bool {
        let mut b = Buffer::new();
        for v in &values {
            b.push_type(v);
        }
        let final_size_before_pop = b.len();
        let mut popped = Vec::new();
        for _ in &values {
            popped.push(b.pop_type::<u64>().unwrap());
        }
        popped.reverse();
        popped == values && b.is_empty() && final_size_before_pop == values.len() * 8
    }
}
