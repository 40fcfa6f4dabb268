// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Immutable byte values shared between the cache and its callers.

use bytes::Bytes;
use cachemesh_lru::Weighted;

/// An immutable view of a cached byte sequence.
///
/// Once constructed, the observable bytes never change. Bytes entering from
/// a borrowed slice are copied; bytes entering from an owned buffer are
/// moved, which equally cuts the producer off from the stored data. Clones
/// share the same immutable buffer, so handing a view to many callers is
/// cheap.
///
/// # Examples
///
/// ```
/// use cachemesh::ByteView;
///
/// let mut source = b"630".to_vec();
/// let view = ByteView::copy_from(&source);
///
/// source[0] = b'9'; // the producer keeps mutating its buffer...
/// assert_eq!(view.as_slice(), b"630"); // ...the view is unaffected
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ByteView {
    data: Bytes,
}

impl ByteView {
    /// Creates a view holding a fresh copy of `bytes`.
    #[must_use]
    pub fn copy_from(bytes: &[u8]) -> Self {
        Self {
            data: Bytes::copy_from_slice(bytes),
        }
    }

    /// Length of the viewed bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// `true` if the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrows the viewed bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Returns an owned copy of the viewed bytes.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }
}

impl From<Vec<u8>> for ByteView {
    /// Takes ownership of the buffer; no copy is needed since the producer
    /// can no longer reach it.
    fn from(bytes: Vec<u8>) -> Self {
        Self { data: Bytes::from(bytes) }
    }
}

impl From<String> for ByteView {
    fn from(text: String) -> Self {
        Self {
            data: Bytes::from(text.into_bytes()),
        }
    }
}

impl From<&[u8]> for ByteView {
    fn from(bytes: &[u8]) -> Self {
        Self::copy_from(bytes)
    }
}

impl From<&str> for ByteView {
    fn from(text: &str) -> Self {
        Self::copy_from(text.as_bytes())
    }
}

impl AsRef<[u8]> for ByteView {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl Weighted for ByteView {
    fn weight(&self) -> usize {
        self.data.len()
    }
}

impl std::fmt::Debug for ByteView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ByteView({} bytes)", self.data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_is_defensive() {
        let mut source = b"value".to_vec();
        let view = ByteView::copy_from(&source);
        source.fill(b'x');
        assert_eq!(view.as_slice(), b"value");
    }

    #[test]
    fn owned_copies_are_independent() {
        let view = ByteView::from("value");
        let mut out = view.to_vec();
        out.fill(b'x');
        assert_eq!(view.as_slice(), b"value");
    }

    #[test]
    fn clones_share_contents() {
        let view = ByteView::from("abc");
        let clone = view.clone();
        assert_eq!(view, clone);
        assert_eq!(clone.len(), 3);
        assert_eq!(clone.weight(), 3);
    }

    #[test]
    fn default_is_empty() {
        assert!(ByteView::default().is_empty());
    }
}
