//! Single-buffer byte allocator for buffer views.

use gltf_json as json;
use json::validation::Checked::Valid;
use json::validation::USize64;

/// How the bytes of a buffer view are meant to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Interleaved vertex attributes with the given stride in bytes.
    Vertices { stride: usize },
    /// Index data.
    Indices,
    /// Opaque bytes (compressed payloads, images).
    Opaque,
}

/// Owns the document's only binary buffer.
///
/// Data is only ever appended at the tail. Every view starts on a 4-byte
/// boundary; the gap before it is zero-filled.
#[derive(Debug, Default)]
pub struct BufferAllocator {
    data: Vec<u8>,
}

impl BufferAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` and describe the new range as a view of buffer 0.
    pub fn append(&mut self, bytes: &[u8], kind: ViewKind) -> json::buffer::View {
        let padding = (4 - (self.data.len() % 4)) % 4;
        self.data.extend(std::iter::repeat(0u8).take(padding));

        let offset = self.data.len();
        self.data.extend_from_slice(bytes);

        let (byte_stride, target) = match kind {
            ViewKind::Vertices { stride } => (
                Some(json::buffer::Stride(stride)),
                Some(Valid(json::buffer::Target::ArrayBuffer)),
            ),
            ViewKind::Indices => (None, Some(Valid(json::buffer::Target::ElementArrayBuffer))),
            ViewKind::Opaque => (None, None),
        };

        json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: USize64(bytes.len() as u64),
            byte_offset: Some(USize64(offset as u64)),
            byte_stride,
            name: None,
            target,
            extensions: Default::default(),
            extras: Default::default(),
        }
    }

    /// Current length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset(view: &json::buffer::View) -> u64 {
        view.byte_offset.map(|o| o.0).unwrap_or(0)
    }

    #[test]
    fn test_views_are_aligned() {
        let mut buffer = BufferAllocator::new();
        let sizes = [3usize, 1, 7, 4, 0, 5, 2];
        let views: Vec<_> = sizes
            .iter()
            .map(|&n| buffer.append(&vec![0xAB; n], ViewKind::Opaque))
            .collect();

        for (view, &size) in views.iter().zip(&sizes) {
            assert_eq!(offset(view) % 4, 0);
            assert_eq!(view.byte_length.0, size as u64);
        }
    }

    #[test]
    fn test_padding_is_zeroed() {
        let mut buffer = BufferAllocator::new();
        buffer.append(&[1, 2, 3], ViewKind::Opaque);
        let view = buffer.append(&[9], ViewKind::Opaque);

        assert_eq!(offset(&view), 4);
        assert_eq!(buffer.as_bytes(), &[1, 2, 3, 0, 9]);
    }

    #[test]
    fn test_no_dedup() {
        let mut buffer = BufferAllocator::new();
        let a = buffer.append(&[1, 2, 3, 4], ViewKind::Indices);
        let b = buffer.append(&[1, 2, 3, 4], ViewKind::Indices);
        assert_ne!(offset(&a), offset(&b));
        assert_eq!(buffer.len(), 8);
    }

    #[test]
    fn test_stride_only_for_vertices() {
        let mut buffer = BufferAllocator::new();
        let vertices = buffer.append(&[0; 64], ViewKind::Vertices { stride: 32 });
        let indices = buffer.append(&[0; 12], ViewKind::Indices);
        let blob = buffer.append(&[0; 10], ViewKind::Opaque);

        assert_eq!(vertices.byte_stride.map(|s| s.0), Some(32));
        assert_eq!(vertices.target, Some(Valid(json::buffer::Target::ArrayBuffer)));
        assert!(indices.byte_stride.is_none());
        assert_eq!(
            indices.target,
            Some(Valid(json::buffer::Target::ElementArrayBuffer))
        );
        assert!(blob.byte_stride.is_none());
        assert!(blob.target.is_none());
    }
}
