//! Inter-frame delta transform.
//!
//! Frame 0 is stored as-is (a diff against the all-zero state); every later
//! frame is stored as the byte-wise XOR with its predecessor. Folding the
//! deltas back in order with XOR reproduces each packed frame exactly.

use super::packer::{FrameGeometry, PackedFrame};

/// Byte-wise XOR difference between two consecutive packed frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaFrame {
    bytes: Vec<u8>,
}

impl DeltaFrame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True if applying this delta changes nothing.
    pub fn is_unchanged(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }
}

/// Clear the don't-care bits past the last pixel in the final byte.
pub fn mask_tail(bytes: &mut [u8], geometry: FrameGeometry) {
    if let Some(last) = bytes.last_mut() {
        *last &= geometry.tail_mask();
    }
}

/// Difference between `before` and `after`, tail bits masked.
pub fn diff(before: &PackedFrame, after: &PackedFrame) -> DeltaFrame {
    let mut bytes: Vec<u8> = before
        .as_bytes()
        .iter()
        .zip(after.as_bytes())
        .map(|(&a, &b)| a ^ b)
        .collect();
    mask_tail(&mut bytes, after.geometry());
    DeltaFrame { bytes }
}

/// Delta-encode a sequence of packed frames. The first delta is the keyframe.
pub fn encode_delta(frames: &[PackedFrame]) -> Vec<DeltaFrame> {
    let Some(first) = frames.first() else {
        return Vec::new();
    };

    let mut keyframe = first.as_bytes().to_vec();
    mask_tail(&mut keyframe, first.geometry());

    let mut deltas = Vec::with_capacity(frames.len());
    deltas.push(DeltaFrame { bytes: keyframe });
    deltas.extend(frames.windows(2).map(|pair| diff(&pair[0], &pair[1])));
    deltas
}

/// Fold a delta sequence back into packed frames.
///
/// The player does this incrementally; this batch form exists for tools and
/// tests that want every frame at once.
pub fn decode_delta(geometry: FrameGeometry, deltas: &[DeltaFrame]) -> Vec<PackedFrame> {
    let mut state = PackedFrame::zeroed(geometry);
    deltas
        .iter()
        .map(|delta| {
            state.apply_delta(delta.as_bytes());
            state.clone()
        })
        .collect()
}
