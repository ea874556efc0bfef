//! Dense 3-bit packing of palette codes.
//!
//! Bit `k` of pixel `i` lives at absolute bit offset `i * 3 + k`, least
//! significant bit first within each byte, so a pixel may straddle two bytes.

use super::palette::{BITS_PER_CODE, PALETTE_SIZE};

/// Errors raised while packing palette codes.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("Palette code {code} at pixel {index} is outside 0..8")]
    InvalidCode { index: usize, code: u8 },
    #[error("Expected {expected} pixel codes, got {actual}")]
    PixelCountMismatch { expected: usize, actual: usize },
    #[error("Bit writer overrun: {requested} bits at offset {offset} exceed {capacity}")]
    Overrun {
        offset: usize,
        requested: usize,
        capacity: usize,
    },
}

/// Grid dimensions shared by every frame of an animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    width: usize,
    height: usize,
}

impl FrameGeometry {
    /// Create a geometry. Returns `None` for a zero-sized grid or one whose
    /// bit length does not fit in `usize`.
    pub fn new(width: usize, height: usize) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        width.checked_mul(height)?.checked_mul(BITS_PER_CODE)?;
        Some(Self { width, height })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels in one frame.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Number of meaningful bits in a packed frame.
    #[inline]
    pub fn bit_len(&self) -> usize {
        self.pixel_count() * BITS_PER_CODE
    }

    /// Size of one packed frame in bytes: `ceil(width * height * 3 / 8)`.
    #[inline]
    pub fn packed_size(&self) -> usize {
        self.bit_len().div_ceil(8)
    }

    /// Mask of the valid bits in the final byte of a packed frame.
    #[inline]
    pub fn tail_mask(&self) -> u8 {
        match self.bit_len() % 8 {
            0 => 0xff,
            valid => 0xff >> (8 - valid),
        }
    }
}

/// Bounds-checked LSB-first bit writer over a zeroed, fixed-size buffer.
#[derive(Debug)]
pub struct BitWriter {
    buffer: Vec<u8>,
    /// Absolute bit offset of the next write.
    cursor: usize,
    /// Capacity in bits.
    capacity: usize,
}

impl BitWriter {
    /// Create a writer able to hold `capacity` bits.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0u8; capacity.div_ceil(8)],
            cursor: 0,
            capacity,
        }
    }

    /// Current bit offset.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// OR the low `count` bits of `value` into the stream, LSB first.
    pub fn write_bits(&mut self, value: u8, count: usize) -> Result<(), PackError> {
        if count > 8 || self.cursor + count > self.capacity {
            return Err(PackError::Overrun {
                offset: self.cursor,
                requested: count,
                capacity: self.capacity,
            });
        }
        for bit in 0..count {
            let offset = self.cursor + bit;
            self.buffer[offset / 8] |= ((value >> bit) & 1) << (offset % 8);
        }
        self.cursor += count;
        Ok(())
    }

    /// Consume the writer, returning the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// Read the 3-bit palette code of pixel `index` from a packed buffer.
#[inline]
pub fn extract_code(packed: &[u8], index: usize) -> u8 {
    let mut offset = index * BITS_PER_CODE;
    let mut value = 0u8;
    for bit in 0..BITS_PER_CODE {
        value |= ((packed[offset / 8] >> (offset % 8)) & 1) << bit;
        offset += 1;
    }
    value
}

/// One frame of palette codes in packed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedFrame {
    geometry: FrameGeometry,
    bytes: Vec<u8>,
}

impl PackedFrame {
    /// An all-zero frame (every pixel code 0).
    pub fn zeroed(geometry: FrameGeometry) -> Self {
        Self {
            geometry,
            bytes: vec![0u8; geometry.packed_size()],
        }
    }

    /// Wrap already-packed bytes. Returns `None` if the length is wrong.
    pub fn from_bytes(geometry: FrameGeometry, bytes: Vec<u8>) -> Option<Self> {
        (bytes.len() == geometry.packed_size()).then_some(Self { geometry, bytes })
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[cfg(test)]
    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Palette code of pixel `index` (row-major).
    #[inline]
    pub fn code(&self, index: usize) -> u8 {
        extract_code(&self.bytes, index)
    }

    /// Palette code at grid position `(x, y)`.
    #[inline]
    pub fn code_at(&self, x: usize, y: usize) -> u8 {
        self.code(y * self.geometry.width + x)
    }

    /// Iterate over all pixel codes in row-major order.
    pub fn codes(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.geometry.pixel_count()).map(|i| self.code(i))
    }

    /// XOR `delta` into this frame in place.
    pub fn apply_delta(&mut self, delta: &[u8]) {
        debug_assert_eq!(delta.len(), self.bytes.len());
        for (s, &d) in self.bytes.iter_mut().zip(delta) {
            *s ^= d;
        }
    }
}

/// Pack row-major palette codes into a dense bitstream.
pub fn pack(codes: &[u8], geometry: FrameGeometry) -> Result<PackedFrame, PackError> {
    if codes.len() != geometry.pixel_count() {
        return Err(PackError::PixelCountMismatch {
            expected: geometry.pixel_count(),
            actual: codes.len(),
        });
    }

    let mut writer = BitWriter::new(geometry.bit_len());
    for (index, &code) in codes.iter().enumerate() {
        if code >= PALETTE_SIZE {
            return Err(PackError::InvalidCode { index, code });
        }
        writer.write_bits(code, BITS_PER_CODE)?;
    }

    Ok(PackedFrame {
        geometry,
        bytes: writer.into_bytes(),
    })
}
