//! Binary container layout for moonframe animations.

use std::io::{self, Read, Write};
use std::time::Duration;

use bytemuck::{Pod, Zeroable};

use crate::codec::FrameGeometry;

/// Header validation errors.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Grid dimensions must be non-zero (got {width}x{height})")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Frame rate must be non-zero")]
    InvalidFrameRate,
    #[error("Animation must contain at least one frame")]
    NoFrames,
    #[error("Frame of {width}x{height} exceeds the {max} byte packed frame limit")]
    FrameTooLarge { width: u32, height: u32, max: usize },
    #[error("Header truncated")]
    Truncated,
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// File header, stored in native byte order at the start of the container.
///
/// Followed by `frame_count` run-length streams of
/// [`packed_size`](Self::packed_size) decoded bytes each, with no length
/// prefixes between them.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct Header {
    /// Frames per second.
    pub framerate: u32,
    /// Grid width in pixels.
    pub width: u32,
    /// Grid height in pixels.
    pub height: u32,
    /// Total number of frames.
    pub frame_count: u32,
}

/// Largest decoded frame a container may declare.
pub const MAX_PACKED_SIZE: usize = 1 << 30;

impl Header {
    /// Size of header in bytes.
    pub const SIZE: usize = size_of::<Self>();

    /// Check header invariants.
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.width == 0 || self.height == 0 {
            return Err(FormatError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.framerate == 0 {
            return Err(FormatError::InvalidFrameRate);
        }
        if self.frame_count == 0 {
            return Err(FormatError::NoFrames);
        }
        match self.geometry() {
            Some(geometry) if geometry.packed_size() <= MAX_PACKED_SIZE => Ok(()),
            _ => Err(FormatError::FrameTooLarge {
                width: self.width,
                height: self.height,
                max: MAX_PACKED_SIZE,
            }),
        }
    }

    /// Frame geometry. Only `None` for a header that fails validation.
    pub fn geometry(&self) -> Option<FrameGeometry> {
        FrameGeometry::new(self.width as usize, self.height as usize)
    }

    /// Decoded size of one frame's run-length stream, 0 if the dimensions
    /// are unrepresentable.
    pub fn packed_size(&self) -> usize {
        self.geometry().map_or(0, |g| g.packed_size())
    }

    /// Duration of a single frame.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs(1) / self.framerate.max(1)
    }

    /// Index of the frame due `elapsed` after playback started.
    pub fn target_frame(&self, elapsed: Duration) -> u64 {
        (elapsed.as_millis() * self.framerate as u128 / 1000) as u64
    }

    /// Total running time.
    pub fn duration(&self) -> Duration {
        self.frame_duration() * self.frame_count
    }

    /// Write header to output.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(bytemuck::bytes_of(self))
    }

    /// Read and validate a header.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, FormatError> {
        let mut header = Self::zeroed();
        r.read_exact(bytemuck::bytes_of_mut(&mut header))
            .map_err(|e| match e.kind() {
                io::ErrorKind::UnexpectedEof => FormatError::Truncated,
                _ => FormatError::Io(e),
            })?;
        header.validate()?;
        Ok(header)
    }
}
