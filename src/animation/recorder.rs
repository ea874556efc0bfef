//! Animation recorder: classifies, packs, delta-encodes and compresses frames.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::{debug, info, warn};

use super::format::Header;
use super::source::LumaFrame;
use crate::codec::{
    FrameGeometry, PackError, PackedFrame, classify_frame, encode_delta, pack, rle,
};

/// Errors raised while recording an animation.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Grid dimensions and frame rate must be non-zero")]
    InvalidParameters,
    #[error("No frames were recorded")]
    EmptySequence,
    #[error("Too many frames for the container ({0})")]
    TooManyFrames(usize),
    #[error("Packing failed: {0}")]
    Pack(#[from] PackError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Animation recorder that collects frames in memory and writes the whole
/// container at once.
///
/// Usage:
/// ```ignore
/// let mut recorder = AnimationRecorder::new(64, 48, 30)?;
/// for frame in ImageSequence::new("frames", 1, "png") {
///     if !recorder.record_frame(&frame)? {
///         break;
///     }
/// }
/// let stats = recorder.finalize_to_path("data.bin")?;
/// ```
#[derive(Debug)]
pub struct AnimationRecorder {
    geometry: FrameGeometry,
    framerate: u32,
    frames: Vec<PackedFrame>,
}

impl AnimationRecorder {
    /// Create a recorder for a `width` x `height` grid.
    pub fn new(width: u32, height: u32, framerate: u32) -> Result<Self, RecordError> {
        let geometry = FrameGeometry::new(width as usize, height as usize)
            .ok_or(RecordError::InvalidParameters)?;
        if framerate == 0 {
            return Err(RecordError::InvalidParameters);
        }
        Ok(Self {
            geometry,
            framerate,
            frames: Vec::new(),
        })
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// Record one source image, which must be twice as wide as the grid.
    ///
    /// Returns false (recording nothing) if the image has the wrong size, which
    /// marks the end of the sequence.
    pub fn record_frame(&mut self, frame: &LumaFrame) -> Result<bool, RecordError> {
        let (width, height) = (self.geometry.width(), self.geometry.height());
        if frame.width != width * 2
            || frame.height != height
            || frame.samples.len() != width * 2 * height
        {
            warn!(
                "Frame {} is {}x{}, expected {}x{}; ending sequence",
                self.frames.len() + 1,
                frame.width,
                frame.height,
                width * 2,
                height
            );
            return Ok(false);
        }

        let codes = classify_frame(&frame.samples, width, height);
        self.record_codes(&codes)?;
        Ok(true)
    }

    /// Record a frame of pre-classified palette codes.
    pub fn record_codes(&mut self, codes: &[u8]) -> Result<(), RecordError> {
        let packed = pack(codes, self.geometry)?;
        debug!("Converted frame {}", self.frames.len() + 1);
        self.frames.push(packed);
        Ok(())
    }

    /// Record every frame from `source` until it ends or a frame is rejected.
    pub fn record_all<I>(&mut self, source: I) -> Result<usize, RecordError>
    where
        I: IntoIterator<Item = LumaFrame>,
    {
        let before = self.frames.len();
        for frame in source {
            if !self.record_frame(&frame)? {
                break;
            }
        }
        Ok(self.frames.len() - before)
    }

    /// Get number of frames recorded so far.
    pub fn frames_recorded(&self) -> usize {
        self.frames.len()
    }

    /// Header describing the recorded animation.
    pub fn header(&self) -> Result<Header, RecordError> {
        let frame_count = u32::try_from(self.frames.len())
            .map_err(|_| RecordError::TooManyFrames(self.frames.len()))?;
        Ok(Header {
            framerate: self.framerate,
            width: self.geometry.width() as u32,
            height: self.geometry.height() as u32,
            frame_count,
        })
    }

    /// Delta-encode, compress and write the container.
    pub fn finalize<W: Write>(self, w: &mut W) -> Result<AnimationStats, RecordError> {
        if self.frames.is_empty() {
            return Err(RecordError::EmptySequence);
        }
        let header = self.header()?;

        info!("Delta-encoding {} frames...", self.frames.len());
        let deltas = encode_delta(&self.frames);

        header.write_to(w)?;
        info!("Compressing and saving frames...");
        let mut compressed_bytes = 0;
        for (i, delta) in deltas.iter().enumerate() {
            let written = rle::encode_to(delta.as_bytes(), w)?;
            debug!("Frame {}: {} -> {} bytes", i, delta.len(), written);
            compressed_bytes += written;
        }
        w.flush()?;

        Ok(AnimationStats {
            frame_count: self.frames.len(),
            packed_size: self.geometry.packed_size(),
            raw_bytes: self.frames.len() * self.geometry.pixel_count(),
            compressed_bytes,
            total_bytes: Header::SIZE + compressed_bytes,
        })
    }

    /// Write the container to a new file at `path`.
    pub fn finalize_to_path<P: AsRef<Path>>(
        self,
        path: P,
    ) -> Result<AnimationStats, RecordError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.finalize(&mut writer)
    }
}

/// Statistics from recording session.
#[derive(Debug, Clone)]
pub struct AnimationStats {
    /// Total frames recorded.
    pub frame_count: usize,
    /// Decoded size of one packed frame.
    pub packed_size: usize,
    /// One byte per pixel per frame, before packing.
    pub raw_bytes: usize,
    /// Size of all run-length streams.
    pub compressed_bytes: usize,
    /// Total file size in bytes.
    pub total_bytes: usize,
}

impl AnimationStats {
    /// Compressed size as a fraction of the packed size.
    pub fn ratio(&self) -> f64 {
        let packed = self.frame_count * self.packed_size;
        if packed == 0 {
            return 0.0;
        }
        self.compressed_bytes as f64 / packed as f64
    }
}

impl std::fmt::Display for AnimationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames, {} bytes total, {} bytes/frame packed, {:.1}% of packed size",
            self.frame_count,
            self.total_bytes,
            self.packed_size,
            self.ratio() * 100.0
        )
    }
}
