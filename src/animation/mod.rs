//! Animation recording and real-time playback.
//!
//! # File Format
//!
//! Containers (conventionally `data.bin`) hold a fixed header followed by
//! one run-length stream per frame. All integers are native byte order.
//!
//! ```text
//! Header (16 bytes):
//!   Frame rate: u32
//!   Width: u32
//!   Height: u32
//!   Frame count: u32
//!
//! Frame data (frame_count streams, no length prefix):
//!   RLE runs decoding to exactly ceil(width * height * 3 / 8) bytes.
//!   Frame 0 is the packed keyframe, later frames are XOR deltas.
//! ```

mod format;
mod player;
mod recorder;
mod source;

pub use format::{FormatError, Header, MAX_PACKED_SIZE};
pub use player::{
    AnimationPlayer, Clock, FrameIterator, PlaybackError, PlaybackState, PlaybackStats,
    Step, SystemClock,
};
pub use recorder::{AnimationRecorder, AnimationStats, RecordError};
pub use source::{ImageSequence, LumaFrame};
