//! Codec module - Pixel classification, bit packing, delta transform and RLE.
//!
//! Encode path: samples -> [`classify`] -> [`pack`] -> [`encode_delta`] -> [`rle::encode`].
//! Decode path runs the last two stages in reverse, one frame at a time.

mod delta;
mod packer;
mod palette;
pub mod rle;

pub use delta::*;
pub use packer::*;
pub use palette::*;
pub use rle::{Run, RleError};
