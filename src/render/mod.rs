//! Render module - Presenting reconstructed frames.

mod terminal;

pub use terminal::*;

use std::io;

use crate::animation::Header;
use crate::codec::PackedFrame;

/// Receives reconstructed frames from the player.
///
/// `restore` is called exactly once when playback ends, whether it finished,
/// was cancelled or failed.
pub trait Renderer {
    /// Prepare the output for an animation described by `header`.
    fn start(&mut self, header: &Header) -> io::Result<()>;
    /// Present one frame.
    fn draw(&mut self, frame: &PackedFrame) -> io::Result<()>;
    /// Undo everything `start` changed.
    fn restore(&mut self) -> io::Result<()>;
}
