//! Terminal renderer drawing each pixel as a moon phase emoji.

use std::io::{self, Stdout, Write};

use crossterm::{cursor, queue, terminal};

use super::Renderer;
use crate::animation::Header;
use crate::codec::PackedFrame;

/// UTF-8 encoding of U+1F311 (new moon). Codes 0..8 map to U+1F311..U+1F318,
/// which differ only in the last byte.
const MOON_GLYPH: [u8; 4] = [0xf0, 0x9f, 0x8c, 0x91];

/// Bytes per rendered pixel.
const GLYPH_LEN: usize = MOON_GLYPH.len();

/// Glyph for a palette code.
pub fn moon_glyph(code: u8) -> char {
    char::from_u32(0x1f311 + (code & 0x7) as u32).unwrap_or('?')
}

/// Renders frames as rows of moon emoji.
///
/// Keeps a prebuilt UTF-8 framebuffer and only patches the final byte of each
/// glyph per frame.
pub struct MoonRenderer<W: Write> {
    out: W,
    width: usize,
    framebuffer: Vec<u8>,
}

impl MoonRenderer<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> MoonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            width: 0,
            framebuffer: Vec::new(),
        }
    }

    /// Current framebuffer contents.
    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn build_framebuffer(&mut self, width: usize, height: usize) {
        let row_len = width * GLYPH_LEN + 1;
        self.width = width;
        self.framebuffer = Vec::with_capacity(row_len * height);
        for _ in 0..height {
            for _ in 0..width {
                self.framebuffer.extend_from_slice(&MOON_GLYPH);
            }
            self.framebuffer.push(b'\n');
        }
    }

    /// Write the frame's codes into the framebuffer without drawing it.
    pub fn update(&mut self, frame: &PackedFrame) {
        if self.width == 0 {
            return;
        }
        let row_len = self.width * GLYPH_LEN + 1;
        for (i, code) in frame.codes().enumerate() {
            let (x, y) = (i % self.width, i / self.width);
            let last = y * row_len + x * GLYPH_LEN + GLYPH_LEN - 1;
            if let Some(byte) = self.framebuffer.get_mut(last) {
                *byte = MOON_GLYPH[GLYPH_LEN - 1] + code;
            }
        }
    }
}

impl<W: Write> Renderer for MoonRenderer<W> {
    fn start(&mut self, header: &Header) -> io::Result<()> {
        self.build_framebuffer(header.width as usize, header.height as usize);
        queue!(
            self.out,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
        self.out.flush()
    }

    fn draw(&mut self, frame: &PackedFrame) -> io::Result<()> {
        self.update(frame);
        queue!(self.out, cursor::MoveTo(0, 0))?;
        self.out.write_all(&self.framebuffer)?;
        self.out.flush()
    }

    fn restore(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            cursor::Show,
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
        self.out.flush()
    }
}
