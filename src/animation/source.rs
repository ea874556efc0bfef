//! Frame sources for the encoder.

use std::path::{Path, PathBuf};

use log::debug;

/// One 8-bit luminance image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LumaFrame {
    pub width: usize,
    pub height: usize,
    pub samples: Vec<u8>,
}

impl LumaFrame {
    /// Wrap raw samples. Returns `None` if `samples` does not match the size.
    pub fn new(width: usize, height: usize, samples: Vec<u8>) -> Option<Self> {
        (samples.len() == width * height).then_some(Self {
            width,
            height,
            samples,
        })
    }

    /// A frame filled with a single value.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            samples: vec![value; width * height],
        }
    }
}

/// Numbered image files `<dir>/<index:04>.<ext>`, read in order.
///
/// The sequence ends at the first file that is missing or fails to decode.
#[derive(Debug, Clone)]
pub struct ImageSequence {
    dir: PathBuf,
    extension: String,
    next_index: u32,
}

impl ImageSequence {
    pub fn new<P: AsRef<Path>>(dir: P, first_index: u32, extension: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            extension: extension.to_string(),
            next_index: first_index,
        }
    }

    /// Path of the image with the given index.
    pub fn path_for(&self, index: u32) -> PathBuf {
        self.dir.join(format!("{:04}.{}", index, self.extension))
    }
}

impl Iterator for ImageSequence {
    type Item = LumaFrame;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.path_for(self.next_index);
        let image = match image::open(&path) {
            Ok(image) => image.to_luma8(),
            Err(e) => {
                debug!("End of sequence at {}: {}", path.display(), e);
                return None;
            }
        };
        self.next_index += 1;

        let (width, height) = image.dimensions();
        Some(LumaFrame {
            width: width as usize,
            height: height as usize,
            samples: image.into_raw(),
        })
    }
}
