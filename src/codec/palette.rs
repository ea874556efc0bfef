//! Pixel classifier mapping pairs of luminance samples to palette codes.
//!
//! Each output pixel is built from two horizontally adjacent source samples.
//! Their combined brightness picks one of five steps, and which of the two is
//! brighter picks the direction of the gradient, giving eight symmetric phases:
//!
//! ```text
//! rising  (a < b):  0 1 2 3 4
//! falling (a >= b): 0 7 6 5 4
//! ```

/// Number of distinct palette codes.
pub const PALETTE_SIZE: u8 = 8;

/// Number of bits used to store one palette code.
pub const BITS_PER_CODE: usize = 3;

const LUT_RISING: [u8; 5] = [0, 1, 2, 3, 4];
const LUT_FALLING: [u8; 5] = [0, 7, 6, 5, 4];

/// Brightness step (0..=4) for a pair of samples.
#[inline]
pub fn brightness(a: u8, b: u8) -> usize {
    (a as usize + b as usize) * 5 / 512
}

/// Classify one sample pair into a palette code in `0..8`.
#[inline]
pub fn classify(a: u8, b: u8) -> u8 {
    let lut = if a < b { &LUT_RISING } else { &LUT_FALLING };
    lut[brightness(a, b)]
}

/// Classify a luminance image that is twice as wide as the output grid.
///
/// `samples` is row-major with `2 * width` samples per row. Output pixel
/// `(x, y)` is built from samples `2x` and `2x + 1` of row `y`.
pub fn classify_frame(samples: &[u8], width: usize, height: usize) -> Vec<u8> {
    let stride = width * 2;
    samples
        .chunks_exact(stride)
        .take(height)
        .flat_map(|row| row.chunks_exact(2).map(|pair| classify(pair[0], pair[1])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brightness_range() {
        assert_eq!(brightness(0, 0), 0);
        assert_eq!(brightness(255, 255), 4);
        // 102 * 5 / 512 = 0, 103 * 5 / 512 = 1
        assert_eq!(brightness(51, 51), 0);
        assert_eq!(brightness(52, 51), 1);
    }

    #[test]
    fn test_classify_direction() {
        // Equal samples use the falling table.
        assert_eq!(classify(255, 255), 4);
        assert_eq!(classify(60, 60), 7);
        assert_eq!(classify(50, 70), 1);
        assert_eq!(classify(100, 120), 2);
        assert_eq!(classify(120, 100), 6);
    }

    #[test]
    fn test_classify_covers_palette() {
        let mut seen = [false; PALETTE_SIZE as usize];
        for a in 0..=255u8 {
            for b in 0..=255u8 {
                let code = classify(a, b);
                assert!(code < PALETTE_SIZE);
                seen[code as usize] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_classify_frame_layout() {
        // 2x2 output grid from a 4x2 source image.
        let samples = [0, 0, 255, 255, 50, 70, 120, 100];
        let codes = classify_frame(&samples, 2, 2);
        assert_eq!(codes, vec![0, 4, 1, 6]);
    }
}
