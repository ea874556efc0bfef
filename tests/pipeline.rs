//! End-to-end tests: image files -> container -> terminal renderer.

use std::time::Duration;

use image::{GrayImage, Luma};
use tempfile::tempdir;

use moonframe::{
    animation::{AnimationPlayer, AnimationRecorder, Clock, ImageSequence},
    cancel::CancelToken,
    render::MoonRenderer,
};

/// Clock advancing one frame interval per read.
struct FrameClock {
    now: std::cell::Cell<Duration>,
    interval: Duration,
}

impl Clock for FrameClock {
    fn elapsed(&self) -> Duration {
        let now = self.now.get();
        self.now.set(now + self.interval);
        now
    }

    fn sleep(&mut self, _duration: Duration) {}
}

#[test]
fn test_static_scene_container_bytes() {
    // 2x2 grid, three all-zero frames: each 2-byte delta is a short literal.
    let mut recorder = AnimationRecorder::new(2, 2, 10).unwrap();
    for _ in 0..3 {
        recorder.record_codes(&[0, 0, 0, 0]).unwrap();
    }
    let mut container = Vec::new();
    recorder.finalize(&mut container).unwrap();

    let frames = &container[16..];
    assert_eq!(frames, &[0x82, 0, 0, 0x82, 0, 0, 0x82, 0, 0]);
}

#[test]
fn test_encode_and_play_images() {
    let dir = tempdir().unwrap();

    // Source images are 2x wider than the 2x1 output grid.
    // Frame 1: dark; frame 2: left pixel rising, right pixel bright.
    let sources: [[u8; 4]; 2] = [[0, 0, 0, 0], [50, 70, 255, 255]];
    for (i, samples) in sources.iter().enumerate() {
        let mut img = GrayImage::new(4, 1);
        for (x, &s) in samples.iter().enumerate() {
            img.put_pixel(x as u32, 0, Luma([s]));
        }
        img.save(dir.path().join(format!("{:04}.png", i + 1))).unwrap();
    }

    let path = dir.path().join("data.bin");
    let mut recorder = AnimationRecorder::new(2, 1, 10).unwrap();
    let count = recorder
        .record_all(ImageSequence::new(dir.path(), 1, "png"))
        .unwrap();
    assert_eq!(count, 2);
    recorder.finalize_to_path(&path).unwrap();

    let mut player = AnimationPlayer::open(&path).unwrap();
    let mut renderer = MoonRenderer::new(Vec::new());
    let mut clock = FrameClock {
        now: std::cell::Cell::new(Duration::ZERO),
        interval: Duration::from_millis(100),
    };
    let stats = player
        .run(&mut clock, &mut renderer, &CancelToken::new())
        .unwrap();
    assert_eq!(stats.renders, 2);

    let text = std::str::from_utf8(renderer.framebuffer()).unwrap();
    assert_eq!(text, "🌒🌕\n");
}
