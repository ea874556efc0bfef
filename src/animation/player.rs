//! Real-time animation player.
//!
//! The player maps wall-clock time to a target frame, folds in as many delta
//! frames as it needs to catch up, and renders only the final state. Frames in
//! between are skipped on purpose when playback falls behind.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use super::format::{FormatError, Header};
use crate::cancel::CancelToken;
use crate::codec::{FrameGeometry, PackedFrame, RleError, rle};
use crate::render::Renderer;

/// Errors raised during playback.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Failed to open frame data ({path}): {source}")]
    MissingContainer {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid header: {0}")]
    Format(#[from] FormatError),
    #[error("Frame {frame} is corrupt: {source}")]
    CorruptFrame {
        frame: u32,
        #[source]
        source: RleError,
    },
    #[error("Renderer failed: {0}")]
    Render(#[source] io::Error),
    #[error("{bytes} bytes of data follow the last frame")]
    TrailingData { bytes: u64 },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Source of elapsed time and pacing for the scheduler.
pub trait Clock {
    /// Time since playback started.
    fn elapsed(&self) -> Duration;
    /// Pause between scheduling iterations.
    fn sleep(&mut self, duration: Duration);
}

/// Wall clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Start measuring from now.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Scheduler phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    CatchingUp,
    Sleeping,
    Done,
}

/// Outcome of one scheduling iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// `folded` delta frames were applied; `frame` is now the current state.
    Rendered { frame: u32, folded: u32 },
    /// No new frame was due.
    Idle,
    /// The clock has passed the last frame.
    Done,
}

/// Statistics from a playback session.
#[derive(Debug, Clone, Default)]
pub struct PlaybackStats {
    /// Delta frames decoded and applied.
    pub frames_folded: u32,
    /// States handed to the renderer.
    pub renders: u32,
    /// Idle iterations that slept.
    pub sleeps: u64,
    /// Playback was interrupted.
    pub cancelled: bool,
}

impl PlaybackStats {
    /// Frames folded in without being shown.
    pub fn skipped(&self) -> u32 {
        self.frames_folded - self.renders
    }
}

impl std::fmt::Display for PlaybackStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames decoded, {} rendered, {} skipped{}",
            self.frames_folded,
            self.renders,
            self.skipped(),
            if self.cancelled { " (interrupted)" } else { "" }
        )
    }
}

/// Animation player reading a container sequentially.
///
/// Usage:
/// ```ignore
/// let mut player = AnimationPlayer::open("data.bin")?;
/// let mut renderer = MoonRenderer::stdout();
/// let stats = player.run(&mut SystemClock::start(), &mut renderer, &CancelToken::new())?;
/// ```
pub struct AnimationPlayer<R> {
    reader: R,
    header: Header,
    /// Reconstructed frame, the XOR fold of every delta read so far.
    state: PackedFrame,
    /// Pre-allocated buffer for the delta being decoded.
    delta: Vec<u8>,
    frames_folded: u32,
    /// Set once the stream has been checked for data after the last frame.
    end_checked: bool,
    phase: PlaybackState,
}

impl AnimationPlayer<BufReader<File>> {
    /// Open an animation file for playback.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PlaybackError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| PlaybackError::MissingContainer {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read> AnimationPlayer<R> {
    /// Read the header and prepare an all-zero initial state.
    pub fn from_reader(mut reader: R) -> Result<Self, PlaybackError> {
        let header = Header::read_from(&mut reader)?;
        let geometry = header.geometry().ok_or(FormatError::InvalidDimensions {
            width: header.width,
            height: header.height,
        })?;

        Ok(Self {
            reader,
            header,
            state: PackedFrame::zeroed(geometry),
            delta: vec![0u8; geometry.packed_size()],
            frames_folded: 0,
            end_checked: false,
            phase: PlaybackState::Idle,
        })
    }

    /// Get animation header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.state.geometry()
    }

    /// Get total number of frames.
    pub fn frame_count(&self) -> u32 {
        self.header.frame_count
    }

    /// Current reconstructed frame.
    pub fn state(&self) -> &PackedFrame {
        &self.state
    }

    pub fn phase(&self) -> PlaybackState {
        self.phase
    }

    /// Index of the newest frame folded into the state, if any.
    pub fn last_rendered_frame(&self) -> Option<u32> {
        self.frames_folded.checked_sub(1)
    }

    /// Pause used when no frame is due: a tenth of a frame interval.
    pub fn sleep_slice(&self) -> Duration {
        Duration::from_micros(100_000 / self.header.framerate as u64)
    }

    fn fold_next(&mut self) -> Result<(), PlaybackError> {
        rle::decode(&mut self.reader, &mut self.delta).map_err(|source| {
            PlaybackError::CorruptFrame {
                frame: self.frames_folded,
                source,
            }
        })?;
        self.state.apply_delta(&self.delta);
        self.frames_folded += 1;
        Ok(())
    }

    /// Decode the next delta frame and fold it into the state.
    ///
    /// Returns false once every frame has been read. The first call past the
    /// last frame fails if the container holds more data than the header
    /// declares.
    pub fn advance(&mut self) -> Result<bool, PlaybackError> {
        if self.frames_folded >= self.header.frame_count {
            if !self.end_checked {
                self.end_checked = true;
                let bytes = io::copy(&mut self.reader, &mut io::sink())?;
                if bytes > 0 {
                    return Err(PlaybackError::TrailingData { bytes });
                }
            }
            return Ok(false);
        }
        self.fold_next()?;
        Ok(true)
    }

    /// Run one scheduling iteration for the given elapsed time.
    pub fn step(&mut self, elapsed: Duration) -> Result<Step, PlaybackError> {
        let target = self.header.target_frame(elapsed);
        if target >= self.header.frame_count as u64 {
            self.phase = PlaybackState::Done;
            return Ok(Step::Done);
        }

        let mut folded = 0;
        while target >= self.frames_folded as u64 {
            self.phase = PlaybackState::CatchingUp;
            self.fold_next()?;
            folded += 1;
        }

        if folded == 0 {
            self.phase = PlaybackState::Sleeping;
            return Ok(Step::Idle);
        }

        self.phase = PlaybackState::Idle;
        let frame = self.frames_folded - 1;
        if folded > 1 {
            debug!("Caught up {} frames to frame {}", folded, frame);
        }
        Ok(Step::Rendered { frame, folded })
    }

    /// Play in real time until the last frame's slot has passed or `cancel` is
    /// set. The renderer is restored on every exit path.
    pub fn run<C, D>(
        &mut self,
        clock: &mut C,
        renderer: &mut D,
        cancel: &CancelToken,
    ) -> Result<PlaybackStats, PlaybackError>
    where
        C: Clock,
        D: Renderer + ?Sized,
    {
        let result = renderer
            .start(&self.header)
            .map_err(PlaybackError::Render)
            .and_then(|()| self.play(clock, renderer, cancel));
        let restored = renderer.restore().map_err(PlaybackError::Render);

        let stats = result?;
        restored?;
        Ok(stats)
    }

    fn play<C, D>(
        &mut self,
        clock: &mut C,
        renderer: &mut D,
        cancel: &CancelToken,
    ) -> Result<PlaybackStats, PlaybackError>
    where
        C: Clock,
        D: Renderer + ?Sized,
    {
        let mut stats = PlaybackStats::default();
        let slice = self.sleep_slice();

        loop {
            if cancel.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            match self.step(clock.elapsed())? {
                Step::Done => break,
                Step::Rendered { folded, .. } => {
                    stats.frames_folded += folded;
                    stats.renders += 1;
                    renderer.draw(&self.state).map_err(PlaybackError::Render)?;
                }
                Step::Idle => {
                    stats.sleeps += 1;
                    clock.sleep(slice);
                }
            }
        }

        debug!("Playback finished: {}", stats);
        Ok(stats)
    }

    /// Create an iterator over all remaining frames, in order.
    pub fn frames(&mut self) -> FrameIterator<'_, R> {
        FrameIterator { player: self }
    }
}

/// Iterator over reconstructed frames.
pub struct FrameIterator<'a, R> {
    player: &'a mut AnimationPlayer<R>,
}

impl<R: Read> Iterator for FrameIterator<'_, R> {
    type Item = Result<PackedFrame, PlaybackError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.player.advance() {
            Ok(true) => Some(Ok(self.player.state.clone())),
            Ok(false) => None,
            Err(e) => {
                // Nothing after a corrupt frame can be trusted.
                self.player.frames_folded = self.player.header.frame_count;
                self.player.end_checked = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.player.frame_count() - self.player.frames_folded) as usize;
        (0, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationRecorder;
    use crate::codec::pack;
    use std::cell::Cell;
    use std::io::Cursor;
    use tempfile::tempdir;

    /// Clock that moves forward by `tick` every time it is read.
    struct TickClock {
        now: Cell<Duration>,
        tick: Duration,
        slept: Vec<Duration>,
    }

    impl TickClock {
        fn new(tick_ms: u64) -> Self {
            Self {
                now: Cell::new(Duration::ZERO),
                tick: Duration::from_millis(tick_ms),
                slept: Vec::new(),
            }
        }
    }

    impl Clock for TickClock {
        fn elapsed(&self) -> Duration {
            let now = self.now.get();
            self.now.set(now + self.tick);
            now
        }

        fn sleep(&mut self, duration: Duration) {
            self.slept.push(duration);
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        started: bool,
        restored: u32,
        frames: Vec<PackedFrame>,
    }

    impl Renderer for RecordingRenderer {
        fn start(&mut self, _header: &Header) -> io::Result<()> {
            self.started = true;
            Ok(())
        }

        fn draw(&mut self, frame: &PackedFrame) -> io::Result<()> {
            self.frames.push(frame.clone());
            Ok(())
        }

        fn restore(&mut self) -> io::Result<()> {
            self.restored += 1;
            Ok(())
        }
    }

    /// Frame `i` of a 3x2 grid: every pixel set to `(i + pixel) % 8`.
    fn test_codes(i: usize) -> Vec<u8> {
        (0..6).map(|p| ((i + p) % 8) as u8).collect()
    }

    fn test_container(frame_count: usize, framerate: u32) -> Vec<u8> {
        let mut recorder = AnimationRecorder::new(3, 2, framerate).unwrap();
        for i in 0..frame_count {
            recorder.record_codes(&test_codes(i)).unwrap();
        }
        let mut buf = Vec::new();
        recorder.finalize(&mut buf).unwrap();
        buf
    }

    fn expected_frame(i: usize) -> PackedFrame {
        pack(&test_codes(i), FrameGeometry::new(3, 2).unwrap()).unwrap()
    }

    #[test]
    fn test_step_catches_up() {
        let data = test_container(10, 10);
        let mut player = AnimationPlayer::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(player.last_rendered_frame(), None);
        assert_eq!(player.phase(), PlaybackState::Idle);

        let step = player.step(Duration::from_millis(250)).unwrap();
        assert_eq!(step, Step::Rendered { frame: 2, folded: 3 });
        assert_eq!(player.state(), &expected_frame(2));

        assert_eq!(player.step(Duration::from_millis(299)).unwrap(), Step::Idle);
        assert_eq!(player.phase(), PlaybackState::Sleeping);

        assert_eq!(player.step(Duration::from_millis(1005)).unwrap(), Step::Done);
        assert_eq!(player.phase(), PlaybackState::Done);
        assert_eq!(player.last_rendered_frame(), Some(2));
    }

    #[test]
    fn test_step_never_passes_last_frame() {
        let data = test_container(10, 10);
        let mut player = AnimationPlayer::from_reader(Cursor::new(data)).unwrap();
        let mut last = None;
        for ms in (0..1500).step_by(7) {
            player.step(Duration::from_millis(ms)).unwrap();
            let current = player.last_rendered_frame();
            assert!(current >= last);
            assert!(current.is_none_or(|f| f < 10));
            last = current;
        }
        assert_eq!(last, Some(9));
    }

    #[test]
    fn test_run_skips_frames_under_load() {
        let data = test_container(10, 10);
        let mut player = AnimationPlayer::from_reader(Cursor::new(data)).unwrap();
        let mut clock = TickClock::new(250);
        let mut renderer = RecordingRenderer::default();

        let stats = player
            .run(&mut clock, &mut renderer, &CancelToken::new())
            .unwrap();

        // Clock reads 0, 250, 500, 750 -> targets 0, 2, 5, 7; 1000 is done.
        assert_eq!(stats.renders, 4);
        assert_eq!(stats.frames_folded, 8);
        assert_eq!(stats.skipped(), 4);
        assert_eq!(stats.sleeps, 0);
        let expected: Vec<_> = [0, 2, 5, 7].into_iter().map(expected_frame).collect();
        assert_eq!(renderer.frames, expected);
        assert!(renderer.started);
        assert_eq!(renderer.restored, 1);
    }

    #[test]
    fn test_run_sleeps_between_frames() {
        let data = test_container(10, 10);
        let mut player = AnimationPlayer::from_reader(Cursor::new(data)).unwrap();
        let mut clock = TickClock::new(30);
        let mut renderer = RecordingRenderer::default();

        let stats = player
            .run(&mut clock, &mut renderer, &CancelToken::new())
            .unwrap();

        assert_eq!(stats.renders, 10);
        assert_eq!(stats.skipped(), 0);
        assert!(stats.sleeps > 0);
        assert_eq!(clock.slept.len() as u64, stats.sleeps);
        assert!(clock.slept.iter().all(|&d| d == Duration::from_millis(10)));
        for (i, frame) in renderer.frames.iter().enumerate() {
            assert_eq!(frame, &expected_frame(i));
        }
    }

    #[test]
    fn test_run_cancelled() {
        let data = test_container(5, 10);
        let mut player = AnimationPlayer::from_reader(Cursor::new(data)).unwrap();
        let mut renderer = RecordingRenderer::default();
        let cancel = CancelToken::new();
        cancel.cancel();

        let stats = player
            .run(&mut TickClock::new(10), &mut renderer, &cancel)
            .unwrap();
        assert!(stats.cancelled);
        assert_eq!(stats.renders, 0);
        assert_eq!(renderer.restored, 1);
    }

    #[test]
    fn test_run_corrupt_stream_restores_renderer() {
        let mut data = test_container(10, 10);
        data.truncate(Header::SIZE + 5);
        let mut player = AnimationPlayer::from_reader(Cursor::new(data)).unwrap();
        let mut renderer = RecordingRenderer::default();

        let err = player
            .run(&mut TickClock::new(100), &mut renderer, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(
            err,
            PlaybackError::CorruptFrame {
                source: RleError::Truncated { .. },
                ..
            }
        ));
        assert_eq!(renderer.restored, 1);
    }

    #[test]
    fn test_frames_iterator() {
        let data = test_container(12, 24);
        let mut player = AnimationPlayer::from_reader(Cursor::new(data)).unwrap();
        let frames: Vec<_> = player.frames().collect::<Result<_, _>>().unwrap();
        assert_eq!(frames.len(), 12);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame, &expected_frame(i));
        }
        assert!(!player.advance().unwrap());
    }

    #[test]
    fn test_frames_rejects_trailing_data() {
        let mut data = Vec::new();
        Header {
            framerate: 10,
            width: 2,
            height: 2,
            frame_count: 1,
        }
        .write_to(&mut data)
        .unwrap();
        data.extend_from_slice(&[0x82, 1, 2, 0x82, 3, 4]);

        let mut player = AnimationPlayer::from_reader(Cursor::new(data)).unwrap();
        let mut frames = player.frames();
        assert_eq!(frames.next().unwrap().unwrap().as_bytes(), &[1, 2]);
        assert!(matches!(
            frames.next(),
            Some(Err(PlaybackError::TrailingData { bytes: 3 }))
        ));
        assert!(frames.next().is_none());
    }

    #[test]
    fn test_from_reader_rejects_oversized_header() {
        let mut data = Vec::new();
        Header {
            framerate: 10,
            width: u32::MAX,
            height: u32::MAX,
            frame_count: 1,
        }
        .write_to(&mut data)
        .unwrap();

        let err = AnimationPlayer::from_reader(Cursor::new(data)).err().unwrap();
        assert!(matches!(
            err,
            PlaybackError::Format(FormatError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_open_missing_container() {
        let dir = tempdir().unwrap();
        let err = AnimationPlayer::open(dir.path().join("missing.bin")).err().unwrap();
        assert!(matches!(err, PlaybackError::MissingContainer { .. }));
    }

    #[test]
    fn test_open_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, test_container(3, 10)).unwrap();

        let mut player = AnimationPlayer::open(&path).unwrap();
        assert_eq!(player.frame_count(), 3);
        assert_eq!(player.sleep_slice(), Duration::from_millis(10));
        assert_eq!(player.frames().count(), 3);
    }

    #[test]
    fn test_sleep_slice() {
        let data = test_container(1, 30);
        let player = AnimationPlayer::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(player.sleep_slice(), Duration::from_micros(3333));
    }
}
