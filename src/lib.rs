//! Moonframe - 3-bit animations, delta and run-length encoded, played back
//! against the wall clock.
//!
//! # Architecture
//!
//! - `codec`: Pixel classification, 3-bit packing, XOR delta transform and
//!   the run-length codec
//! - `animation`: Container header, recorder (encoder) and real-time player
//! - `render`: Renderer trait and the terminal moon-phase renderer
//! - `schema`: Encoder configuration
//! - `cancel`: Interrupt handling for playback
//!
//! # Example
//!
//! ```rust,no_run
//! use moonframe::{
//!     animation::{AnimationPlayer, AnimationRecorder, ImageSequence, SystemClock},
//!     cancel::CancelToken,
//!     render::MoonRenderer,
//! };
//!
//! // Encode numbered images from `frames/` into a container
//! let mut recorder = AnimationRecorder::new(64, 48, 30).unwrap();
//! recorder.record_all(ImageSequence::new("frames", 1, "png")).unwrap();
//! let stats = recorder.finalize_to_path("data.bin").unwrap();
//! println!("{}", stats);
//!
//! // Play it back in the terminal
//! let mut player = AnimationPlayer::open("data.bin").unwrap();
//! let mut renderer = MoonRenderer::stdout();
//! player
//!     .run(&mut SystemClock::start(), &mut renderer, &CancelToken::new())
//!     .unwrap();
//! ```

pub mod animation;
pub mod cancel;
pub mod codec;
pub mod render;
pub mod schema;

// Re-export commonly used types
pub use animation::{AnimationPlayer, AnimationRecorder, Header};
pub use codec::{FrameGeometry, PackedFrame};
pub use schema::EncoderConfig;
