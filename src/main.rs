//! Moonframe CLI - Encode image sequences and play them back in the terminal.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{error, info, warn};

use moonframe::{
    animation::{AnimationPlayer, AnimationRecorder, ImageSequence, SystemClock},
    cancel::CancelToken,
    render::MoonRenderer,
    schema::EncoderConfig,
};

const DEFAULT_CONTAINER: &str = "data.bin";

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    let result = match args.get(1).map(String::as_str) {
        Some("--example") => {
            print_example_config();
            Ok(())
        }
        Some("encode") => match args.get(2) {
            Some(path) => encode(Path::new(path)),
            None => {
                print_usage(&args[0]);
                std::process::exit(1);
            }
        },
        Some("play") => play(&container_arg(&args)),
        Some("info") => info(&container_arg(&args)),
        _ => {
            print_usage(&args[0]);
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <command> [args]", program);
    eprintln!();
    eprintln!("Encode numbered images into a moonframe container and play it back.");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  encode <config.json>  Encode frames described by the configuration");
    eprintln!("  play [data.bin]       Play a container in the terminal");
    eprintln!("  info [data.bin]       Print the header and verify every frame");
    eprintln!("  --example             Print an example configuration");
}

fn container_arg(args: &[String]) -> PathBuf {
    PathBuf::from(args.get(2).map_or(DEFAULT_CONTAINER, String::as_str))
}

fn encode(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config_str = fs::read_to_string(config_path)
        .map_err(|e| format!("Error reading config file: {}", e))?;
    let config: EncoderConfig =
        serde_json::from_str(&config_str).map_err(|e| format!("Error parsing config: {}", e))?;
    config.validate()?;

    let (source_width, source_height) = config.source_dimensions();
    println!("Moonframe Encoder");
    println!("=================");
    println!(
        "Grid: {}x{} (source {}x{})",
        config.width, config.height, source_width, source_height
    );
    println!("Frame rate: {}", config.framerate);
    println!("Frames: {}", config.frames_dir.display());
    println!();

    let start = Instant::now();
    let mut recorder = AnimationRecorder::new(config.width, config.height, config.framerate)?;
    let source = ImageSequence::new(&config.frames_dir, config.first_index, &config.extension);
    let count = recorder.record_all(source)?;
    info!("Converted {} frames", count);
    if count == 0 {
        warn!(
            "No frames found at {}",
            ImageSequence::new(&config.frames_dir, config.first_index, &config.extension)
                .path_for(config.first_index)
                .display()
        );
    }

    let stats = recorder.finalize_to_path(&config.output)?;
    println!("Wrote {}: {}", config.output.display(), stats);
    println!("Time: {:.2}s", start.elapsed().as_secs_f32());
    Ok(())
}

fn play(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut player = AnimationPlayer::open(path)?;

    let cancel = CancelToken::new();
    if let Err(e) = cancel.install_signal_handlers() {
        warn!("Failed to register signal handlers: {}", e);
    }

    let mut renderer = MoonRenderer::stdout();
    let stats = player.run(&mut SystemClock::start(), &mut renderer, &cancel)?;
    info!("{}", stats);
    Ok(())
}

fn info(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut player = AnimationPlayer::open(path)?;
    let header = *player.header();

    println!("Container: {}", path.display());
    println!("Grid: {}x{}", header.width, header.height);
    println!("Frame rate: {}", header.framerate);
    println!("Frames: {}", header.frame_count);
    println!("Duration: {:.2}s", header.duration().as_secs_f32());
    println!("Packed frame size: {} bytes", header.packed_size());

    let mut verified = 0;
    for frame in player.frames() {
        frame?;
        verified += 1;
    }
    println!("Verified {} frames", verified);
    Ok(())
}

fn print_example_config() {
    let config = EncoderConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
