//! Spectral-subtraction denoiser CLI

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use denoise_rs::audio::{read_wav, BlockChunker, StopReason};
use denoise_rs::config::ReportFormat;
use denoise_rs::{
    block_queue, overlay_dataset, AudioCapture, Config, DenoiseSession, ReportWriter,
    SubtractionParams,
};

/// Real-time spectral-subtraction denoiser
#[derive(Parser)]
#[command(name = "denoise-rs")]
#[command(about = "Real-time spectral-subtraction denoising and noisy dataset tools")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Denoise the microphone until Ctrl+C, then save the result
    Run {
        /// Audio input device name (uses default if not specified)
        #[arg(short, long)]
        device: Option<String>,

        /// Output WAV file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report format (text, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Bound the block queue; blocks are dropped when it is full
        #[arg(long)]
        queue_capacity: Option<usize>,

        /// Do not print the waveform of the saved audio
        #[arg(long)]
        no_waveform: bool,
    },

    /// List available audio input devices
    Devices,

    /// Denoise a WAV file through the same streaming pipeline
    Denoise {
        /// Input WAV file path
        input: PathBuf,

        /// Output WAV file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report format (text, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Do not print the waveform of the saved audio
        #[arg(long)]
        no_waveform: bool,
    },

    /// Mix a looped noise recording into every clip of a folder
    Overlay {
        /// Folder with clean WAV files
        #[arg(long)]
        clean_dir: Option<PathBuf>,

        /// Noise recording
        #[arg(long)]
        noise: Option<PathBuf>,

        /// Destination folder
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Noise attenuation in dB
        #[arg(short, long)]
        attenuation: Option<f32>,
    },

    /// Transcribe a WAV file with Whisper
    #[cfg(feature = "whisper")]
    Transcribe {
        /// Input WAV file path
        input: PathBuf,

        /// Path to Whisper model file
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Language code (e.g., kn, en, hi)
        #[arg(short, long)]
        language: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging - quiet by default, use -v for more
    let log_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    let mut config = if let Some(ref config_path) = cli.config {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        Config::default()
    };

    match cli.command {
        Commands::Run {
            device,
            output,
            format,
            queue_capacity,
            no_waveform,
        } => {
            if let Some(device) = device {
                config.audio.device = Some(device);
            }
            if let Some(output) = output {
                config.output.output_path = output;
            }
            if let Some(format) = format {
                config.output.report_format = parse_format(&format)?;
            }
            if queue_capacity.is_some() {
                config.denoise.queue_capacity = queue_capacity;
            }
            if no_waveform {
                config.output.show_waveform = false;
            }
            config.validate()?;
            run_realtime(config)
        }
        Commands::Devices => list_devices(),
        Commands::Denoise {
            input,
            output,
            format,
            no_waveform,
        } => {
            if let Some(output) = output {
                config.output.output_path = output;
            }
            if let Some(format) = format {
                config.output.report_format = parse_format(&format)?;
            }
            if no_waveform {
                config.output.show_waveform = false;
            }
            config.validate()?;
            denoise_file(config, input)
        }
        Commands::Overlay {
            clean_dir,
            noise,
            output_dir,
            attenuation,
        } => {
            if let Some(clean_dir) = clean_dir {
                config.overlay.clean_dir = clean_dir;
            }
            if let Some(noise) = noise {
                config.overlay.noise_file = noise;
            }
            if let Some(output_dir) = output_dir {
                config.overlay.output_dir = output_dir;
            }
            if let Some(attenuation) = attenuation {
                config.overlay.attenuation_db = attenuation;
            }
            make_noisy_dataset(config)
        }
        #[cfg(feature = "whisper")]
        Commands::Transcribe {
            input,
            model,
            language,
        } => {
            if let Some(model) = model {
                config.pipeline.model_path = model;
            }
            if let Some(language) = language {
                config.pipeline.asr_language = language;
            }
            transcribe_file(config, input)
        }
    }
}

fn parse_format(format: &str) -> Result<ReportFormat> {
    format
        .parse()
        .with_context(|| format!("Unknown report format '{}'", format))
}

fn session_for(config: &Config, input_rate: u32) -> Result<DenoiseSession> {
    let session = DenoiseSession::new(
        SubtractionParams::from(&config.denoise),
        config.audio.sample_rate,
    )
    .context("Failed to create denoise session")?
    .with_input_rate(input_rate)
    .context("Failed to create resampler")?;
    Ok(session)
}

fn save_and_report(mut session: DenoiseSession, config: &Config) -> Result<()> {
    let audio = session.output().concat();
    let summary = session
        .finalize(&config.output.output_path)
        .context("Failed to save enhanced audio")?;

    let mut report =
        ReportWriter::new(config.output.clone()).context("Failed to create report writer")?;
    report.write(&summary, &audio)?;
    Ok(())
}

/// Denoise live microphone input until interrupted
fn run_realtime(config: Config) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    let s = stop.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        s.store(true, Ordering::SeqCst);
    })?;

    let (sender, receiver) = block_queue(config.denoise.queue_capacity);
    if let Some(capacity) = config.denoise.queue_capacity {
        warn!(
            "Block queue bounded to {} blocks; blocks are dropped when processing falls behind",
            capacity
        );
    }

    let mut capture =
        AudioCapture::new(config.audio.clone()).context("Failed to create audio capture")?;
    capture.init().context("Failed to initialize audio capture")?;

    let mut session = session_for(&config, capture.actual_sample_rate())?;
    session.start()?;

    capture.start(sender).context("Failed to start audio capture")?;
    println!("Recording... Press Ctrl+C to stop.");

    let reason = session.run(&receiver, &stop)?;
    capture.stop();

    if reason == StopReason::QueueClosed {
        warn!("Capture stream closed unexpectedly");
    }

    let stats = capture.stats();
    if stats.stream_faults > 0 || stats.blocks_dropped > 0 {
        warn!(
            "Capture faults: {}, dropped blocks: {}, last fault: {}",
            stats.stream_faults,
            stats.blocks_dropped,
            stats.last_fault.as_deref().unwrap_or("-")
        );
    }
    info!(
        "Captured {} blocks, {} still queued",
        stats.blocks_captured,
        receiver.len()
    );

    println!("Stopping and saving...");
    save_and_report(session, &config)
}

/// List available audio input devices
fn list_devices() -> Result<()> {
    let capture = AudioCapture::new(denoise_rs::AudioConfig::default())?;
    let devices = capture.list_devices()?;

    if devices.is_empty() {
        println!("No audio input devices found");
    } else {
        println!("Available audio input devices:");
        for (i, name) in devices.iter().enumerate() {
            println!("  {}. {}", i + 1, name);
        }
    }

    Ok(())
}

/// Feed a WAV file through the block queue in capture-sized blocks
fn denoise_file(config: Config, input_path: PathBuf) -> Result<()> {
    info!("Denoising: {}", input_path.display());

    let clip = read_wav(&input_path)
        .with_context(|| format!("Failed to open WAV file {}", input_path.display()))?;
    info!(
        "WAV format: {} channels, {} Hz, {:.2}s",
        clip.channels,
        clip.sample_rate,
        clip.duration_secs()
    );

    let (sender, receiver) = block_queue(None);
    let mut chunker = BlockChunker::new(config.audio.block_size as usize, clip.channels);
    for block in chunker.feed(&clip.samples) {
        sender.push(block);
    }
    if chunker.pending() > 0 {
        info!("Ignoring {} trailing samples shorter than a block", chunker.pending());
    }
    drop(sender);

    let mut session = session_for(&config, clip.sample_rate)?;
    let stop = AtomicBool::new(false);
    session.run(&receiver, &stop)?;

    save_and_report(session, &config)
}

/// Build the noisy dataset
fn make_noisy_dataset(config: Config) -> Result<()> {
    let overlay = &config.overlay;
    if !overlay.clean_dir.is_dir() {
        anyhow::bail!(
            "Clean dataset folder '{}' not found",
            overlay.clean_dir.display()
        );
    }
    if !overlay.noise_file.is_file() {
        anyhow::bail!("Noise file '{}' not found", overlay.noise_file.display());
    }

    let report = overlay_dataset(
        &overlay.clean_dir,
        &overlay.noise_file,
        &overlay.output_dir,
        overlay.attenuation_db,
    )
    .context("Failed to build noisy dataset")?;

    for path in &report.written {
        println!("Saved: {}", path.display());
    }
    if !report.skipped.is_empty() {
        println!("Skipped {} unsupported files", report.skipped.len());
    }
    Ok(())
}

/// Transcribe a WAV file
#[cfg(feature = "whisper")]
fn transcribe_file(config: Config, input_path: PathBuf) -> Result<()> {
    use denoise_rs::pipeline::{load_speech_audio, Transcriber, WhisperTranscriber};

    let samples = load_speech_audio(&input_path, config.pipeline.sample_rate)
        .with_context(|| format!("Failed to load audio from {}", input_path.display()))?;

    let transcriber =
        WhisperTranscriber::new(&config.pipeline).context("Failed to load Whisper model")?;
    let text = transcriber.transcribe(&samples, &config.pipeline.asr_language)?;

    if text.trim().is_empty() {
        println!("No speech detected in the audio file.");
    } else {
        println!("{}", text);
    }
    Ok(())
}
