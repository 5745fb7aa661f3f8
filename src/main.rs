//! Ember daemon entrypoint

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use ember_companion::audio::{mean_abs_amplitude, AudioPlayback, SAMPLE_RATE};
use ember_companion::voice::{profile_for_mood, OpenAiTts, Synthesizer};
use ember_companion::{Config, Daemon};

#[derive(Parser)]
#[command(name = "ember", version, about = "Always-listening spoken-conversation companion")]
struct Cli {
    /// Path to a config file (defaults to ember.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Terminal-only conversation, no microphone or speaker
    Chat,
    /// Record from the microphone and report signal level
    TestMic {
        /// Seconds to record
        #[arg(short, long, default_value_t = 3)]
        duration: u64,
    },
    /// Play a short tone through the speaker
    TestSpeaker,
    /// Synthesize and play one line of text
    TestTts {
        /// Text to speak
        text: String,
    },
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => "info,ember_companion=info",
        1 => "info,ember_companion=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        None => Daemon::new(config).run().await?,
        Some(Command::Chat) => Daemon::new(config).run_text_only().await?,
        Some(Command::TestMic { duration }) => test_mic(duration).await?,
        Some(Command::TestSpeaker) => test_speaker()?,
        Some(Command::TestTts { text }) => test_tts(&config, &text).await?,
    }

    Ok(())
}

async fn test_mic(duration: u64) -> anyhow::Result<()> {
    use ember_companion::audio::AudioCapture;

    let (mut capture, mut frames) = AudioCapture::new()?;
    capture.start()?;
    println!("Recording for {duration} seconds...");

    let mut samples = Vec::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(duration);
    while let Ok(Some(frame)) = tokio::time::timeout_at(deadline, frames.recv()).await {
        samples.extend_from_slice(&frame);
    }
    capture.stop();

    let level = mean_abs_amplitude(&samples);
    println!(
        "Captured {} samples, mean level {level:.4} ({})",
        samples.len(),
        if level < 0.001 {
            "very quiet, check your microphone"
        } else {
            "looks fine"
        }
    );
    Ok(())
}

fn test_speaker() -> anyhow::Result<()> {
    let playback = AudioPlayback::new()?;

    #[allow(clippy::cast_precision_loss)]
    let tone: Vec<f32> = (0..SAMPLE_RATE)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            (t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 0.2
        })
        .collect();

    println!("Playing a one-second tone...");
    playback.play(tone)?;
    println!("Done.");
    Ok(())
}

async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    let synthesizer: Arc<dyn Synthesizer> = Arc::new(OpenAiTts::new(
        config.api_keys.openai.clone(),
        config.voice.tts_voice.clone(),
        config.voice.tts_model.clone(),
    )?);

    println!("Synthesizing...");
    let mp3 = synthesizer
        .synthesize(text, profile_for_mood("neutral"))
        .await?;

    let playback = AudioPlayback::new()?;
    playback.play_mp3(&mp3)?;
    println!("Done.");
    Ok(())
}
