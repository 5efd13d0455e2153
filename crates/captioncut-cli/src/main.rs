//! CaptionCut CLI
//!
//! Headless front end for the caption pipeline: feeds a local media file
//! through extraction and transcription, streams progress to stdout, and
//! writes the generated SRT next to the input (or to `--output`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use captioncut_core::audio::FfmpegDecoder;
use captioncut_core::captions::{export_file_name, export_srt};
use captioncut_core::media::UploadedMedia;
use captioncut_core::pipeline::{Pipeline, PipelineEvent, ProcessState};
use captioncut_core::transcribe::{CaptionStyle, GeminiConfig, GeminiTranscriber};

// =============================================================================
// CLI Definition
// =============================================================================

#[derive(Parser)]
#[command(name = "captioncut", version, about = "Generate SRT captions from audio and video files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate captions for a media file
    Generate {
        /// Input audio or video file
        input: PathBuf,

        /// Caption pacing preset (reels, standard, fast)
        #[arg(long, default_value = "reels")]
        style: CaptionStyle,

        /// Output SRT path (defaults to `<input-stem>_CaptionCut.srt` next to the input)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Gemini API key (falls back to the GEMINI_API_KEY environment variable)
        #[arg(long)]
        api_key: Option<String>,

        /// Gemini model override
        #[arg(long)]
        model: Option<String>,

        /// ffmpeg binary to use for decoding
        #[arg(long, default_value = "ffmpeg")]
        ffmpeg: String,

        /// Print a JSON run summary instead of the human-readable one
        #[arg(long)]
        json: bool,
    },

    /// List available caption styles
    Styles,
}

// =============================================================================
// Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Generate {
            input,
            style,
            output,
            api_key,
            model,
            ffmpeg,
            json,
        } => generate(input, style, output, api_key, model, ffmpeg, json).await,
        Command::Styles => {
            for style in CaptionStyle::ALL {
                println!("{:10} {}", style.id(), style.label());
            }
            Ok(())
        }
    }
}

// =============================================================================
// Generate Command
// =============================================================================

/// JSON run summary printed by `generate --json`
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    input: String,
    style: CaptionStyle,
    output: String,
    captions: Vec<captioncut_core::captions::Caption>,
}

#[allow(clippy::too_many_arguments)]
async fn generate(
    input: PathBuf,
    style: CaptionStyle,
    output: Option<PathBuf>,
    api_key: Option<String>,
    model: Option<String>,
    ffmpeg: String,
    json: bool,
) -> anyhow::Result<()> {
    let Some(api_key) = api_key.or_else(|| std::env::var("GEMINI_API_KEY").ok()) else {
        bail!("a Gemini API key is required; pass --api-key or set GEMINI_API_KEY");
    };

    let file_name = input
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid input path: {}", input.display()))?
        .to_string();

    let data = tokio::fs::read(&input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;

    let media = UploadedMedia::new(&file_name, mime_for_path(&input), data);
    if !json {
        println!(
            "{} ({:.1}MB, {})",
            media.file_name,
            media.size_mb(),
            media.mime_type
        );
    }

    let mut config = GeminiConfig::new(api_key);
    if let Some(model) = model {
        config = config.with_model(model);
    }
    let transcriber = GeminiTranscriber::new(config)?;
    let decoder = Arc::new(FfmpegDecoder::with_path(&ffmpeg));

    let mut pipeline = Pipeline::new();
    let mut events = pipeline
        .take_event_receiver()
        .context("event receiver already taken")?;
    // In JSON mode progress goes to stderr so stdout stays machine-readable.
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                PipelineEvent::Progress { fraction, message } => {
                    let line = format!("[{:3.0}%] {}", fraction * 100.0, message);
                    if json {
                        eprintln!("{line}");
                    } else {
                        println!("{line}");
                    }
                }
                PipelineEvent::StateChanged {
                    state: ProcessState::Error { message },
                } => {
                    eprintln!("error: {}", message);
                }
                PipelineEvent::StateChanged { .. } => {}
            }
        }
    });

    let run_result = pipeline.run(media, decoder, &transcriber, style).await;
    let captions = pipeline.timeline().map(|t| t.captions().to_vec());
    drop(pipeline); // closes the event channel so the printer drains and exits
    let _ = printer.await;
    run_result?;

    let captions = captions.context("pipeline completed without a timeline")?;
    let output = output.unwrap_or_else(|| input.with_file_name(export_file_name(&file_name)));
    tokio::fs::write(&output, export_srt(&captions))
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;

    if json {
        let summary = RunSummary {
            input: input.display().to_string(),
            style,
            output: output.display().to_string(),
            captions,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("wrote {} captions to {}", captions.len(), output.display());
    }
    Ok(())
}

/// Infers the declared MIME type from the file extension.
fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("aac") => "audio/aac",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}
