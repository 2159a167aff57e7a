// crates/framecut-cli/src/main.rs
//
// Command-line front end. Each subcommand loads the file into a fresh
// session, runs one engine operation and writes its artifact next to the
// requested output directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use framecut_core::helpers::names::{
    audio_file_name, screenshot_file_name, storyboard_archive_name,
};
use framecut_core::helpers::time::format_time;
use framecut_core::{
    CaptureSlot, DragGesture, EngineConfig, ImageFormat, MediaResult, ProfileOutcome,
};
use framecut_media::{open_session, FfmpegSession, FfmpegWorker};

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    ffmpeg_the_third::init().context("FFmpeg init failed")?;
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info { input } => run_info(&input, config),
        Commands::Frames { input, out_dir } => run_frames(&input, &out_dir, config),
        Commands::Capture { input, at, format, out_dir } => {
            run_capture(&input, at, format.into(), &out_dir, config)
        }
        Commands::Storyboard { input, format, out_dir } => {
            run_storyboard(&input, format.into(), &out_dir, config)
        }
        Commands::Audio { input, start, end, out_dir } => {
            run_audio(&input, start, end, &out_dir, config)
        }
        Commands::Profile { input, force } => run_profile(&input, force, config),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(p) => EngineConfig::from_json_file(p)
            .with_context(|| format!("loading config {}", p.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn open(input: &Path, config: EngineConfig) -> Result<FfmpegSession> {
    open_session(input, config).with_context(|| format!("loading {}", input.display()))
}

// ── Subcommands ───────────────────────────────────────────────────────────────

fn run_info(input: &Path, config: EngineConfig) -> Result<()> {
    let session = open(input, config)?;
    let src = session.source();
    println!("file      {}", src.path.display());
    println!("size      {} bytes", src.file_size);
    println!("duration  {}", format_time(session.duration()));
    println!("video     {}x{}", src.width, src.height);
    println!("audio     {}", if src.has_audio { "yes" } else { "no" });
    println!("profile   {}", describe_profile(&session.profile_outcome()));
    Ok(())
}

fn run_frames(input: &Path, out_dir: &Path, config: EngineConfig) -> Result<()> {
    let session = open(input, config)?;
    session.capture_auto_frames()?;
    let stem = session.source().stem();
    for (slot, label) in [(CaptureSlot::FirstFrame, "first"), (CaptureSlot::LastFrame, "last")] {
        if let Some(c) = session.capture_slot(slot) {
            let name = format!("{stem}_{label}.{}", c.format.extension());
            let path = write_artifact(out_dir, &name, &c.bytes)?;
            println!("{label:<5} {} → {}", format_time(c.timestamp), path.display());
        }
    }
    Ok(())
}

fn run_capture(
    input:   &Path,
    at:      Option<f64>,
    format:  ImageFormat,
    out_dir: &Path,
    config:  EngineConfig,
) -> Result<()> {
    let session = open(input, config)?;
    // A fresh session shows the first frame; no seek is needed for it.
    if let Some(t) = at {
        session.seek_interactive(t)?;
    }
    let capture = session.capture_current(format)?;
    let name = screenshot_file_name(capture.timestamp, capture.format);
    let path = write_artifact(out_dir, &name, &capture.bytes)?;
    println!(
        "{}x{} at {} → {}",
        capture.width, capture.height, format_time(capture.timestamp), path.display()
    );
    Ok(())
}

fn run_storyboard(input: &Path, format: ImageFormat, out_dir: &Path, config: EngineConfig) -> Result<()> {
    let session = Arc::new(open(input, config)?);
    let stem    = session.source().stem();
    let worker  = Arc::new(FfmpegWorker::new(Arc::clone(&session)));

    let job_id = worker.start_storyboard(format);
    {
        let worker = Arc::clone(&worker);
        ctrlc::set_handler(move || {
            eprintln!("\ncancelling storyboard…");
            worker.cancel_storyboard(job_id);
        })
        .context("installing Ctrl-C handler")?;
    }

    while let Ok(event) = worker.rx.recv() {
        match event {
            MediaResult::StoryboardProgress { job_id: id, frames_done, total, percent } if id == job_id => {
                eprint!("\r[{percent:>3}%] {frames_done}/{total} frames");
            }
            MediaResult::StoryboardDone { job_id: id, archive } if id == job_id => {
                eprintln!();
                let path = write_artifact(out_dir, &storyboard_archive_name(&stem), &archive)?;
                println!("storyboard → {}", path.display());
                return Ok(());
            }
            MediaResult::StoryboardError { job_id: id, msg, cancelled } if id == job_id => {
                eprintln!();
                if cancelled {
                    warn!("storyboard cancelled; nothing written");
                    return Ok(());
                }
                bail!("{msg}");
            }
            _ => {}
        }
    }
    bail!("media worker stopped before the storyboard finished")
}

fn run_audio(
    input:   &Path,
    start:   Option<f64>,
    end:     Option<f64>,
    out_dir: &Path,
    config:  EngineConfig,
) -> Result<()> {
    let session = open(input, config)?;
    if !session.source().has_audio {
        bail!("{} has no audio track", input.display());
    }

    let (wav, range) = if start.is_none() && end.is_none() {
        (session.extract_audio(None)?, None)
    } else {
        // Same path as dragging the handles in a UI: the trim model keeps
        // the range valid whatever values were passed.
        if let Some(s) = start { session.apply_trim(DragGesture::Start, s); }
        if let Some(e) = end   { session.apply_trim(DragGesture::End, e); }
        let r = session.trim_range();
        (session.extract_trimmed_audio()?, Some((r.start, r.end)))
    };

    let name = audio_file_name(&session.source().stem(), range);
    let path = write_artifact(out_dir, &name, &wav)?;
    println!("{} bytes → {}", wav.len(), path.display());
    Ok(())
}

fn run_profile(input: &Path, force: bool, config: EngineConfig) -> Result<()> {
    let session = open(input, config)?;
    let outcome = if force { session.profile(true) } else { session.profile_outcome() };
    println!("{}", describe_profile(&outcome));
    if let Some(p) = outcome.profile() {
        let line: Vec<String> = p.values.iter().map(|v| format!("{v:.3}")).collect();
        println!("{}", line.join(" "));
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn describe_profile(outcome: &ProfileOutcome) -> String {
    match outcome {
        ProfileOutcome::NotRun => "not run".into(),
        ProfileOutcome::Ready(p) => format!("{} buckets", p.len()),
        ProfileOutcome::Skipped { file_size, threshold } => format!(
            "skipped ({} MiB is over the {} MiB limit; use `profile --force`)",
            file_size / (1024 * 1024),
            threshold / (1024 * 1024)
        ),
        ProfileOutcome::Failed(why) => format!("failed: {why}"),
    }
}

/// Write `bytes` to `dir/name` through a temp file in the same directory, so
/// a crash never leaves a half-written artifact under the final name.
fn write_artifact(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    use std::io::Write;

    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let dest = dir.join(name);
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(&dest).with_context(|| format!("writing {}", dest.display()))?;
    info!("wrote {} ({} bytes)", dest.display(), bytes.len());
    Ok(dest)
}

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Capture stills, storyboards and audio from a local video", long_about = None)]
struct Cli {
    /// JSON engine configuration; missing keys use the defaults.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print what probing and auto profiling found.
    Info {
        input: PathBuf,
    },
    /// Save the first frame and the frame 0.1 s before the end.
    Frames {
        input: PathBuf,
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Save one still.
    Capture {
        input: PathBuf,
        /// Timestamp in seconds (default: the first frame).
        #[arg(short, long)]
        at: Option<f64>,
        #[arg(short, long, value_enum, default_value_t = Format::Png)]
        format: Format,
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Sample a frame every 0.1 s into a ZIP archive. Ctrl-C cancels.
    Storyboard {
        input: PathBuf,
        #[arg(short, long, value_enum, default_value_t = Format::Png)]
        format: Format,
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Extract the audio track (or a trimmed range of it) as 16-bit WAV.
    Audio {
        input: PathBuf,
        /// Range start in seconds.
        #[arg(long)]
        start: Option<f64>,
        /// Range end in seconds.
        #[arg(long)]
        end: Option<f64>,
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Print the amplitude profile.
    Profile {
        input: PathBuf,
        /// Decode even when the file is over the large-file threshold.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Png,
    #[value(alias = "jpg")]
    Jpeg,
}

impl From<Format> for ImageFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Png  => ImageFormat::Png,
            Format::Jpeg => ImageFormat::Jpeg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn capture_args() {
        let cli = Cli::try_parse_from(["framecut", "capture", "clip.mp4", "--at", "2.5", "-f", "jpg"]).unwrap();
        match cli.command {
            Commands::Capture { input, at, format, out_dir } => {
                assert_eq!(input, PathBuf::from("clip.mp4"));
                assert_eq!(at, Some(2.5));
                assert_eq!(format, Format::Jpeg);
                assert_eq!(out_dir, PathBuf::from("."));
            }
            other => panic!("parsed {other:?}"),
        }
    }

    #[test]
    fn config_is_global() {
        let cli = Cli::try_parse_from(["framecut", "audio", "a.mov", "--start", "1", "--end", "1.1", "--config", "cfg.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("cfg.json")));
        assert!(matches!(cli.command, Commands::Audio { start: Some(_), end: Some(_), .. }));
    }

    #[test]
    fn storyboard_format_defaults_to_png() {
        let cli = Cli::try_parse_from(["framecut", "storyboard", "a.mp4"]).unwrap();
        assert!(matches!(cli.command, Commands::Storyboard { format: Format::Png, .. }));
        assert!(Cli::try_parse_from(["framecut", "storyboard", "a.mp4", "-f", "gif"]).is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(load_config(Some(Path::new("/no/such/config.json"))).is_err());
        assert_eq!(load_config(None).unwrap(), EngineConfig::default());
    }

    #[test]
    fn artifacts_are_written_whole() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let path = write_artifact(&out, "clip.wav", b"RIFF....").unwrap();
        assert_eq!(path, out.join("clip.wav"));
        assert_eq!(std::fs::read(&path).unwrap(), b"RIFF....");
        // Only the final file remains; the temp file was renamed into place.
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 1);
    }

    #[test]
    fn skipped_profile_mentions_force() {
        let s = describe_profile(&ProfileOutcome::Skipped {
            file_size: 400 * 1024 * 1024,
            threshold: 350 * 1024 * 1024,
        });
        assert!(s.contains("400 MiB") && s.contains("350 MiB") && s.contains("--force"), "{s}");
    }
}
