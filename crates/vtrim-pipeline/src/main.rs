//! VTrim command-line tool: cut clips out of a video and upload them.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vtrim_media::probe_source_duration;
use vtrim_models::{timestamp::parse_clock, ClipRange, SiteMode, SourceMedia};
use vtrim_pipeline::{PipelineConfig, PipelineRun, RunLogger};

#[derive(Debug, Parser)]
#[command(name = "vtrim", version, about = "Cut clips out of a video and upload them")]
struct Args {
    /// Source video (.mp4, .m4v or .webm)
    input: PathBuf,

    /// Clip range as START-END, in seconds or MM:SS / HH:MM:SS (repeatable)
    #[arg(long = "clip", value_parser = parse_clip)]
    clips: Vec<ClipRange>,

    /// Add this many clips by splitting the longest range
    #[arg(long, default_value_t = 0)]
    split: usize,

    /// Name clips lesson1, lesson2, ... instead of video1, video2, ...
    #[arg(long)]
    lesson: bool,

    /// Upload name for each clip, in order (repeatable)
    #[arg(long = "name")]
    names: Vec<String>,

    /// Write trimmed clips to this directory
    #[arg(long)]
    out: Option<PathBuf>,

    /// Trim only; skip the upload
    #[arg(long)]
    dry_run: bool,

    /// Source duration in seconds, when ffprobe is unavailable
    #[arg(long)]
    duration: Option<f64>,
}

fn parse_time(value: &str) -> Result<f64, String> {
    let value = value.trim();
    value
        .parse::<f64>()
        .ok()
        .or_else(|| parse_clock(value))
        .ok_or_else(|| format!("invalid time '{}'", value))
}

fn parse_clip(value: &str) -> Result<ClipRange, String> {
    let (start, end) = value
        .split_once('-')
        .ok_or_else(|| format!("expected START-END, got '{}'", value))?;
    Ok(ClipRange::new(parse_time(start)?, parse_time(end)?))
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vtrim=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn execute(args: Args, run: &mut PipelineRun) -> Result<()> {
    let engine_config = run.engine().config().clone();

    // Load the transcoder while the source is read.
    let (_, source) = tokio::join!(run.preload(), SourceMedia::from_path(&args.input));
    let source = source.with_context(|| format!("Failed to load {}", args.input.display()))?;

    let duration = match args.duration {
        Some(duration) => duration,
        None => probe_source_duration(&engine_config.ffprobe_path, &args.input)
            .await
            .context("Failed to measure source duration (pass --duration to skip probing)")?,
    };
    run.load_source(source, duration).await?;

    {
        let timeline = run.timeline_mut()?;
        for (index, clip) in args.clips.iter().enumerate() {
            if index > 0 {
                timeline.add_by_split()?;
            }
            timeline.set_range(index, *clip)?;
        }
        for _ in 0..args.split {
            timeline.add_by_split()?;
        }
        for (index, range) in timeline.ranges().iter().enumerate() {
            info!(clip = index + 1, start = range.start_time, end = range.end_time, "Clip range");
        }
    }

    let progress = RunLogger::new(run.id(), "transcode");
    let clips = run.transcode(&progress).await?.len();
    info!(clips, "Trimming finished");

    for (index, name) in args.names.iter().enumerate() {
        if index >= clips {
            warn!("Ignoring name '{}': only {} clips", name, clips);
            break;
        }
        run.rename_artifact(index, name)?;
    }

    if let Some(dir) = &args.out {
        for path in run.save_artifacts(dir).await? {
            println!("{}", path.display());
        }
    }

    if args.dry_run {
        info!("Dry run, skipping upload");
        run.close()?;
        return Ok(());
    }

    if run.uploader().is_none() {
        bail!("No upload target configured; set VTRIM_BULK_ENDPOINT or VTRIM_MEDIA_ENDPOINT and VTRIM_RECORD_ENDPOINT, or pass --dry-run");
    }

    let outcome = run.submit(&progress.stage("upload")).await?;
    for item in &outcome.items {
        match (&item.media_id, &item.record_id) {
            (Some(media), Some(record)) => {
                println!("{}\tmedia={}\trecord={}", item.file_name, media, record)
            }
            _ => println!("{}", item.file_name),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    let mut config = PipelineConfig::from_env()?;
    if args.lesson {
        config.site_mode = SiteMode::Lesson;
    }
    info!(
        site_mode = %config.site_mode,
        upload = config
            .upload
            .as_ref()
            .map(|u| u.target.strategy())
            .unwrap_or("none"),
        "Pipeline configured"
    );

    let mut run = PipelineRun::from_config(config)?;
    info!(run_id = %run.id(), "Starting vtrim");

    tokio::select! {
        result = execute(args, &mut run) => {
            if let Err(e) = &result {
                let message = e
                    .downcast_ref::<vtrim_pipeline::PipelineError>()
                    .map(|p| p.user_message())
                    .unwrap_or_else(|| format!("{:#}", e));
                error!("{}", message);
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, discarding run");
            Ok(())
        }
    }
}
