use std::{env, path::PathBuf, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use filmstrip_export::Compositor;
use filmstrip_ops::{init_tracing, load_trace_file, write_artifact, TraceLibrary};
use filmstrip_sampler::{
    display_base, format_timestamp, interval_label, sample, total_duration_label,
};
use filmstrip_types::{
    config::FilmstripConfig,
    export::{ExportKind, ExportSettings},
    sampling::{DisplayFrame, SamplingPolicy},
    trace::TraceFile,
};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "filmstrip", about = "Screenshot film strips from browser performance traces")]
struct Cli {
    /// TOML config file; falls back to FILMSTRIP_CONFIG, then built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Summarise the screenshots found in one or more traces.
    Inspect {
        traces: Vec<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// List the display frames produced by the sampling policy.
    Frames {
        trace: PathBuf,
        #[command(flatten)]
        sampling: SamplingArgs,
        #[arg(long)]
        json: bool,
    },
    /// Render the sampled frames to a PNG montage or an animated GIF.
    Export {
        trace: PathBuf,
        #[arg(long, value_enum, default_value_t = FormatArg::Png)]
        format: FormatArg,
        #[command(flatten)]
        sampling: SamplingArgs,
        #[command(flatten)]
        export: ExportArgs,
        /// Give up on the export after this many seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[derive(Debug, Args)]
struct SamplingArgs {
    /// Start of the time window in ms from the first screenshot; enables range filtering.
    #[arg(long)]
    range_start_ms: Option<u64>,
    /// End of the time window in ms from the first screenshot; enables range filtering.
    #[arg(long)]
    range_end_ms: Option<u64>,
    /// Resample onto a fixed cadence of this many milliseconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval_ms: Option<u64>,
}

impl SamplingArgs {
    fn apply(&self, mut policy: SamplingPolicy) -> SamplingPolicy {
        if let Some(start) = self.range_start_ms {
            policy.use_time_range_filter = true;
            policy.range_start_ms = start;
        }
        if let Some(end) = self.range_end_ms {
            policy.use_time_range_filter = true;
            policy.range_end_ms = end;
        }
        if let Some(interval) = self.interval_ms {
            policy.use_interval_filtering = true;
            policy.interval_ms = interval;
        }
        policy
    }
}

#[derive(Debug, Args)]
struct ExportArgs {
    #[arg(long)]
    height: Option<u32>,
    #[arg(long)]
    padding: Option<u32>,
    #[arg(long)]
    no_timestamps: bool,
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl ExportArgs {
    fn apply(&self, mut settings: ExportSettings) -> ExportSettings {
        if let Some(height) = self.height.filter(|h| *h > 0) {
            settings.frame_height_px = height;
        }
        if let Some(padding) = self.padding {
            settings.padding_px = padding;
        }
        if self.no_timestamps {
            settings.show_timestamps = false;
        }
        settings
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Png,
    Gif,
}

impl From<FormatArg> for ExportKind {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Png => ExportKind::Montage,
            FormatArg::Gif => ExportKind::Animation,
        }
    }
}

#[derive(Debug, Serialize)]
struct FrameRow {
    index: usize,
    relative_time: String,
    delta_ms: f64,
    display_timestamp_micros: u64,
    captured_at_micros: u64,
    format: String,
    synthetic: bool,
}

impl From<&DisplayFrame> for FrameRow {
    fn from(frame: &DisplayFrame) -> Self {
        Self {
            index: frame.index,
            relative_time: frame.relative_time.clone(),
            delta_ms: frame.delta_ms,
            display_timestamp_micros: frame.display_timestamp_micros,
            captured_at_micros: frame.source.timestamp_micros,
            format: frame.source.format.to_string(),
            synthetic: frame.is_synthetic(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.clone());
    if let Err(err) = init_tracing(&config.ops) {
        eprintln!("Logging disabled: {err}");
    }

    match cli.command {
        Command::Inspect { traces, json } => inspect(&traces, json).await,
        Command::Frames {
            trace,
            sampling,
            json,
        } => {
            let file = load_trace_file(&trace).await?;
            let frames = sampled_frames(&file, sampling.apply(config.sampling_policy()));
            print_frames(&frames, json)
        }
        Command::Export {
            trace,
            format,
            sampling,
            export,
            timeout_secs,
        } => {
            let file = load_trace_file(&trace).await?;
            let frames = sampled_frames(&file, sampling.apply(config.sampling_policy()));
            let settings = export.apply(config.export_settings());
            let output_dir = export
                .output_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.export.output_dir));
            run_export(frames, format.into(), settings, output_dir, timeout_secs).await
        }
    }
}

async fn inspect(paths: &[PathBuf], json: bool) -> Result<()> {
    let library = TraceLibrary::new();
    for path in paths {
        match load_trace_file(path).await {
            Ok(file) => {
                library.add(file).await;
            }
            Err(err) => warn!("Skipping {}: {err}", path.display()),
        }
    }

    let listing = library.list().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }
    for entry in &listing {
        println!(
            "{}  {} screenshots over {} ({} bytes)",
            entry.name,
            entry.summary.frame_count,
            format_timestamp(entry.summary.end_time, entry.summary.start_time),
            entry.size_bytes
        );
    }
    if listing.is_empty() {
        return Err(anyhow!("no trace could be loaded"));
    }
    Ok(())
}

fn sampled_frames(file: &TraceFile, policy: SamplingPolicy) -> Vec<DisplayFrame> {
    let policy = policy.fit_to_duration(file.trace.duration_ms());
    let frames = sample(&file.trace, &policy, display_base(&file.trace, &policy));
    info!(
        "{}: showing {} of {} screenshots over {}{}",
        file.name,
        frames.len(),
        file.trace.frame_count,
        total_duration_label(&file.trace),
        if policy.use_interval_filtering {
            format!(" every {}", interval_label(policy.interval_ms))
        } else {
            String::new()
        }
    );
    frames
}

fn print_frames(frames: &[DisplayFrame], json: bool) -> Result<()> {
    let rows: Vec<FrameRow> = frames.iter().map(FrameRow::from).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for row in rows {
        println!(
            "#{:<4} {:>8}  +{:>8.1}ms  {}{}",
            row.index,
            row.relative_time,
            row.delta_ms,
            row.format,
            if row.synthetic { "  (tick)" } else { "" }
        );
    }
    Ok(())
}

async fn run_export(
    frames: Vec<DisplayFrame>,
    kind: ExportKind,
    settings: ExportSettings,
    output_dir: PathBuf,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let job =
        tokio::task::spawn_blocking(move || Compositor::new().export(kind, &frames, &settings));

    let joined = match timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), job)
            .await
            .map_err(|_| anyhow!("{kind} export did not finish within {secs}s"))?,
        None => job.await,
    };
    let artifact = joined.context("export task panicked")?.map_err(|err| {
        let other = match kind {
            ExportKind::Montage => "gif",
            ExportKind::Animation => "png",
        };
        anyhow!("{err}; retrying with --format {other} may succeed")
    })?;

    let path = write_artifact(&output_dir, &artifact).await?;
    println!("{}", path.display());
    Ok(())
}

fn load_config(from_args: Option<PathBuf>) -> FilmstripConfig {
    let from_env = env::var("FILMSTRIP_CONFIG").ok().map(PathBuf::from);
    let Some(path) = from_args.or(from_env) else {
        return FilmstripConfig::default();
    };
    match FilmstripConfig::from_file(&path) {
        Ok(cfg) => {
            if let Err(err) = cfg.validate() {
                eprintln!(
                    "Invalid config in '{}': {err}. Falling back to internal defaults.",
                    path.display()
                );
                FilmstripConfig::default()
            } else {
                cfg
            }
        }
        Err(err) => {
            eprintln!(
                "Failed to load config from '{}': {err}. Falling back to internal defaults.",
                path.display()
            );
            FilmstripConfig::default()
        }
    }
}
