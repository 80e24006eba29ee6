//! requencer - render a clip schedule to MP3
//!
//! Clips come from a JSON schedule file (an array of
//! `{ "filename": ..., "start": ... }` objects), from repeated `--clip`
//! arguments, or both. Schedule entries come first, then `--clip` entries in
//! command-line order.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use requencer_render::config::{Config, ConfigOverrides};
use requencer_render::render::{
    parse_descriptors, AudioEncoder, ClipDescriptor, ClipPolicy, LameEncoder, RenderPipeline,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("REQUENCER_GIT_REV"),
    ", ",
    env!("REQUENCER_BUILD_PROFILE"),
    ", built ",
    env!("REQUENCER_BUILD_TIME"),
    ")"
);

/// Command-line arguments for requencer
#[derive(Parser, Debug)]
#[command(name = "requencer")]
#[command(about = "Mix WAV clips onto a timeline and encode the result as MP3")]
#[command(version, long_version = LONG_VERSION)]
struct Args {
    /// Destination MP3 file
    output: PathBuf,

    /// JSON schedule file, or "-" for stdin
    schedule: Option<PathBuf>,

    /// Extra clip as FILE@START (start in interleaved samples)
    #[arg(long = "clip", value_name = "FILE@START", value_parser = parse_clip_arg)]
    clips: Vec<ClipDescriptor>,

    /// Configuration file (overrides REQUENCER_CONFIG and default locations)
    #[arg(short, long, env = "REQUENCER_CONFIG")]
    config: Option<PathBuf>,

    /// Encoder quality, 0 (best) to 9 (fastest)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=9))]
    quality: Option<u8>,

    /// Constant bitrate instead of VBR
    #[arg(long)]
    cbr: bool,

    /// Bitrate in kbps for --cbr
    #[arg(long, requires = "cbr")]
    bitrate: Option<u32>,

    /// Handling of samples beyond the 16-bit range
    #[arg(long, value_enum)]
    clip_policy: Option<ClipPolicy>,

    /// Decode clips in parallel
    #[arg(long)]
    parallel_decode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            quality: self.quality,
            vbr: self.cbr.then_some(false),
            bitrate_kbps: self.bitrate,
            clip_policy: self.clip_policy,
            parallel_decode: self.parallel_decode.then_some(true),
            log_level: self.log_level.clone(),
        }
    }
}

/// Parse `FILE@START`, splitting at the last '@' so paths may contain one
fn parse_clip_arg(arg: &str) -> std::result::Result<ClipDescriptor, String> {
    let (file, start) = arg
        .rsplit_once('@')
        .ok_or_else(|| format!("expected FILE@START, got '{}'", arg))?;
    if file.is_empty() {
        return Err("clip file name is empty".to_string());
    }
    let start: usize = start
        .parse()
        .map_err(|_| format!("start '{}' is not a non-negative integer", start))?;
    Ok(ClipDescriptor::new(file, start))
}

fn read_schedule(path: &Path) -> Result<Vec<ClipDescriptor>> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read schedule from stdin")?;
        text
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schedule {}", path.display()))?
    };

    let value: serde_json::Value =
        serde_json::from_str(&text).context("Schedule is not valid JSON")?;
    Ok(parse_descriptors(&value)?)
}

/// True if `output` ends in `.{expected}`, ignoring case
fn extension_matches(output: &Path, expected: &str) -> bool {
    output
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(expected))
}

fn init_logging(cli_level: Option<&str>, config_level: &str) {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref(), &args.overrides())
        .context("Failed to load configuration")?;

    init_logging(args.log_level.as_deref(), &config.logging.level);
    info!("requencer {}", LONG_VERSION);
    config.log_summary();

    let mut clips = match &args.schedule {
        Some(path) => read_schedule(path)?,
        None => Vec::new(),
    };
    clips.extend(args.clips.iter().cloned());

    let encoder = LameEncoder::new();
    if !extension_matches(&args.output, encoder.extension()) {
        warn!(
            "Output {} does not end in .{}; writing {} data anyway",
            args.output.display(),
            encoder.extension(),
            encoder.extension().to_uppercase()
        );
    }

    let mut pipeline = RenderPipeline::new(config.render, encoder)
        .context("Failed to initialize render pipeline")?;
    let report = pipeline
        .render(&args.output, &clips)
        .with_context(|| format!("Failed to render {}", args.output.display()))?;

    info!(
        "Wrote {} ({} bytes, {} samples clipped)",
        args.output.display(),
        report.encode.bytes_written,
        report.overflowed
    );
    Ok(())
}
