//! footfall CLI: count people crossing a reference line in a frame sequence.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use footfall_rs::{
    Annotator, CentroidMode, FootfallConfig, FootfallPipeline, ImageSequenceSink,
    ImageSequenceSource, RecordedDetections,
};

#[derive(Parser)]
#[command(name = "footfall")]
#[command(about = "Count directional crossings of tracked people over a horizontal line")]
#[command(version)]
#[command(
    after_help = "The run always reads the input to the end; an interrupted process prints no totals. \
                  Stopping early at a frame boundary is only available to library callers through \
                  FootfallPipeline::stop_handle."
)]
struct Cli {
    /// Directory of input frames (png/jpg/bmp), processed in file-name order
    /// with frame numbers compared numerically.
    #[arg(long)]
    input: PathBuf,

    /// Directory for annotated output frames. Created if missing.
    #[arg(long)]
    output: PathBuf,

    /// Recorded detections, one JSON object per frame.
    #[arg(long)]
    detections: PathBuf,

    /// Treat frames missing from the detections file as detector failures.
    #[arg(long)]
    strict_detections: bool,

    /// JSON configuration file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Detection confidence threshold.
    #[arg(long)]
    conf: Option<f32>,

    /// y-coordinate of the reference line, in pixels.
    #[arg(long)]
    line_y: Option<f32>,

    /// Detector class to count (COCO person is 0).
    #[arg(long)]
    class_id: Option<u32>,

    /// Frames a track may go undetected before the tracker drops it.
    #[arg(long)]
    max_age: Option<u32>,

    /// Consecutive detections before a track is confirmed.
    #[arg(long)]
    n_init: Option<u32>,

    /// How the box midpoint is computed.
    #[arg(long, value_enum)]
    centroid: Option<CentroidArg>,

    /// TTF/OTF font for id labels and totals. Without it only boxes and the line are drawn.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Write the run summary as JSON to this path.
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CentroidArg {
    Truncate,
    Exact,
}

impl From<CentroidArg> for CentroidMode {
    fn from(arg: CentroidArg) -> Self {
        match arg {
            CentroidArg::Truncate => CentroidMode::Truncate,
            CentroidArg::Exact => CentroidMode::Exact,
        }
    }
}

impl Cli {
    fn to_config(&self) -> Result<FootfallConfig> {
        let mut config = match &self.config {
            Some(path) => FootfallConfig::from_json_file(path)?,
            None => FootfallConfig::default(),
        };
        if let Some(conf) = self.conf {
            config.confidence_threshold = conf;
        }
        if let Some(line_y) = self.line_y {
            config.line_y = line_y;
        }
        if let Some(class_id) = self.class_id {
            config.target_class = class_id;
        }
        if let Some(max_age) = self.max_age {
            config.tracker.max_age = max_age;
        }
        if let Some(n_init) = self.n_init {
            config.tracker.n_init = n_init;
        }
        if let Some(centroid) = self.centroid {
            config.centroid = centroid.into();
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("footfall_rs=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.to_config()?;

    let source = ImageSequenceSource::open(&cli.input)?;
    let mut sink = ImageSequenceSink::create(&cli.output)?;
    let detector =
        RecordedDetections::open(&cli.detections)?.require_every_frame(cli.strict_detections);

    let annotator = match &cli.font {
        Some(path) => Annotator::with_font_file(path)?,
        None => Annotator::new(),
    };

    info!(
        frames = source.len(),
        line_y = config.line_y,
        conf = config.confidence_threshold,
        max_age = config.tracker.max_age,
        "processing"
    );

    let mut pipeline =
        FootfallPipeline::with_sort_tracker(detector, config)?.with_renderer(annotator);
    let summary = pipeline.run(source, &mut sink)?;

    println!("\nProcessing finished.");
    println!("Total Entries: {}", summary.entries);
    println!("Total Exits: {}", summary.exits);
    println!("Output saved to: {}", cli.output.display());
    if summary.frames_skipped > 0 {
        println!("Skipped frames: {}", summary.frames_skipped);
    }

    if let Some(path) = &cli.summary {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, json)
            .with_context(|| format!("cannot write summary to {}", path.display()))?;
    }

    Ok(())
}
