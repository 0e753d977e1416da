use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use log::{error, info};
use rayon::prelude::*;

use seeds_superpixels_lib::{
    get_image_files_in_dir, load_image, process_image, write_summary_csv, ColorSpace, Config,
    Connectivity, OutputKind, SegmentationSummary, SeedsError,
};

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about = "SEEDS - Superpixels extracted via energy-driven sampling")]
struct Args {
    /// Image file or directory of images to process
    input: Option<String>,

    /// Output directory (default: output)
    #[clap(short, long)]
    output: Option<String>,

    /// Optional TOML configuration file; flags override its values
    #[clap(short, long)]
    config: Option<String>,

    /// Number of bins used for color histograms (default: 5)
    #[clap(long)]
    bins: Option<u32>,

    /// Neighborhood size used for the smoothing prior (default: 1)
    #[clap(long)]
    neighborhood: Option<u32>,

    /// Minimum confidence used for block updates (default: 0.1)
    #[clap(long)]
    confidence: Option<f32>,

    /// Iterations at each level (default: 2)
    #[clap(long)]
    iterations: Option<u32>,

    /// Spatial weight (default: 0.25)
    #[clap(long)]
    spatial_weight: Option<f32>,

    /// Desired number of superpixels (default: 400)
    #[clap(long)]
    superpixels: Option<u32>,

    /// Color space the histograms are built in (default: bgr)
    #[clap(long, value_enum)]
    color_space: Option<ColorSpaceArg>,

    /// Use 8-connected block neighborhoods
    #[clap(long)]
    eight_connected: bool,

    /// Split disconnected superpixels into separate labels
    #[clap(long)]
    relabel: bool,

    /// Process directory images one after another
    #[clap(long)]
    sequential: bool,

    /// Show additional information while processing
    #[clap(short, long)]
    verbose: bool,

    /// Save segmentation as CSV file
    #[clap(long)]
    csv: bool,

    /// Save contour image of segmentation
    #[clap(long)]
    contour: bool,

    /// Save label image of segmentation
    #[clap(long)]
    labels: bool,

    /// Save mean colored image of segmentation
    #[clap(long)]
    mean: bool,

    /// Save label indexes as 16-bit image
    #[clap(long)]
    index: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorSpaceArg {
    Rgb,
    Bgr,
    Hsv,
    Lab,
}

impl From<ColorSpaceArg> for ColorSpace {
    fn from(arg: ColorSpaceArg) -> Self {
        match arg {
            ColorSpaceArg::Rgb => ColorSpace::Rgb,
            ColorSpaceArg::Bgr => ColorSpace::Bgr,
            ColorSpaceArg::Hsv => ColorSpace::Hsv,
            ColorSpaceArg::Lab => ColorSpace::Lab,
        }
    }
}

/// Fold command-line overrides into the loaded configuration
fn apply_args(config: &mut Config, args: &Args) {
    if let Some(input) = args.input.clone() {
        config.input_path = input;
    }
    if let Some(output) = args.output.clone() {
        config.output_base_dir = output;
    }
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }

    let engine = &mut config.engine;
    if let Some(bins) = args.bins {
        engine.bins = bins;
    }
    if let Some(neighborhood) = args.neighborhood {
        engine.neighborhood = neighborhood;
    }
    if let Some(confidence) = args.confidence {
        engine.confidence = confidence;
    }
    if let Some(spatial_weight) = args.spatial_weight {
        engine.spatial_weight = spatial_weight;
    }
    if let Some(superpixels) = args.superpixels {
        engine.superpixels = superpixels;
    }
    if let Some(color_space) = args.color_space {
        engine.color_space = color_space.into();
    }
    if args.eight_connected {
        engine.connectivity = Connectivity::Eight;
    }

    if args.relabel {
        config.relabel_connected = true;
    }
    if args.sequential {
        config.use_parallel = false;
    }

    let requested = [
        (args.contour, OutputKind::Contour),
        (args.labels, OutputKind::Labels),
        (args.mean, OutputKind::Mean),
        (args.index, OutputKind::Index),
        (args.csv, OutputKind::Csv),
    ];
    for (flag, kind) in requested {
        if flag && !config.wants(kind) {
            config.outputs.push(kind);
        }
    }
}

fn run_one(path: &Path, config: &Config) -> anyhow::Result<SegmentationSummary> {
    let input_image = load_image(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let summary = process_image(input_image, config)
        .with_context(|| format!("failed to segment {}", path.display()))?;
    Ok(summary)
}

fn main() -> anyhow::Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.kind() == clap::error::ErrorKind::DisplayHelp => {
            let _ = e.print();
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    apply_args(&mut config, &args);
    config.validate()?;

    let input_path = PathBuf::from(&config.input_path);
    let files = if input_path.is_file() {
        vec![input_path.clone()]
    } else if input_path.is_dir() {
        let files = get_image_files_in_dir(&input_path)?;
        info!("Found {} images in {}", files.len(), input_path.display());
        files
    } else {
        return Err(SeedsError::InvalidPath(input_path).into());
    };

    let start_time = Instant::now();

    let results: Vec<anyhow::Result<SegmentationSummary>> = if config.use_parallel {
        files.par_iter().map(|path| run_one(path, &config)).collect()
    } else {
        files.iter().map(|path| run_one(path, &config)).collect()
    };

    let mut summaries = Vec::with_capacity(results.len());
    let mut failures = 0;
    for result in results {
        match result {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                error!("{:#}", e);
                failures += 1;
            }
        }
    }

    if input_path.is_dir() && config.wants(OutputKind::Csv) {
        write_summary_csv(&summaries, &config.output_base_dir)?;
    }

    println!("{} seconds needed ...", start_time.elapsed().as_secs_f64());

    if failures > 0 {
        bail!("{} of {} images failed", failures, files.len());
    }

    Ok(())
}
