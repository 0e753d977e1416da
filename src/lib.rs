// src/lib.rs - Library interface for SEEDS superpixels

pub mod config;
pub mod draw;
pub mod errors;
pub mod exchange;
pub mod hierarchy;
pub mod histogram;
pub mod image_io;
pub mod integrity;
pub mod label_map;
pub mod output;
pub mod partition;
pub mod pipeline;
pub mod pixel_grid;
pub mod seeds;

// Re-export commonly used types and functions
pub use errors::{SeedsError, Result};
pub use config::{Config, OutputKind, SeedsConfig};
pub use pipeline::process_image;
pub use image_io::{InputImage, get_image_files_in_dir, load_image, save_image};

// Engine
pub use seeds::{IterationReport, LevelReport, Seeds, SweepStats};
pub use pixel_grid::{ColorSpace, PixelGrid};
pub use label_map::LabelMap;
pub use hierarchy::{Block, BlockHierarchy, Connectivity, Level, Rect};
pub use histogram::{HistogramModel, RegionHistogram};
pub use partition::Partition;
pub use exchange::{Evaluation, ExchangeEvaluator, Proposal};

// Diagnostics and renderers
pub use integrity::{count_labels, count_superpixels, relabel_connected};
pub use draw::{contour_image, index_image, label_image, mean_image};
pub use output::{SegmentationSummary, write_labels_csv, write_summary_csv};
