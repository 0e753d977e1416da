// src/config.rs - Engine tunables and batch/CLI configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{SeedsError, Result};
use crate::hierarchy::Connectivity;
use crate::pixel_grid::ColorSpace;

/// The immutable set of tunables handed to the engine at construction
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SeedsConfig {
    /// Desired number of superpixels
    #[serde(default = "default_superpixels")]
    pub superpixels: u32,

    /// Number of histogram bins per channel
    #[serde(default = "default_bins")]
    pub bins: u32,

    /// Radius (Chebyshev) of the window used by the smoothing prior
    #[serde(default = "default_neighborhood")]
    pub neighborhood: u32,

    /// Minimum gain an exchange must exceed to be committed, in (0, 1]
    #[serde(default = "default_confidence")]
    pub confidence: f32,

    /// Weight of the smoothing prior relative to the color term
    #[serde(default = "default_spatial_weight")]
    pub spatial_weight: f32,

    /// Which same-level blocks count as neighbors
    #[serde(default)]
    pub connectivity: Connectivity,

    /// Tag describing the channels of the pixel grid (not interpreted by the engine)
    #[serde(default)]
    pub color_space: ColorSpace,
}

fn default_superpixels() -> u32 {
    400
}

fn default_bins() -> u32 {
    5
}

fn default_neighborhood() -> u32 {
    1
}

fn default_confidence() -> f32 {
    0.1
}

fn default_spatial_weight() -> f32 {
    0.25
}

impl Default for SeedsConfig {
    fn default() -> Self {
        Self {
            superpixels: default_superpixels(),
            bins: default_bins(),
            neighborhood: default_neighborhood(),
            confidence: default_confidence(),
            spatial_weight: default_spatial_weight(),
            connectivity: Connectivity::default(),
            color_space: ColorSpace::default(),
        }
    }
}

impl SeedsConfig {
    /// Reject configurations the engine cannot run with. Nothing is clamped.
    pub fn validate(&self) -> Result<()> {
        if self.superpixels == 0 {
            return Err(SeedsError::Config("superpixels must be > 0".to_string()));
        }

        if self.bins == 0 {
            return Err(SeedsError::Config("bins must be > 0".to_string()));
        }

        if self.bins > 256 {
            return Err(SeedsError::Config(
                "bins must be <= 256 for 8-bit samples".to_string(),
            ));
        }

        if self.neighborhood == 0 {
            return Err(SeedsError::Config("neighborhood must be > 0".to_string()));
        }

        if !(self.confidence > 0.0 && self.confidence <= 1.0) {
            return Err(SeedsError::Config(format!(
                "confidence must be in (0, 1], got {}",
                self.confidence
            )));
        }

        // Zero is allowed and turns the smoothing prior off
        if !self.spatial_weight.is_finite() || self.spatial_weight < 0.0 {
            return Err(SeedsError::Config(format!(
                "spatial_weight must be a finite value >= 0, got {}",
                self.spatial_weight
            )));
        }

        Ok(())
    }
}

/// Renderings and exports that can be produced for a segmented image
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Original image with label boundaries painted in `contour_color_rgb`
    Contour,
    /// One flat color per label
    Labels,
    /// Each label filled with its mean color
    Mean,
    /// 16-bit image holding the raw label ids
    Index,
    /// Label map as CSV, one row per image row
    Csv,
}

/// Configuration for a batch run of the command line tool
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_input_path")]
    pub input_path: String,

    #[serde(default = "default_output_base_dir")]
    pub output_base_dir: String,

    /// Exchange sweeps per hierarchy level
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    #[serde(default)]
    pub outputs: Vec<OutputKind>,

    #[serde(default = "default_contour_color_rgb")]
    pub contour_color_rgb: [u8; 3],

    /// Split disconnected superpixels into separate labels before writing outputs
    #[serde(default)]
    pub relabel_connected: bool,

    #[serde(default = "default_parallel")]
    pub use_parallel: bool,

    #[serde(default)]
    pub engine: SeedsConfig,
}

fn default_input_path() -> String {
    "./input".to_string()
}

fn default_output_base_dir() -> String {
    "output".to_string()
}

fn default_iterations() -> u32 {
    2
}

fn default_contour_color_rgb() -> [u8; 3] {
    [204, 0, 0]
}

fn default_parallel() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            output_base_dir: default_output_base_dir(),
            iterations: default_iterations(),
            outputs: Vec::new(),
            contour_color_rgb: default_contour_color_rgb(),
            relabel_connected: false,
            use_parallel: default_parallel(),
            engine: SeedsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SeedsError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        let config: Config = toml::from_str(&content).map_err(|source| SeedsError::ConfigLoad {
            source,
            path: path.to_path_buf(),
        })?;

        Ok(config)
    }

    pub fn wants(&self, kind: OutputKind) -> bool {
        self.outputs.contains(&kind)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let input_path = PathBuf::from(&self.input_path);
        if !input_path.exists() {
            return Err(SeedsError::InvalidPath(input_path));
        }

        if self.iterations == 0 {
            return Err(SeedsError::Config("iterations must be > 0".to_string()));
        }

        self.engine.validate()
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            SeedsError::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content)?;

        Ok(())
    }
}
