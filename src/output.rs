use std::fs;
use std::path::Path;
use csv::{Writer, WriterBuilder};

use crate::errors::Result;
use crate::label_map::LabelMap;

/// Per-image results of a batch run
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationSummary {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    /// Label ids handed out at initialization
    pub initial_labels: usize,
    /// Label ids still in use after refinement
    pub labels: usize,
    /// Connected components of the final label map
    pub superpixels: usize,
    pub accepted_moves: usize,
    pub seconds: f64,
}

/// Write the label map as CSV, one record per image row
pub fn write_labels_csv<P: AsRef<Path>>(
    labels: &LabelMap,
    output_dir: P,
    filename: &str,
) -> Result<()> {
    let output_path = output_dir.as_ref().join(format!("{}.csv", filename));

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(&output_path)?;

    for row in labels.rows() {
        writer.write_record(row.iter().map(|label| label.to_string()))?;
    }

    writer.flush()?;

    Ok(())
}

/// Write one summary record per processed image
pub fn write_summary_csv<P: AsRef<Path>>(
    summaries: &[SegmentationSummary],
    output_dir: P,
) -> Result<()> {
    let output_path = output_dir.as_ref().join("summary.csv");

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = Writer::from_path(&output_path)?;

    writer.write_record([
        "Filename",
        "Width",
        "Height",
        "Initial_Labels",
        "Labels",
        "Superpixels",
        "Accepted_Moves",
        "Seconds",
    ])?;

    for summary in summaries {
        writer.write_record(&[
            summary.filename.clone(),
            summary.width.to_string(),
            summary.height.to_string(),
            summary.initial_labels.to_string(),
            summary.labels.to_string(),
            summary.superpixels.to_string(),
            summary.accepted_moves.to_string(),
            format!("{:.6}", summary.seconds),
        ])?;
    }

    writer.flush()?;

    Ok(())
}
