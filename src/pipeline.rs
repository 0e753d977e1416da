// src/pipeline.rs - Segment one decoded image and write the requested outputs

use std::path::PathBuf;
use std::time::Instant;

use log::{debug, info};

use crate::config::{Config, OutputKind};
use crate::draw::{contour_image, index_image, label_image, mean_image};
use crate::errors::Result;
use crate::image_io::{InputImage, save_image, save_index_image};
use crate::integrity::{count_labels, count_superpixels, relabel_connected};
use crate::output::{write_labels_csv, SegmentationSummary};
use crate::pixel_grid::PixelGrid;
use crate::seeds::Seeds;

/// Run SEEDS on one image and write every output enabled in `config`
pub fn process_image(input_image: InputImage, config: &Config) -> Result<SegmentationSummary> {
    let InputImage { image, path, filename } = input_image;
    let (width, height) = image.dimensions();

    debug!("Segmenting {} ({}x{}, {})", path.display(), width, height, config.engine.color_space);

    // Step 1: Samples in the configured color space
    let grid = PixelGrid::from_rgb_image(&image, config.engine.color_space);

    // Step 2: Initialize and refine
    let start_time = Instant::now();
    let mut seeds = Seeds::new(&grid, config.engine.clone())?;
    seeds.initialize()?;
    let initial_labels = seeds.number_of_labels()?;
    let report = seeds.iterate(config.iterations)?;
    let seconds = start_time.elapsed().as_secs_f64();

    for level in &report.levels {
        let accepted: usize = level.sweeps.iter().map(|s| s.accepted).sum();
        debug!(
            "  level {} ({}x{} blocks): {} moves",
            level.level, level.block_width, level.block_height, accepted
        );
    }

    // Step 3: Optional split of disconnected superpixels
    let labels = if config.relabel_connected {
        relabel_connected(seeds.labels()?)
    } else {
        seeds.into_labels()?
    };

    let superpixels = count_superpixels(&labels);
    info!(
        "{} superpixels for {} ({} moves, {:.3} seconds)",
        superpixels,
        path.display(),
        report.accepted(),
        seconds
    );

    // Step 4: Outputs
    let output_dir = PathBuf::from(&config.output_base_dir);
    if !config.outputs.is_empty() {
        std::fs::create_dir_all(&output_dir)?;
    }

    if config.wants(OutputKind::Contour) {
        let store = output_dir.join(format!("{}_contour.png", filename));
        save_image(&contour_image(&labels, &image, config.contour_color_rgb)?, &store)?;
        debug!("Image {} with contours saved to {}", path.display(), store.display());
    }

    if config.wants(OutputKind::Labels) {
        let store = output_dir.join(format!("{}_labels.png", filename));
        save_image(&label_image(&labels), &store)?;
        debug!("Image {} with labels saved to {}", path.display(), store.display());
    }

    if config.wants(OutputKind::Mean) {
        let store = output_dir.join(format!("{}_mean.png", filename));
        save_image(&mean_image(&labels, &image)?, &store)?;
        debug!("Image {} with mean colors saved to {}", path.display(), store.display());
    }

    if config.wants(OutputKind::Index) {
        let store = output_dir.join(format!("{}_index.png", filename));
        save_index_image(&index_image(&labels)?, &store)?;
        debug!("Image {} with indexed labels saved to {}", path.display(), store.display());
    }

    if config.wants(OutputKind::Csv) {
        write_labels_csv(&labels, &output_dir, &filename)?;
        debug!("Image {} labels saved as CSV to {}", path.display(), output_dir.display());
    }

    Ok(SegmentationSummary {
        filename,
        width,
        height,
        initial_labels,
        labels: count_labels(&labels),
        superpixels,
        accepted_moves: report.accepted(),
        seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn process_image_writes_requested_outputs() {
        let dir = std::env::temp_dir().join(format!("seeds_pipeline_test_{}", std::process::id()));
        let image = RgbImage::from_fn(16, 12, |x, _| if x < 7 { Rgb([250, 20, 20]) } else { Rgb([20, 20, 250]) });

        let config = Config {
            output_base_dir: dir.to_string_lossy().into_owned(),
            outputs: vec![OutputKind::Contour, OutputKind::Mean, OutputKind::Csv],
            engine: crate::config::SeedsConfig { superpixels: 4, ..Default::default() },
            ..Config::default()
        };

        let input = InputImage { image, path: PathBuf::from("halves.png"), filename: "halves".to_string() };
        let summary = process_image(input, &config).unwrap();

        assert_eq!((summary.width, summary.height), (16, 12));
        assert!(summary.superpixels >= summary.labels);
        assert!(dir.join("halves_contour.png").exists());
        assert!(dir.join("halves_mean.png").exists());
        assert!(dir.join("halves.csv").exists());
        assert!(!dir.join("halves_labels.png").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
