// src/partition.rs - Label map and histograms mutated together, one whole move at a time

use crate::errors::{SeedsError, Result};
use crate::hierarchy::{BlockHierarchy, Rect};
use crate::histogram::{HistogramModel, RegionHistogram};
use crate::label_map::LabelMap;
use crate::pixel_grid::PixelGrid;

/// The current segmentation: who owns each pixel and what every label looks like.
///
/// Labels and histograms can only change through [`Partition::move_region`],
/// which updates both or neither.
#[derive(Debug, Clone)]
pub struct Partition {
    labels: LabelMap,
    histograms: HistogramModel,
}

impl Partition {
    /// One label per coarsest-level block, numbered row-major, with
    /// histograms built from a single scan of the grid.
    pub fn from_hierarchy(grid: &PixelGrid, hierarchy: &BlockHierarchy, bins: usize) -> Self {
        let (width, height) = grid.dimensions();
        let number_of_labels = hierarchy.level(0).number_of_blocks();

        let mut labels = LabelMap::filled(width, height, 0);
        let mut histograms = HistogramModel::new(number_of_labels, grid.channels(), bins);

        for (label, block) in hierarchy.blocks(0).enumerate() {
            let rect = hierarchy.block_rect(&block);
            labels.fill_rect(rect, label as u32);
            histograms.add_samples(label as u32, grid, rect);
        }

        Self { labels, histograms }
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    pub fn histograms(&self) -> &HistogramModel {
        &self.histograms
    }

    pub fn number_of_labels(&self) -> usize {
        self.histograms.number_of_labels()
    }

    pub fn into_labels(self) -> LabelMap {
        self.labels
    }

    /// Hand `rect` (whose samples are `region`) from label `from` to label `to`.
    ///
    /// Refuses, leaving everything untouched, if `rect` is not entirely owned
    /// by `from` or if the move would leave `from` without pixels.
    pub fn move_region(&mut self, rect: Rect, region: &RegionHistogram, from: u32, to: u32) -> Result<()> {
        if from == to {
            return Ok(());
        }
        if to as usize >= self.number_of_labels() {
            return Err(SeedsError::Invariant(format!("label {} does not exist", to)));
        }
        if region.size() as usize != rect.area() {
            return Err(SeedsError::Invariant(format!(
                "region histogram holds {} samples for a rectangle of {} pixels",
                region.size(),
                rect.area()
            )));
        }
        if self.labels.uniform_label(rect) != Some(from) {
            return Err(SeedsError::Invariant(format!(
                "region {:?} is not entirely owned by label {}",
                rect, from
            )));
        }
        if self.histograms.size(from) <= region.size() {
            return Err(SeedsError::Invariant(format!(
                "moving {} pixels would empty label {}",
                region.size(),
                from
            )));
        }

        self.histograms.remove_histogram(from, region)?;
        self.histograms.add_histogram(to, region);
        self.labels.fill_rect(rect, to);
        Ok(())
    }

    /// Rebuild the histograms from the label map and compare.
    pub fn check_consistency(&self, grid: &PixelGrid) -> Result<()> {
        if self.labels.dimensions() != grid.dimensions() {
            return Err(SeedsError::Invariant(format!(
                "label map is {:?} but the grid is {:?}",
                self.labels.dimensions(),
                grid.dimensions()
            )));
        }

        let number_of_labels = self.number_of_labels();
        let mut rebuilt = HistogramModel::new(number_of_labels, grid.channels(), self.histograms.bins());
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let label = self.labels.get(x, y);
                if label as usize >= number_of_labels {
                    return Err(SeedsError::Invariant(format!(
                        "pixel ({}, {}) carries out-of-range label {}",
                        x, y, label
                    )));
                }
                rebuilt.add_samples(label, grid, Rect { x0: x, y0: y, x1: x + 1, y1: y + 1 });
            }
        }

        if rebuilt != self.histograms {
            return Err(SeedsError::Invariant(
                "histograms do not match the label map".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::Connectivity;

    fn striped_grid() -> PixelGrid {
        // 4x4, left half dark, right half bright
        let data = (0..16).map(|i| if i % 4 < 2 { 0 } else { 255 }).collect();
        PixelGrid::new(4, 4, 1, data).unwrap()
    }

    fn partition(grid: &PixelGrid) -> Partition {
        let hierarchy = BlockHierarchy::new(4, 4, 4, Connectivity::Four).unwrap();
        Partition::from_hierarchy(grid, &hierarchy, 2)
    }

    fn pixel(x: u32, y: u32) -> Rect {
        Rect { x0: x, y0: y, x1: x + 1, y1: y + 1 }
    }

    #[test]
    fn initial_partition_is_one_label_per_coarse_block() {
        let grid = striped_grid();
        let partition = partition(&grid);

        assert_eq!(partition.number_of_labels(), 4);
        assert_eq!(partition.labels().as_slice(), &[0, 0, 1, 1, 0, 0, 1, 1, 2, 2, 3, 3, 2, 2, 3, 3]);
        for label in 0..4 {
            assert_eq!(partition.histograms().size(label), 4);
        }
        partition.check_consistency(&grid).unwrap();
    }

    #[test]
    fn move_region_updates_labels_and_histograms_together() {
        let grid = striped_grid();
        let mut partition = partition(&grid);
        let rect = pixel(1, 0);
        let region = RegionHistogram::from_rect(&grid, rect, 2);

        partition.move_region(rect, &region, 0, 1).unwrap();

        assert_eq!(partition.labels().get(1, 0), 1);
        assert_eq!(partition.histograms().size(0), 3);
        assert_eq!(partition.histograms().size(1), 5);
        partition.check_consistency(&grid).unwrap();
    }

    #[test]
    fn move_that_would_empty_a_label_is_refused() {
        let grid = striped_grid();
        let mut partition = partition(&grid);
        let rect = Rect { x0: 0, y0: 0, x1: 2, y1: 2 };
        let region = RegionHistogram::from_rect(&grid, rect, 2);
        let before = partition.labels().clone();

        let result = partition.move_region(rect, &region, 0, 1);

        assert!(matches!(result, Err(SeedsError::Invariant(_))));
        assert_eq!(partition.labels(), &before);
        partition.check_consistency(&grid).unwrap();
    }

    #[test]
    fn move_from_the_wrong_owner_is_refused() {
        let grid = striped_grid();
        let mut partition = partition(&grid);
        let rect = pixel(3, 3);
        let region = RegionHistogram::from_rect(&grid, rect, 2);

        let result = partition.move_region(rect, &region, 0, 1);
        assert!(matches!(result, Err(SeedsError::Invariant(_))));
        assert_eq!(partition.histograms().size(0), 4);
    }
}
