// src/exchange.rs - Energy evaluation of block and pixel exchanges between labels

use crate::config::SeedsConfig;
use crate::hierarchy::{Block, BlockHierarchy, Rect};
use crate::histogram::RegionHistogram;
use crate::label_map::LabelMap;
use crate::partition::Partition;
use crate::pixel_grid::PixelGrid;

/// A scored reassignment of one block to a neighboring label
#[derive(Debug, Clone)]
pub struct Proposal {
    pub block: Block,
    pub rect: Rect,
    pub from: u32,
    pub to: u32,
    /// Histogram-intersection gain of `to` over `from`, in [-1, 1]
    pub color_gain: f32,
    /// Label homogeneity gain around the block, in [-1, 1]
    pub smoothness: f32,
    /// Weighted combination of both terms, in [-1, 1]
    pub gain: f32,
    pub region: RegionHistogram,
}

/// Outcome of evaluating one block
#[derive(Debug, Clone)]
pub enum Evaluation {
    /// The block covers pixels of more than one label
    Mixed,
    /// Every neighboring block has the block's own label
    Interior,
    /// The owner has no pixels outside this block
    Pinned,
    /// Best candidate did not clear the confidence threshold
    Rejected(Proposal),
    Accepted(Proposal),
}

/// Decides, for one block at a time, whether handing it to a neighboring
/// label improves color consistency and shape regularity.
///
/// Evaluation never mutates; committing an accepted proposal is the
/// caller's job via [`Partition::move_region`].
pub struct ExchangeEvaluator<'a> {
    grid: &'a PixelGrid,
    hierarchy: &'a BlockHierarchy,
    config: &'a SeedsConfig,
}

impl<'a> ExchangeEvaluator<'a> {
    pub fn new(grid: &'a PixelGrid, hierarchy: &'a BlockHierarchy, config: &'a SeedsConfig) -> Self {
        Self { grid, hierarchy, config }
    }

    /// Distinct labels of the blocks adjacent to `block` other than `owner`,
    /// in neighbor order. A neighbor's label is read at its pixel closest to
    /// `block`.
    pub fn candidate_labels(&self, labels: &LabelMap, block: &Block, owner: u32) -> Vec<u32> {
        let rect = self.hierarchy.block_rect(block);
        let mut candidates = Vec::with_capacity(4);
        for neighbor in self.hierarchy.neighbors_of(block) {
            let (x, y) = self.hierarchy.block_rect(&neighbor).closest_pixel_to(&rect);
            let label = labels.get(x, y);
            if label != owner && !candidates.contains(&label) {
                candidates.push(label);
            }
        }
        candidates
    }

    /// Balance of `to` over `from` among the pixels outside `rect` within
    /// `neighborhood` (Chebyshev distance), normalised by the ring size.
    pub fn smoothness(&self, labels: &LabelMap, rect: Rect, from: u32, to: u32) -> f32 {
        let n = self.config.neighborhood;
        let outer = Rect {
            x0: rect.x0.saturating_sub(n),
            y0: rect.y0.saturating_sub(n),
            x1: (rect.x1 + n).min(labels.width()),
            y1: (rect.y1 + n).min(labels.height()),
        };

        let ring = outer.area() - rect.area();
        if ring == 0 {
            return 0.0;
        }

        let mut balance = 0i64;
        for (x, y) in outer.pixels() {
            if rect.contains(x, y) {
                continue;
            }
            let label = labels.get(x, y);
            if label == to {
                balance += 1;
            } else if label == from {
                balance -= 1;
            }
        }

        balance as f32 / ring as f32
    }

    /// `(color + w * smoothness) / (1 + w)`, which keeps the gain in [-1, 1]
    pub fn combine(&self, color_gain: f32, smoothness: f32) -> f32 {
        let w = self.config.spatial_weight;
        (color_gain + w * smoothness) / (1.0 + w)
    }

    /// Score every candidate label for `block` and decide on the best one
    pub fn evaluate(&self, partition: &Partition, block: &Block) -> Evaluation {
        let labels = partition.labels();
        let histograms = partition.histograms();
        let rect = self.hierarchy.block_rect(block);

        let owner = match labels.uniform_label(rect) {
            Some(owner) => owner,
            None => return Evaluation::Mixed,
        };

        let candidates = self.candidate_labels(labels, block, owner);
        if candidates.is_empty() {
            return Evaluation::Interior;
        }

        if histograms.size(owner) as usize <= rect.area() {
            return Evaluation::Pinned;
        }

        // The region's own samples must not count towards its current fit
        let region = RegionHistogram::from_rect(self.grid, rect, histograms.bins());
        let current_fit = histograms.similarity_excluding(&region, owner);

        let mut best: Option<(u32, f32, f32, f32)> = None;
        for &candidate in &candidates {
            let color_gain = histograms.similarity(&region, candidate) - current_fit;
            let smoothness = if self.config.spatial_weight > 0.0 {
                self.smoothness(labels, rect, owner, candidate)
            } else {
                0.0
            };
            let gain = self.combine(color_gain, smoothness);

            if best.map_or(true, |(_, _, _, best_gain)| gain > best_gain) {
                best = Some((candidate, color_gain, smoothness, gain));
            }
        }

        // candidates is non-empty, so best is always set
        let Some((to, color_gain, smoothness, gain)) = best else {
            return Evaluation::Interior;
        };

        let proposal = Proposal {
            block: *block,
            rect,
            from: owner,
            to,
            color_gain,
            smoothness,
            gain,
            region,
        };

        if gain > self.config.confidence {
            Evaluation::Accepted(proposal)
        } else {
            Evaluation::Rejected(proposal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::Connectivity;
    use assert_approx_eq::assert_approx_eq;

    fn config(spatial_weight: f32) -> SeedsConfig {
        SeedsConfig {
            superpixels: 2,
            bins: 2,
            neighborhood: 1,
            confidence: 0.1,
            spatial_weight,
            ..SeedsConfig::default()
        }
    }

    /// 2x2 grid: left column black, right column white
    fn two_tone() -> PixelGrid {
        PixelGrid::new(2, 2, 3, vec![0, 0, 0, 255, 255, 255, 0, 0, 0, 255, 255, 255]).unwrap()
    }

    fn pixel_block(hierarchy: &BlockHierarchy, x: u32, y: u32) -> Block {
        Block { level: hierarchy.pixel_level(), row: y, col: x }
    }

    #[test]
    fn misplaced_pixel_is_moved_to_the_matching_label() {
        let grid = two_tone();
        let config = config(0.0);
        let hierarchy = BlockHierarchy::new(2, 2, 2, Connectivity::Four).unwrap();
        let partition = Partition::from_hierarchy(&grid, &hierarchy, 2);
        let evaluator = ExchangeEvaluator::new(&grid, &hierarchy, &config);

        // Rows are the initial labels: top = 0 (black, white), bottom = 1 (black, white)
        assert_eq!(partition.labels().as_slice(), &[0, 0, 1, 1]);

        match evaluator.evaluate(&partition, &pixel_block(&hierarchy, 0, 0)) {
            Evaluation::Accepted(proposal) => {
                assert_eq!((proposal.from, proposal.to), (0, 1));
                // Label 0 without the pixel is pure white (fit 0); label 1 is half black (fit 0.5)
                assert_approx_eq!(proposal.color_gain, 0.5);
                assert_approx_eq!(proposal.gain, 0.5);
            }
            other => panic!("expected an accepted move, got {:?}", other),
        }
    }

    #[test]
    fn block_covering_its_whole_label_is_pinned() {
        let grid = two_tone();
        let config = config(0.0);
        let hierarchy = BlockHierarchy::new(2, 2, 2, Connectivity::Four).unwrap();
        let partition = Partition::from_hierarchy(&grid, &hierarchy, 2);
        let evaluator = ExchangeEvaluator::new(&grid, &hierarchy, &config);

        let block = Block { level: 0, row: 0, col: 0 };
        assert!(matches!(evaluator.evaluate(&partition, &block), Evaluation::Pinned));
    }

    #[test]
    fn uniform_color_never_clears_the_threshold() {
        let grid = PixelGrid::new(4, 4, 3, vec![90; 48]).unwrap();
        let config = SeedsConfig { superpixels: 4, ..config(0.25) };
        let hierarchy = BlockHierarchy::new(4, 4, 4, Connectivity::Four).unwrap();
        let partition = Partition::from_hierarchy(&grid, &hierarchy, 2);
        let evaluator = ExchangeEvaluator::new(&grid, &hierarchy, &config);

        for block in hierarchy.blocks(hierarchy.pixel_level()) {
            match evaluator.evaluate(&partition, &block) {
                Evaluation::Accepted(p) => panic!("unexpected move {:?}", p),
                Evaluation::Rejected(p) => {
                    assert_approx_eq!(p.color_gain, 0.0);
                    assert!(p.smoothness < 0.0);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn smoothness_counts_the_ring_around_the_region() {
        let grid = PixelGrid::new(3, 3, 1, vec![0; 9]).unwrap();
        let config = SeedsConfig { superpixels: 9, ..config(1.0) };
        let hierarchy = BlockHierarchy::new(3, 3, 9, Connectivity::Four).unwrap();
        let evaluator = ExchangeEvaluator::new(&grid, &hierarchy, &config);

        // Center pixel labelled 0, five neighbors labelled 1, three labelled 0
        let labels = LabelMap::from_raw(3, 3, vec![1, 1, 1, 1, 0, 1, 0, 0, 0]).unwrap();
        let center = Rect { x0: 1, y0: 1, x1: 2, y1: 2 };

        assert_approx_eq!(evaluator.smoothness(&labels, center, 0, 1), (5.0 - 3.0) / 8.0);

        let corner = Rect { x0: 0, y0: 0, x1: 1, y1: 1 };
        // ring of the corner: (1,0)=1, (0,1)=1, (1,1)=0
        assert_approx_eq!(evaluator.smoothness(&labels, corner, 1, 0), (1.0 - 2.0) / 3.0);
    }

    #[test]
    fn combined_gain_is_bounded_by_one() {
        let grid = two_tone();
        let config = config(0.25);
        let hierarchy = BlockHierarchy::new(2, 2, 2, Connectivity::Four).unwrap();
        let evaluator = ExchangeEvaluator::new(&grid, &hierarchy, &config);

        assert_approx_eq!(evaluator.combine(1.0, 1.0), 1.0);
        assert_approx_eq!(evaluator.combine(-1.0, -1.0), -1.0);
        assert_approx_eq!(evaluator.combine(0.5, 0.0), 0.4);
    }
}
