// src/seeds.rs - Coarse-to-fine iteration driver

use log::debug;

use crate::config::SeedsConfig;
use crate::errors::{SeedsError, Result};
use crate::exchange::{Evaluation, ExchangeEvaluator};
use crate::hierarchy::BlockHierarchy;
use crate::histogram::HistogramModel;
use crate::label_map::LabelMap;
use crate::partition::Partition;
use crate::pixel_grid::PixelGrid;

/// Counters for one exchange sweep over a level
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SweepStats {
    /// Boundary blocks that had at least one candidate label
    pub evaluated: usize,
    pub accepted: usize,
    /// Sum of the gains of accepted moves
    pub gain: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelReport {
    pub level: usize,
    pub block_width: u32,
    pub block_height: u32,
    pub sweeps: Vec<SweepStats>,
}

/// What a call to [`Seeds::iterate`] did, level by level
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IterationReport {
    pub levels: Vec<LevelReport>,
}

impl IterationReport {
    pub fn accepted(&self) -> usize {
        self.sweeps().map(|s| s.accepted).sum()
    }

    pub fn gain(&self) -> f64 {
        self.sweeps().map(|s| s.gain).sum()
    }

    pub fn sweeps(&self) -> impl Iterator<Item = &SweepStats> {
        self.levels.iter().flat_map(|l| l.sweeps.iter())
    }
}

struct EngineState {
    hierarchy: BlockHierarchy,
    partition: Partition,
}

/// SEEDS superpixel engine over a borrowed pixel grid.
///
/// Call [`initialize`](Self::initialize) once, then [`iterate`](Self::iterate)
/// as often as needed; each call resumes from the current labels.
pub struct Seeds<'a> {
    grid: &'a PixelGrid,
    config: SeedsConfig,
    state: Option<EngineState>,
}

impl<'a> Seeds<'a> {
    pub fn new(grid: &'a PixelGrid, config: SeedsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { grid, config, state: None })
    }

    pub fn config(&self) -> &SeedsConfig {
        &self.config
    }

    /// Build the block hierarchy, tile the image into one label per coarsest
    /// block and histogram every label.
    pub fn initialize(&mut self) -> Result<()> {
        if self.state.is_some() {
            return Err(SeedsError::AlreadyInitialized);
        }
        if self.grid.is_empty() {
            return Err(SeedsError::InvalidInput(format!(
                "pixel grid is {}x{}",
                self.grid.width(),
                self.grid.height()
            )));
        }

        let hierarchy = BlockHierarchy::new(
            self.grid.width(),
            self.grid.height(),
            self.config.superpixels,
            self.config.connectivity,
        )?;
        let partition = Partition::from_hierarchy(self.grid, &hierarchy, self.config.bins as usize);

        debug!(
            "Initialized {} labels over {} levels (coarsest blocks {}x{})",
            partition.number_of_labels(),
            hierarchy.number_of_levels(),
            hierarchy.level(0).block_width,
            hierarchy.level(0).block_height,
        );

        self.state = Some(EngineState { hierarchy, partition });
        Ok(())
    }

    /// Run `iterations` exchange sweeps on every block level, coarse to fine,
    /// then `iterations` sweeps over single pixels.
    pub fn iterate(&mut self, iterations: u32) -> Result<IterationReport> {
        if iterations == 0 {
            return Err(SeedsError::Config("iterations must be > 0".to_string()));
        }
        let state = self.state.as_mut().ok_or(SeedsError::NotInitialized)?;
        let evaluator = ExchangeEvaluator::new(self.grid, &state.hierarchy, &self.config);

        let mut report = IterationReport::default();
        for level in 0..state.hierarchy.number_of_levels() {
            let geometry = *state.hierarchy.level(level);
            let mut sweeps = Vec::with_capacity(iterations as usize);

            for iteration in 0..iterations {
                let stats = sweep(&evaluator, &state.hierarchy, &mut state.partition, level)?;
                debug!(
                    "Level {} ({}x{}) sweep {}: {} of {} boundary blocks moved",
                    level, geometry.block_width, geometry.block_height, iteration, stats.accepted, stats.evaluated,
                );
                sweeps.push(stats);

                if cfg!(debug_assertions) {
                    state.partition.check_consistency(self.grid)?;
                }
            }

            report.levels.push(LevelReport {
                level,
                block_width: geometry.block_width,
                block_height: geometry.block_height,
                sweeps,
            });
        }

        Ok(report)
    }

    /// Current label map
    pub fn labels(&self) -> Result<&LabelMap> {
        self.state
            .as_ref()
            .map(|s| s.partition.labels())
            .ok_or(SeedsError::NotInitialized)
    }

    pub fn histograms(&self) -> Result<&HistogramModel> {
        self.state
            .as_ref()
            .map(|s| s.partition.histograms())
            .ok_or(SeedsError::NotInitialized)
    }

    pub fn hierarchy(&self) -> Result<&BlockHierarchy> {
        self.state
            .as_ref()
            .map(|s| &s.hierarchy)
            .ok_or(SeedsError::NotInitialized)
    }

    /// Number of label ids handed out at initialization
    pub fn number_of_labels(&self) -> Result<usize> {
        self.state
            .as_ref()
            .map(|s| s.partition.number_of_labels())
            .ok_or(SeedsError::NotInitialized)
    }

    /// Recount every label's histogram from the label map
    pub fn check_consistency(&self) -> Result<()> {
        let state = self.state.as_ref().ok_or(SeedsError::NotInitialized)?;
        state.partition.check_consistency(self.grid)
    }

    pub fn into_labels(self) -> Result<LabelMap> {
        self.state
            .map(|s| s.partition.into_labels())
            .ok_or(SeedsError::NotInitialized)
    }
}

/// One row-major pass over the blocks of `level`, committing accepted moves immediately
fn sweep(
    evaluator: &ExchangeEvaluator,
    hierarchy: &BlockHierarchy,
    partition: &mut Partition,
    level: usize,
) -> Result<SweepStats> {
    let mut stats = SweepStats::default();

    for block in hierarchy.blocks(level) {
        match evaluator.evaluate(partition, &block) {
            Evaluation::Accepted(proposal) => {
                stats.evaluated += 1;
                partition.move_region(proposal.rect, &proposal.region, proposal.from, proposal.to)?;
                stats.accepted += 1;
                stats.gain += proposal.gain as f64;
            }
            Evaluation::Rejected(_) | Evaluation::Pinned => stats.evaluated += 1,
            Evaluation::Mixed | Evaluation::Interior => {}
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> PixelGrid {
        let data = (0..8 * 8 * 3).map(|i| ((i * 37) % 256) as u8).collect();
        PixelGrid::new(8, 8, 3, data).unwrap()
    }

    fn config() -> SeedsConfig {
        SeedsConfig { superpixels: 4, ..SeedsConfig::default() }
    }

    #[test]
    fn operations_before_initialize_fail() {
        let grid = grid();
        let mut seeds = Seeds::new(&grid, config()).unwrap();
        assert!(matches!(seeds.iterate(1), Err(SeedsError::NotInitialized)));
        assert!(matches!(seeds.labels(), Err(SeedsError::NotInitialized)));
    }

    #[test]
    fn initialize_twice_fails() {
        let grid = grid();
        let mut seeds = Seeds::new(&grid, config()).unwrap();
        seeds.initialize().unwrap();
        assert!(matches!(seeds.initialize(), Err(SeedsError::AlreadyInitialized)));
    }

    #[test]
    fn zero_iterations_is_a_config_error() {
        let grid = grid();
        let mut seeds = Seeds::new(&grid, config()).unwrap();
        seeds.initialize().unwrap();
        assert!(matches!(seeds.iterate(0), Err(SeedsError::Config(_))));
    }

    #[test]
    fn invalid_config_fails_at_construction() {
        let grid = grid();
        let config = SeedsConfig { bins: 0, ..config() };
        assert!(matches!(Seeds::new(&grid, config), Err(SeedsError::Config(_))));
    }

    #[test]
    fn empty_grid_fails_at_initialize() {
        let grid = PixelGrid::new(0, 0, 3, Vec::new()).unwrap();
        let mut seeds = Seeds::new(&grid, config()).unwrap();
        assert!(matches!(seeds.initialize(), Err(SeedsError::InvalidInput(_))));
    }

    #[test]
    fn report_covers_every_level_and_sweep() {
        let grid = grid();
        let mut seeds = Seeds::new(&grid, config()).unwrap();
        seeds.initialize().unwrap();
        let report = seeds.iterate(3).unwrap();

        let hierarchy = seeds.hierarchy().unwrap();
        assert_eq!(report.levels.len(), hierarchy.number_of_levels());
        assert!(report.levels.iter().all(|l| l.sweeps.len() == 3));
        assert_eq!(report.levels.last().map(|l| (l.block_width, l.block_height)), Some((1, 1)));
        assert!(report.gain() >= 0.0);
        seeds.check_consistency().unwrap();
    }
}
