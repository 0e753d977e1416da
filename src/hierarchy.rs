// src/hierarchy.rs - Implicit coarse-to-fine block pyramid over the pixel grid

use serde::{Deserialize, Serialize};

use crate::errors::{SeedsError, Result};

/// Largest base block edge tried when fitting the coarsest level
const MAX_BASE_SIZE: u32 = 4;

/// Upper bound on block levels (a coarsest block of 4 << 15 pixels is far beyond any image)
const MAX_BLOCK_LEVELS: u32 = 16;

/// Which same-level blocks are considered adjacent
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    #[default]
    Four,
    Eight,
}

impl Connectivity {
    fn offsets(self) -> &'static [(i64, i64)] {
        // (drow, dcol) in row-major order
        match self {
            Connectivity::Four => &[(-1, 0), (0, -1), (0, 1), (1, 0)],
            Connectivity::Eight => &[
                (-1, -1), (-1, 0), (-1, 1),
                (0, -1), (0, 1),
                (1, -1), (1, 0), (1, 1),
            ],
        }
    }
}

/// Half-open pixel rectangle `[x0, x1) × [y0, y1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Rect {
    #[inline]
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x0 >= self.x0 && other.x1 <= self.x1 && other.y0 >= self.y0 && other.y1 <= self.y1
    }

    /// Pixel of `self` closest to the centre of `other`
    pub fn closest_pixel_to(&self, other: &Rect) -> (u32, u32) {
        let cx = other.x0 + other.width() / 2;
        let cy = other.y0 + other.height() / 2;
        (cx.clamp(self.x0, self.x1 - 1), cy.clamp(self.y0, self.y1 - 1))
    }

    /// Every pixel coordinate, row-major
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.y0..self.y1).flat_map(move |y| (self.x0..self.x1).map(move |x| (x, y)))
    }
}

/// Geometry of one hierarchy level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    pub block_width: u32,
    pub block_height: u32,
    pub columns: u32,
    pub rows: u32,
}

impl Level {
    fn new(image_width: u32, image_height: u32, block_width: u32, block_height: u32) -> Self {
        Self {
            block_width,
            block_height,
            columns: image_width.div_ceil(block_width),
            rows: image_height.div_ceil(block_height),
        }
    }

    #[inline]
    pub fn is_pixel_level(&self) -> bool {
        self.block_width == 1 && self.block_height == 1
    }

    #[inline]
    pub fn number_of_blocks(&self) -> usize {
        self.columns as usize * self.rows as usize
    }
}

/// A block identified by (level, row, col); it owns no pixels, its label is
/// read from the label map whenever it is needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    pub level: usize,
    pub row: u32,
    pub col: u32,
}

/// Ordered levels from coarsest (index 0) to single pixels (last index)
#[derive(Debug, Clone)]
pub struct BlockHierarchy {
    width: u32,
    height: u32,
    connectivity: Connectivity,
    levels: Vec<Level>,
}

impl BlockHierarchy {
    /// Fit a hierarchy to a `width × height` image so that the coarsest level
    /// has roughly `superpixels` blocks.
    pub fn new(width: u32, height: u32, superpixels: u32, connectivity: Connectivity) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SeedsError::InvalidInput(format!(
                "cannot build a block hierarchy for a {}x{} image",
                width, height
            )));
        }
        if superpixels == 0 {
            return Err(SeedsError::Config("superpixels must be > 0".to_string()));
        }

        let (base_width, base_height, block_levels) = fit_base_block(width, height, superpixels);

        let mut levels: Vec<Level> = (0..block_levels)
            .rev()
            .map(|shift| Level::new(width, height, base_width << shift, base_height << shift))
            .collect();

        if !levels.last().is_some_and(Level::is_pixel_level) {
            levels.push(Level::new(width, height, 1, 1));
        }

        Ok(Self { width, height, connectivity, levels })
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, level: usize) -> &Level {
        &self.levels[level]
    }

    pub fn number_of_levels(&self) -> usize {
        self.levels.len()
    }

    /// Index of the single-pixel level (always the last one)
    pub fn pixel_level(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Pixel rectangle covered by `block`, clipped to the image
    pub fn block_rect(&self, block: &Block) -> Rect {
        let level = &self.levels[block.level];
        let x0 = block.col * level.block_width;
        let y0 = block.row * level.block_height;
        Rect {
            x0,
            y0,
            x1: (x0 + level.block_width).min(self.width),
            y1: (y0 + level.block_height).min(self.height),
        }
    }

    /// All blocks of `level` in row-major order
    pub fn blocks(&self, level: usize) -> impl Iterator<Item = Block> {
        let Level { rows, columns, .. } = self.levels[level];
        (0..rows).flat_map(move |row| (0..columns).map(move |col| Block { level, row, col }))
    }

    /// Same-level blocks adjacent to `block`, in row-major order
    pub fn neighbors_of(&self, block: &Block) -> Vec<Block> {
        let level = &self.levels[block.level];
        self.connectivity
            .offsets()
            .iter()
            .filter_map(|&(drow, dcol)| {
                let row = block.row as i64 + drow;
                let col = block.col as i64 + dcol;
                if row < 0 || col < 0 || row >= level.rows as i64 || col >= level.columns as i64 {
                    None
                } else {
                    Some(Block { level: block.level, row: row as u32, col: col as u32 })
                }
            })
            .collect()
    }

    /// The enclosing block one level coarser, `None` at the coarsest level
    pub fn parent_of(&self, block: &Block) -> Option<Block> {
        if block.level == 0 {
            return None;
        }
        let child = &self.levels[block.level];
        let parent = &self.levels[block.level - 1];
        Some(Block {
            level: block.level - 1,
            row: block.row * child.block_height / parent.block_height,
            col: block.col * child.block_width / parent.block_width,
        })
    }
}

/// Pick `(base_width, base_height, block_levels)` so the coarsest block size
/// `base << (block_levels - 1)` tiles the image into about `superpixels` blocks.
fn fit_base_block(width: u32, height: u32, superpixels: u32) -> (u32, u32, u32) {
    let target = superpixels as u64;
    let mut best = (1, 1, 1);
    let mut best_key = (u64::MAX, u32::MAX, u32::MAX, 0u32);

    for levels in 1..=MAX_BLOCK_LEVELS {
        for base_height in 1..=MAX_BASE_SIZE {
            for base_width in 1..=MAX_BASE_SIZE {
                let block_width = base_width << (levels - 1);
                let block_height = base_height << (levels - 1);
                if block_width > width || block_height > height {
                    continue;
                }

                let count = width.div_ceil(block_width) as u64 * height.div_ceil(block_height) as u64;

                // Closest count, then squarer blocks, then a base near 2x2, then deeper pyramids
                let key = (
                    count.abs_diff(target),
                    base_width.abs_diff(base_height),
                    (base_width * base_height).abs_diff(4),
                    MAX_BLOCK_LEVELS - levels,
                );
                if key < best_key {
                    best_key = key;
                    best = (base_width, base_height, levels);
                }
            }
        }
    }

    best
}
