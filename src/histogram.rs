// src/histogram.rs - Per-label, per-channel color histograms and histogram intersection

use crate::errors::{SeedsError, Result};
use crate::hierarchy::Rect;
use crate::pixel_grid::PixelGrid;

/// Map an 8-bit sample onto one of `bins` equal-width bins
#[inline]
pub fn bin_of(sample: u8, bins: usize) -> usize {
    sample as usize * bins / 256
}

/// Independent per-channel histograms of a candidate region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionHistogram {
    bins: usize,
    counts: Vec<u32>,
    size: u32,
}

impl RegionHistogram {
    /// Histogram the pixels of `rect`
    pub fn from_rect(grid: &PixelGrid, rect: Rect, bins: usize) -> Self {
        let channels = grid.channels();
        let mut counts = vec![0u32; channels * bins];
        for (x, y) in rect.pixels() {
            for (c, &sample) in grid.pixel(x, y).iter().enumerate() {
                counts[c * bins + bin_of(sample, bins)] += 1;
            }
        }
        Self { bins, counts, size: rect.area() as u32 }
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn channel(&self, channel: usize) -> &[u32] {
        &self.counts[channel * self.bins..(channel + 1) * self.bins]
    }
}

/// Color histograms for every label.
///
/// For every label the counts of each channel sum to the label's pixel count.
/// Mutation happens only through whole-region add/remove so the pair
/// (histograms, sizes) never disagrees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramModel {
    channels: usize,
    bins: usize,
    counts: Vec<u32>,
    sizes: Vec<u32>,
}

impl HistogramModel {
    pub fn new(number_of_labels: usize, channels: usize, bins: usize) -> Self {
        Self {
            channels,
            bins,
            counts: vec![0; number_of_labels * channels * bins],
            sizes: vec![0; number_of_labels],
        }
    }

    #[inline]
    pub fn bins(&self) -> usize {
        self.bins
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn number_of_labels(&self) -> usize {
        self.sizes.len()
    }

    /// Number of pixels currently accounted to `label`
    #[inline]
    pub fn size(&self, label: u32) -> u32 {
        self.sizes[label as usize]
    }

    pub fn channel(&self, label: u32, channel: usize) -> &[u32] {
        let start = self.offset(label, channel);
        &self.counts[start..start + self.bins]
    }

    /// Add the samples of `rect` to `label`. O(|rect|).
    pub fn add_samples(&mut self, label: u32, grid: &PixelGrid, rect: Rect) {
        for (x, y) in rect.pixels() {
            for (c, &sample) in grid.pixel(x, y).iter().enumerate() {
                let idx = self.offset(label, c) + bin_of(sample, self.bins);
                self.counts[idx] += 1;
            }
        }
        self.sizes[label as usize] += rect.area() as u32;
    }

    /// Remove the samples of `rect` from `label`. O(|rect|).
    ///
    /// Fails without touching any count if the label does not hold enough
    /// samples, which means the caller's label map and this model disagree.
    pub fn remove_samples(&mut self, label: u32, grid: &PixelGrid, rect: Rect) -> Result<()> {
        let region = RegionHistogram::from_rect(grid, rect, self.bins);
        self.remove_histogram(label, &region)
    }

    pub fn add_histogram(&mut self, label: u32, region: &RegionHistogram) {
        for c in 0..self.channels {
            let start = self.offset(label, c);
            for (count, &delta) in self.counts[start..start + self.bins].iter_mut().zip(region.channel(c)) {
                *count += delta;
            }
        }
        self.sizes[label as usize] += region.size;
    }

    pub fn remove_histogram(&mut self, label: u32, region: &RegionHistogram) -> Result<()> {
        if self.sizes[label as usize] < region.size {
            return Err(SeedsError::Invariant(format!(
                "label {} holds {} pixels, cannot remove {}",
                label, self.sizes[label as usize], region.size
            )));
        }
        for c in 0..self.channels {
            let held = self.channel(label, c);
            if held.iter().zip(region.channel(c)).any(|(&h, &r)| h < r) {
                return Err(SeedsError::Invariant(format!(
                    "histogram of label {} channel {} is missing samples of the removed region",
                    label, c
                )));
            }
        }

        for c in 0..self.channels {
            let start = self.offset(label, c);
            for (count, &delta) in self.counts[start..start + self.bins].iter_mut().zip(region.channel(c)) {
                *count -= delta;
            }
        }
        self.sizes[label as usize] -= region.size;
        Ok(())
    }

    /// Histogram intersection of `region` with `label`, averaged over channels.
    ///
    /// Both histograms are normalised to distributions first, so the result
    /// lies in [0, 1]. An empty side yields 0.
    pub fn similarity(&self, region: &RegionHistogram, label: u32) -> f32 {
        self.intersection(region, label, false)
    }

    /// Like [`similarity`](Self::similarity), but with `region` taken out of
    /// `label` first. Used when `region` currently belongs to `label`.
    pub fn similarity_excluding(&self, region: &RegionHistogram, label: u32) -> f32 {
        self.intersection(region, label, true)
    }

    fn intersection(&self, region: &RegionHistogram, label: u32, exclude: bool) -> f32 {
        let label_size = if exclude {
            self.size(label).saturating_sub(region.size)
        } else {
            self.size(label)
        };
        if label_size == 0 || region.size == 0 {
            return 0.0;
        }

        let region_norm = 1.0 / region.size as f32;
        let label_norm = 1.0 / label_size as f32;

        let mut total = 0.0f32;
        for c in 0..self.channels {
            let region_counts = region.channel(c);
            for (b, &label_count) in self.channel(label, c).iter().enumerate() {
                let region_count = region_counts[b];
                if region_count == 0 {
                    continue;
                }
                let label_count = if exclude { label_count.saturating_sub(region_count) } else { label_count };
                total += (region_count as f32 * region_norm).min(label_count as f32 * label_norm);
            }
        }

        // Rounding can push a perfect match a hair above 1
        (total / self.channels as f32).min(1.0)
    }

    #[inline]
    fn offset(&self, label: u32, channel: usize) -> usize {
        (label as usize * self.channels + channel) * self.bins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    /// 4x1 single-channel grid: two dark pixels then two bright ones
    fn grid() -> PixelGrid {
        PixelGrid::new(4, 1, 1, vec![10, 20, 240, 250]).unwrap()
    }

    fn rect(x0: u32, x1: u32) -> Rect {
        Rect { x0, y0: 0, x1, y1: 1 }
    }

    #[test]
    fn bins_partition_the_byte_range() {
        assert_eq!(bin_of(0, 5), 0);
        assert_eq!(bin_of(255, 5), 4);
        assert_eq!(bin_of(127, 2), 0);
        assert_eq!(bin_of(128, 2), 1);
    }

    #[test]
    fn channel_sums_track_label_size() {
        let grid = grid();
        let mut model = HistogramModel::new(2, 1, 2);
        model.add_samples(0, &grid, rect(0, 3));
        model.add_samples(1, &grid, rect(3, 4));

        assert_eq!(model.size(0), 3);
        assert_eq!(model.channel(0, 0), &[2, 1]);
        assert_eq!(model.channel(1, 0).iter().sum::<u32>(), model.size(1));
    }

    #[test]
    fn remove_then_add_restores_the_model() {
        let grid = grid();
        let mut model = HistogramModel::new(1, 1, 4);
        model.add_samples(0, &grid, rect(0, 4));
        let before = model.clone();

        model.remove_samples(0, &grid, rect(1, 3)).unwrap();
        assert_eq!(model.size(0), 2);
        model.add_samples(0, &grid, rect(1, 3));

        assert_eq!(model, before);
    }

    #[test]
    fn removing_samples_that_are_not_held_is_an_invariant_error() {
        let grid = grid();
        let mut model = HistogramModel::new(2, 1, 2);
        model.add_samples(0, &grid, rect(0, 2));
        let before = model.clone();

        let result = model.remove_samples(0, &grid, rect(2, 4));
        assert!(matches!(result, Err(SeedsError::Invariant(_))));
        assert_eq!(model, before);
    }

    #[test]
    fn intersection_of_matching_and_disjoint_distributions() {
        let grid = grid();
        let mut model = HistogramModel::new(2, 1, 2);
        model.add_samples(0, &grid, rect(0, 2));
        model.add_samples(1, &grid, rect(2, 4));

        let dark = RegionHistogram::from_rect(&grid, rect(0, 1), 2);
        assert_approx_eq!(model.similarity(&dark, 0), 1.0);
        assert_approx_eq!(model.similarity(&dark, 1), 0.0);
    }

    #[test]
    fn own_samples_are_excluded_from_the_fit() {
        let grid = grid();
        let mut model = HistogramModel::new(1, 1, 2);
        // label 0 = {dark, dark, bright}
        model.add_samples(0, &grid, rect(0, 3));

        let bright = RegionHistogram::from_rect(&grid, rect(2, 3), 2);
        assert_approx_eq!(model.similarity(&bright, 0), 1.0 / 3.0);
        assert_approx_eq!(model.similarity_excluding(&bright, 0), 0.0);
    }

    #[test]
    fn empty_label_has_zero_similarity() {
        let grid = grid();
        let model = HistogramModel::new(1, 1, 2);
        let region = RegionHistogram::from_rect(&grid, rect(0, 2), 2);
        assert_approx_eq!(model.similarity(&region, 0), 0.0);
    }
}
