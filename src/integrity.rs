// src/integrity.rs - Connected-component diagnostics over finished label maps

use std::collections::{HashMap, HashSet};

use image::{ImageBuffer, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::label_map::LabelMap;

/// Connected components of the label map under 4-connectivity, numbered
/// 1..=n by imageproc.
fn component_image(labels: &LabelMap) -> ImageBuffer<Luma<u32>, Vec<u32>> {
    let (width, height) = labels.dimensions();
    let raw: ImageBuffer<Luma<u32>, Vec<u32>> =
        ImageBuffer::from_fn(width, height, |x, y| Luma([labels.get(x, y)]));

    // imageproc skips background pixels, so pick a value no pixel carries
    let present: HashSet<u32> = labels.as_slice().iter().copied().collect();
    let background = (0..=u32::MAX).find(|v| !present.contains(v)).unwrap_or(u32::MAX);

    connected_components(&raw, Connectivity::Four, Luma([background]))
}

/// Number of 4-connected same-label regions. Can exceed the number of
/// distinct labels since exchanges do not keep superpixels contiguous.
pub fn count_superpixels(labels: &LabelMap) -> usize {
    component_image(labels)
        .pixels()
        .map(|p| p[0])
        .max()
        .unwrap_or(0) as usize
}

/// Number of distinct label ids in use
pub fn count_labels(labels: &LabelMap) -> usize {
    labels.distinct_labels()
}

/// Give every connected component its own label, numbered densely in
/// row-major order of first appearance.
pub fn relabel_connected(labels: &LabelMap) -> LabelMap {
    let components = component_image(labels);
    let mut dense: HashMap<u32, u32> = HashMap::new();

    let relabelled = components
        .pixels()
        .map(|p| {
            let next = dense.len() as u32;
            *dense.entry(p[0]).or_insert(next)
        })
        .collect();

    let (width, height) = labels.dimensions();
    LabelMap::from_raw(width, height, relabelled).unwrap_or_else(|| labels.clone())
}
