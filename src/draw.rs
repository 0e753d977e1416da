// src/draw.rs - Visualizations of a finished label map

use image::{ImageBuffer, Luma, Rgb, RgbImage};

use crate::errors::{SeedsError, Result};
use crate::label_map::LabelMap;

/// 16-bit single channel image of raw label ids
pub type IndexImage = ImageBuffer<Luma<u16>, Vec<u16>>;

fn check_dimensions(labels: &LabelMap, image: &RgbImage) -> Result<()> {
    if labels.dimensions() != image.dimensions() {
        return Err(SeedsError::InvalidInput(format!(
            "label map is {:?} but the image is {:?}",
            labels.dimensions(),
            image.dimensions()
        )));
    }
    Ok(())
}

/// True if the right or bottom neighbor of (x, y) carries another label
#[inline]
fn is_boundary(labels: &LabelMap, x: u32, y: u32) -> bool {
    let label = labels.get(x, y);
    (x + 1 < labels.width() && labels.get(x + 1, y) != label)
        || (y + 1 < labels.height() && labels.get(x, y + 1) != label)
}

/// Copy of `image` with label boundaries painted in `color`
pub fn contour_image(labels: &LabelMap, image: &RgbImage, color: [u8; 3]) -> Result<RgbImage> {
    check_dimensions(labels, image)?;

    let mut contour = image.clone();
    for (x, y, pixel) in contour.enumerate_pixels_mut() {
        if is_boundary(labels, x, y) {
            *pixel = Rgb(color);
        }
    }
    Ok(contour)
}

/// Stable pseudo-random color for a label id
pub fn label_color(label: u32) -> [u8; 3] {
    // Knuth multiplicative hash spreads consecutive ids over the color cube
    let hash = label.wrapping_add(1).wrapping_mul(2_654_435_761);
    [(hash >> 24) as u8, (hash >> 16) as u8, (hash >> 8) as u8]
}

/// Every label filled with its own flat color
pub fn label_image(labels: &LabelMap) -> RgbImage {
    let (width, height) = labels.dimensions();
    RgbImage::from_fn(width, height, |x, y| Rgb(label_color(labels.get(x, y))))
}

/// Every label filled with the mean color of its pixels in `image`
pub fn mean_image(labels: &LabelMap, image: &RgbImage) -> Result<RgbImage> {
    check_dimensions(labels, image)?;

    let bound = labels.label_bound();
    let mut sums = vec![[0u64; 3]; bound];
    let mut counts = vec![0u64; bound];

    for (x, y, pixel) in image.enumerate_pixels() {
        let label = labels.get(x, y) as usize;
        for c in 0..3 {
            sums[label][c] += pixel[c] as u64;
        }
        counts[label] += 1;
    }

    let means: Vec<[u8; 3]> = sums
        .iter()
        .zip(&counts)
        .map(|(sum, &count)| {
            if count == 0 {
                [0, 0, 0]
            } else {
                [
                    ((sum[0] + count / 2) / count) as u8,
                    ((sum[1] + count / 2) / count) as u8,
                    ((sum[2] + count / 2) / count) as u8,
                ]
            }
        })
        .collect();

    let (width, height) = labels.dimensions();
    Ok(RgbImage::from_fn(width, height, |x, y| Rgb(means[labels.get(x, y) as usize])))
}

/// Label ids as a 16-bit grayscale image
pub fn index_image(labels: &LabelMap) -> Result<IndexImage> {
    if labels.label_bound() > u16::MAX as usize + 1 {
        return Err(SeedsError::InvalidInput(format!(
            "label ids up to {} do not fit a 16-bit index image",
            labels.label_bound() - 1
        )));
    }

    let (width, height) = labels.dimensions();
    Ok(ImageBuffer::from_fn(width, height, |x, y| Luma([labels.get(x, y) as u16])))
}
