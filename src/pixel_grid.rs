use image::RgbImage;
use palette::{FromColor, Hsv, Lab, Srgb};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{SeedsError, Result};

/// Tag describing what the channels of a [`PixelGrid`] hold.
///
/// The engine treats channels opaquely; the tag only matters when a grid is
/// built from a decoded image.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    Rgb,
    #[default]
    Bgr,
    Hsv,
    Lab,
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorSpace::Rgb => "rgb",
            ColorSpace::Bgr => "bgr",
            ColorSpace::Hsv => "hsv",
            ColorSpace::Lab => "lab",
        };
        f.write_str(name)
    }
}

impl FromStr for ColorSpace {
    type Err = SeedsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" => Ok(ColorSpace::Rgb),
            "bgr" => Ok(ColorSpace::Bgr),
            "hsv" => Ok(ColorSpace::Hsv),
            "lab" => Ok(ColorSpace::Lab),
            other => Err(SeedsError::UnsupportedColorSpace(other.to_string())),
        }
    }
}

/// Read-only W×H grid of multi-channel 8-bit samples, stored row-major and interleaved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<u8>,
}

impl PixelGrid {
    /// Wrap raw interleaved samples. Zero-sized grids are accepted here and
    /// rejected when the engine is initialized.
    pub fn new(width: u32, height: u32, channels: usize, data: Vec<u8>) -> Result<Self> {
        if channels == 0 {
            return Err(SeedsError::InvalidInput(
                "pixel grid needs at least one channel".to_string(),
            ));
        }

        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(SeedsError::InvalidInput(format!(
                "expected {} samples for {}x{}x{}, got {}",
                expected, width, height, channels, data.len()
            )));
        }

        Ok(Self { width, height, channels, data })
    }

    /// Build a three-channel grid from a decoded image, converting into `color_space`
    pub fn from_rgb_image(image: &RgbImage, color_space: ColorSpace) -> Self {
        let (width, height) = image.dimensions();
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);

        for pixel in image.pixels() {
            let [r, g, b] = pixel.0;
            let converted = match color_space {
                ColorSpace::Rgb => [r, g, b],
                ColorSpace::Bgr => [b, g, r],
                ColorSpace::Hsv => rgb_to_hsv_bytes(r, g, b),
                ColorSpace::Lab => rgb_to_lab_bytes(r, g, b),
            };
            data.extend_from_slice(&converted);
        }

        Self { width, height, channels: 3, data }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// All channel samples of pixel (x, y)
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let start = (y as usize * self.width as usize + x as usize) * self.channels;
        &self.data[start..start + self.channels]
    }

    #[inline]
    pub fn sample(&self, x: u32, y: u32, channel: usize) -> u8 {
        self.pixel(x, y)[channel]
    }
}

fn rgb_to_hsv_bytes(r: u8, g: u8, b: u8) -> [u8; 3] {
    let hsv: Hsv = Hsv::from_color(Srgb::new(r, g, b).into_format::<f32>());
    let hue = hsv.hue.into_positive_degrees();
    [
        to_byte(hue / 360.0 * 255.0),
        to_byte(hsv.saturation * 255.0),
        to_byte(hsv.value * 255.0),
    ]
}

fn rgb_to_lab_bytes(r: u8, g: u8, b: u8) -> [u8; 3] {
    let lab: Lab = Lab::from_color(Srgb::new(r, g, b).into_format::<f32>());
    [
        to_byte(lab.l / 100.0 * 255.0),
        to_byte(lab.a + 128.0),
        to_byte(lab.b + 128.0),
    ]
}

#[inline]
fn to_byte(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn new_rejects_mismatched_sample_count() {
        let result = PixelGrid::new(2, 2, 3, vec![0; 11]);
        assert!(matches!(result, Err(SeedsError::InvalidInput(_))));
    }

    #[test]
    fn bgr_swaps_red_and_blue() {
        let image = RgbImage::from_pixel(1, 1, Rgb([10, 20, 30]));
        let grid = PixelGrid::from_rgb_image(&image, ColorSpace::Bgr);
        assert_eq!(grid.pixel(0, 0), &[30, 20, 10]);
    }

    #[test]
    fn lab_maps_white_to_full_lightness_and_neutral_chroma() {
        let image = RgbImage::from_pixel(1, 1, Rgb([255, 255, 255]));
        let grid = PixelGrid::from_rgb_image(&image, ColorSpace::Lab);
        let [l, a, b] = [grid.sample(0, 0, 0), grid.sample(0, 0, 1), grid.sample(0, 0, 2)];
        assert!(l >= 254);
        assert!((a as i32 - 128).abs() <= 1);
        assert!((b as i32 - 128).abs() <= 1);
    }

    #[test]
    fn hsv_pure_red_has_zero_hue_and_full_saturation() {
        let image = RgbImage::from_pixel(1, 1, Rgb([255, 0, 0]));
        let grid = PixelGrid::from_rgb_image(&image, ColorSpace::Hsv);
        assert_eq!(grid.pixel(0, 0), &[0, 255, 255]);
    }

    #[test]
    fn color_space_parses_case_insensitively() {
        assert_eq!("LAB".parse::<ColorSpace>().unwrap(), ColorSpace::Lab);
        assert!("cmyk".parse::<ColorSpace>().is_err());
    }
}
