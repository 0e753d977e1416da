use std::path::{Path, PathBuf};
use std::fs;
use image::{ImageFormat, RgbImage};

use crate::draw::IndexImage;
use crate::errors::{SeedsError, Result};

/// File extensions picked up when scanning an input directory
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Represents an input image with its metadata
pub struct InputImage {
    pub image: RgbImage,
    pub path: PathBuf,
    pub filename: String,
}

/// Get all image files from a directory (recursively), sorted by path
pub fn get_image_files_in_dir<P: AsRef<Path>>(dir_path: P) -> Result<Vec<PathBuf>> {
    let dir_path = dir_path.as_ref();

    if !dir_path.exists() {
        return Err(SeedsError::InvalidPath(dir_path.to_path_buf()));
    }

    if !dir_path.is_dir() {
        return Err(SeedsError::Config(format!(
            "{} is not a directory", dir_path.display()
        )));
    }

    let mut image_files = Vec::new();
    find_image_files_recursive(dir_path, &mut image_files)?;
    image_files.sort();

    Ok(image_files)
}

fn find_image_files_recursive(dir_path: &Path, result: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir_path)? {
        let path = entry?.path();

        if path.is_dir() {
            find_image_files_recursive(&path, result)?;
        } else if path.is_file() && has_image_extension(&path) {
            result.push(path);
        }
    }

    Ok(())
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode an image file into 8-bit RGB. Decode failures come back as
/// `SeedsError::Image`, never as a panic.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<InputImage> {
    let path = path.as_ref();

    let filename = path.file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| SeedsError::InvalidPath(path.to_path_buf()))?
        .to_string();

    let rgb_img = image::open(path)?.to_rgb8();

    Ok(InputImage {
        image: rgb_img,
        path: path.to_path_buf(),
        filename,
    })
}

/// Save an RGB image as PNG
pub fn save_image<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save a 16-bit index image as PNG
pub fn save_index_image<P: AsRef<Path>>(image: &IndexImage, path: P) -> Result<()> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_match_case_insensitively() {
        assert!(has_image_extension(Path::new("a/b/photo.JPG")));
        assert!(has_image_extension(Path::new("scan.tiff")));
        assert!(!has_image_extension(Path::new("notes.txt")));
        assert!(!has_image_extension(Path::new("README")));
    }

    #[test]
    fn missing_file_is_an_error_not_a_panic() {
        let result = load_image("definitely/not/here.png");
        assert!(result.is_err());
    }

    #[test]
    fn missing_directory_is_an_invalid_path() {
        let result = get_image_files_in_dir("definitely/not/here");
        assert!(matches!(result, Err(SeedsError::InvalidPath(_))));
    }
}
