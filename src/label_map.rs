use std::collections::BTreeSet;

use crate::hierarchy::Rect;

/// W×H array of superpixel ids, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    width: u32,
    height: u32,
    labels: Vec<u32>,
}

impl LabelMap {
    /// Build a label map from raw row-major ids. Returns `None` if the length
    /// does not match the dimensions.
    pub fn from_raw(width: u32, height: u32, labels: Vec<u32>) -> Option<Self> {
        if labels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self { width, height, labels })
    }

    pub(crate) fn filled(width: u32, height: u32, label: u32) -> Self {
        Self {
            width,
            height,
            labels: vec![label; width as usize * height as usize],
        }
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
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.labels[self.index(x, y)]
    }

    /// Overwrite every pixel of `rect` with `label`
    pub(crate) fn fill_rect(&mut self, rect: Rect, label: u32) {
        for y in rect.y0..rect.y1 {
            let start = self.index(rect.x0, y);
            let end = start + (rect.x1 - rect.x0) as usize;
            self.labels[start..end].fill(label);
        }
    }

    /// The single label covering `rect`, or `None` if the rectangle is mixed
    pub fn uniform_label(&self, rect: Rect) -> Option<u32> {
        let first = self.get(rect.x0, rect.y0);
        for y in rect.y0..rect.y1 {
            let start = self.index(rect.x0, y);
            let end = start + (rect.x1 - rect.x0) as usize;
            if self.labels[start..end].iter().any(|&l| l != first) {
                return None;
            }
        }
        Some(first)
    }

    /// Row-major view of the ids
    pub fn as_slice(&self) -> &[u32] {
        &self.labels
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.labels.chunks(self.width.max(1) as usize)
    }

    /// Largest id in use plus one
    pub fn label_bound(&self) -> usize {
        self.labels.iter().max().map_or(0, |&m| m as usize + 1)
    }

    /// Number of distinct ids present
    pub fn distinct_labels(&self) -> usize {
        self.labels.iter().collect::<BTreeSet<_>>().len()
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rect_only_touches_the_rectangle() {
        let mut map = LabelMap::filled(4, 3, 0);
        map.fill_rect(Rect { x0: 1, y0: 1, x1: 3, y1: 3 }, 7);

        assert_eq!(map.as_slice(), &[0, 0, 0, 0, 0, 7, 7, 0, 0, 7, 7, 0]);
        assert_eq!(map.uniform_label(Rect { x0: 1, y0: 1, x1: 3, y1: 3 }), Some(7));
        assert_eq!(map.uniform_label(Rect { x0: 0, y0: 0, x1: 2, y1: 2 }), None);
        assert_eq!(map.distinct_labels(), 2);
        assert_eq!(map.label_bound(), 8);
    }

    #[test]
    fn from_raw_checks_length() {
        assert!(LabelMap::from_raw(2, 2, vec![0; 3]).is_none());
        assert!(LabelMap::from_raw(2, 2, vec![0; 4]).is_some());
    }
}
