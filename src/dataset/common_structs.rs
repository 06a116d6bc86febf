use std::path::PathBuf;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::{AugmentError, Result};

// Frequently used structs in the provided data loaders/augmenters/writers

/// Axis-aligned box in integer pixel coordinates, `xmin < xmax` and `ymin < ymax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    xmin: i32,
    ymin: i32,
    xmax: i32,
    ymax: i32,
}

impl BoundingBox {
    pub fn new(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Result<BoundingBox> {
        if xmin >= xmax || ymin >= ymax {
            return Err(AugmentError::InvalidBox {
                xmin,
                ymin,
                xmax,
                ymax,
            });
        }
        Ok(BoundingBox {
            xmin,
            ymin,
            xmax,
            ymax,
        })
    }

    pub fn xmin(&self) -> i32 {
        self.xmin
    }

    pub fn ymin(&self) -> i32 {
        self.ymin
    }

    pub fn xmax(&self) -> i32 {
        self.xmax
    }

    pub fn ymax(&self) -> i32 {
        self.ymax
    }

    pub fn width(&self) -> u32 {
        (self.xmax - self.xmin) as u32
    }

    pub fn height(&self) -> u32 {
        (self.ymax - self.ymin) as u32
    }

    /// True if the whole box lies in `[0, width] x [0, height]`
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.xmin >= 0 && self.ymin >= 0 && self.xmax <= width as i32 && self.ymax <= height as i32
    }

    /// True if any edge lies on (or beyond) the image border
    pub fn touches_border(&self, width: u32, height: u32) -> bool {
        self.xmin <= 1 || self.ymin <= 1 || self.xmax >= width as i32 || self.ymax >= height as i32
    }
}

/// An image in memory together with its single annotated object.
///
/// Stages never mutate one of these, they build a new one sharing the label
/// and the source paths.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedImage {
    pub image: RgbImage,
    pub bbox: BoundingBox,
    pub label: String,
    /// `<folder>` of the source annotation
    pub folder: String,
    pub image_path: PathBuf,
    pub annotation_path: PathBuf,
}

impl AnnotatedImage {
    /// Same metadata and source paths, new pixels and box
    pub fn with_image_and_bbox(&self, image: RgbImage, bbox: BoundingBox) -> AnnotatedImage {
        AnnotatedImage {
            image,
            bbox,
            label: self.label.clone(),
            folder: self.folder.clone(),
            image_path: self.image_path.clone(),
            annotation_path: self.annotation_path.clone(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// One object of one image, as written to the train/test CSV files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub class: String,
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_box() {
        assert!(BoundingBox::new(50, 10, 10, 50).is_err());
        assert!(BoundingBox::new(10, 50, 50, 50).is_err());
        let bb = BoundingBox::new(10, 10, 50, 40).unwrap();
        assert_eq!((bb.width(), bb.height()), (40, 30));
    }

    #[test]
    fn within_and_border() {
        let bb = BoundingBox::new(10, 10, 50, 50).unwrap();
        assert!(bb.is_within(100, 100));
        assert!(!bb.is_within(40, 100));
        assert!(!bb.touches_border(100, 100));
        assert!(bb.touches_border(50, 100));
    }
}
