use std::path::{Path, PathBuf};

use itertools::Itertools;
use tracing::warn;

use crate::dataset::common_structs::AnnotatedImage;
use crate::dataset::data_transformers::pascal_voc::{annotation_path_for, read_voc_annotation};
use crate::dataset::DataLoader;
use crate::error::{AugmentError, Result};

/// Loads the image into memory and parses the box of the first object of
/// its sibling annotation file (same name, `.xml` extension).
pub fn load_annotated_image(img_path: &Path) -> Result<AnnotatedImage> {
    let annotation_path = annotation_path_for(img_path);
    for path in [img_path, annotation_path.as_path()] {
        if !path.is_file() {
            return Err(AugmentError::MissingInputFile {
                path: path.to_path_buf(),
            });
        }
    }

    let annotation = read_voc_annotation(&annotation_path)?;
    let object = annotation.first_object(&annotation_path)?;
    let bbox = object
        .bndbox
        .to_bounding_box()
        .map_err(|e| AugmentError::malformed(&annotation_path, e))?;

    let image = image::open(img_path)
        .map_err(|source| AugmentError::ImageDecode {
            path: img_path.to_path_buf(),
            source,
        })?
        .to_rgb8();
    if !bbox.is_within(image.width(), image.height()) {
        warn!(
            "box {:?} of {} exceeds the {}x{} image",
            bbox,
            annotation_path.display(),
            image.width(),
            image.height()
        );
    }

    Ok(AnnotatedImage {
        image,
        bbox,
        label: object.name.clone(),
        folder: annotation.folder.clone(),
        image_path: img_path.to_path_buf(),
        annotation_path,
    })
}

/// Image paths matching a glob pattern, sorted. `limit` keeps only the first ones.
pub fn image_paths_from_glob(pattern: &str, limit: Option<usize>) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("skipping unreadable glob entry: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .sorted()
        .take(limit.unwrap_or(usize::MAX))
        .collect();
    Ok(paths)
}

/// Iterates over the images of a glob, loading each with its annotation.
///
/// A file that fails to load is yielded as an `Err` so the caller can log it
/// and move on.
pub struct AnnotatedImageLoader {
    img_paths: Vec<PathBuf>,
    next_element_index: usize,
}

impl AnnotatedImageLoader {
    pub fn new(img_paths: Vec<PathBuf>) -> AnnotatedImageLoader {
        AnnotatedImageLoader {
            img_paths,
            next_element_index: 0,
        }
    }

    pub fn from_glob(pattern: &str, limit: Option<usize>) -> Result<AnnotatedImageLoader> {
        Ok(AnnotatedImageLoader::new(image_paths_from_glob(pattern, limit)?))
    }
}

impl Iterator for AnnotatedImageLoader {
    type Item = (PathBuf, Result<AnnotatedImage>);

    fn next(&mut self) -> Option<Self::Item> {
        let img_path = self.img_paths.get(self.next_element_index)?.clone();
        self.next_element_index += 1;
        let loaded = load_annotated_image(&img_path);
        Some((img_path, loaded))
    }
}

impl DataLoader for AnnotatedImageLoader {
    fn next_element_index(&self) -> usize {
        self.next_element_index
    }

    fn max_elem_index(&self) -> usize {
        self.img_paths.len()
    }
}
