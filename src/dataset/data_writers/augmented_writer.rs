use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::RgbImage;
use rand::{Rng, RngCore};
use tracing::{info, warn};

use crate::config::OutputFormat;
use crate::dataset::common_structs::AnnotatedImage;
use crate::dataset::data_transformers::pascal_voc::{
    annotation_path_for, single_object_annotation, voc_annotation_to_string,
};
use crate::error::{AugmentError, Result};

/// Sub directory, next to the original images, receiving the augmented files
pub const AUGMENTED_DIR: &str = "augmented";
pub const SUFFIX_LEN: usize = 10;
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Augmented images are always written with three channels
const OUTPUT_DEPTH: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub image: PathBuf,
    pub annotation: PathBuf,
}

/// Uppercase letters and digits, keeps repeated augmentations of one image apart
pub fn random_suffix(rng: &mut dyn RngCore) -> String {
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect()
}

/// `data/img-076.jpeg` -> `data/augmented/img-076_<suffix>.<format>` and its `.xml`
pub fn augmented_paths(original: &Path, suffix: &str, format: OutputFormat) -> Result<OutputPaths> {
    let stem = original
        .file_stem()
        .ok_or_else(|| AugmentError::MissingInputFile {
            path: original.to_path_buf(),
        })?
        .to_string_lossy();
    let sub_dir = original
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(AUGMENTED_DIR);
    let image = sub_dir.join(format!("{}_{}.{}", stem, suffix, format.extension()));
    let annotation = annotation_path_for(&image);
    Ok(OutputPaths { image, annotation })
}

/// Encodes in memory, nothing touches the disk if this fails
pub fn encode_image(img: &RgbImage, format: OutputFormat, destination: &Path) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format.image_format())
        .map_err(|e| AugmentError::ImageEncode {
            path: destination.to_path_buf(),
            reason: e.to_string(),
        })?;
    if bytes.is_empty() {
        return Err(AugmentError::ImageEncode {
            path: destination.to_path_buf(),
            reason: "encoder produced no data".to_string(),
        });
    }
    Ok(bytes)
}

/// Saves the augmented image in the given format under the `augmented` sub
/// directory of the original, plus a new annotation holding the augmented box,
/// the new image size and the original label.
///
/// Both files are rendered in memory first. If the annotation can't be written
/// the image is removed again, an image never stays without its annotation.
pub fn save_augmented(
    sample: &AnnotatedImage,
    format: OutputFormat,
    rng: &mut dyn RngCore,
) -> Result<OutputPaths> {
    let suffix = random_suffix(rng);
    let paths = augmented_paths(&sample.image_path, &suffix, format)?;
    let bytes = encode_image(&sample.image, format, &paths.image)?;

    let sub_dir = paths.image.parent().unwrap_or_else(|| Path::new(""));
    if !sub_dir.as_os_str().is_empty() {
        fs::create_dir_all(sub_dir).map_err(|e| AugmentError::io(sub_dir, e))?;
    }
    let filename = paths
        .image
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let local_path = fs::canonicalize(sub_dir)
        .map(|dir| dir.join(&filename))
        .unwrap_or_else(|_| paths.image.clone())
        .to_string_lossy()
        .into_owned();
    let annotation = single_object_annotation(
        AUGMENTED_DIR,
        &filename,
        Some(local_path),
        (sample.width(), sample.height(), OUTPUT_DEPTH),
        &sample.label,
        &sample.bbox,
        0,
    );
    let xml = voc_annotation_to_string(&annotation)
        .map_err(|reason| AugmentError::malformed(&paths.annotation, reason))?;

    fs::write(&paths.image, bytes).map_err(|e| AugmentError::io(&paths.image, e))?;
    if let Err(e) = fs::write(&paths.annotation, xml) {
        if let Err(cleanup) = fs::remove_file(&paths.image) {
            warn!("could not remove {}: {}", paths.image.display(), cleanup);
        }
        return Err(AugmentError::io(&paths.annotation, e));
    }
    info!("wrote {} and {}", paths.image.display(), paths.annotation.display());
    Ok(paths)
}
