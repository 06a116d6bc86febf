//! Error types shared by the loader, the augmentation stages, the writer and
//! the dataset split.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AugmentError {
    /// The image or its sibling annotation file does not exist
    #[error("Input file not found: '{}'", path.display())]
    MissingInputFile { path: PathBuf },

    /// Output encoding is not one of jpeg, jpg or png
    #[error("Unsupported output format '{0}': format should be either jpeg, jpg or png")]
    UnsupportedFormat(String),

    /// The annotation file does not follow the Pascal VOC schema
    #[error("Malformed annotation '{}': {reason}", path.display())]
    MalformedAnnotation { path: PathBuf, reason: String },

    #[error("Invalid bounding box ({xmin}, {ymin}, {xmax}, {ymax}): min must be lower than max")]
    InvalidBox {
        xmin: i32,
        ymin: i32,
        xmax: i32,
        ymax: i32,
    },

    /// A geometric stage moved the box out of the image frame
    #[error("Bounding box {coords:?} is outside of the {width}x{height} frame")]
    BoxOutOfFrame {
        coords: (i32, i32, i32, i32),
        width: u32,
        height: u32,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to decode image '{}': {source}", path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode image '{}': {reason}", path.display())]
    ImageEncode { path: PathBuf, reason: String },

    #[error("IO error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The verification window could not be opened or drawn
    #[error("Viewer error: {0}")]
    Viewer(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),
}

impl AugmentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AugmentError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        AugmentError::MalformedAnnotation {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AugmentError>;
