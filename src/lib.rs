//! Augmentation of single-object Pascal VOC detection data.
//!
//! An image and its `.xml` annotation are loaded together, every stage
//! transforms pixels and box from one parameter draw, and the results are
//! written under an `augmented` directory next to the originals. The
//! `dataset_split` module turns a folder of annotated images into train/test
//! CSV files.

pub mod config;
pub mod dataset;
pub mod error;
pub mod helpers;
pub mod logging;
pub mod pipeline;

pub use config::{AugmentConfig, OutputFormat};
pub use dataset::common_structs::{AnnotatedImage, BoundingBox, DatasetRow};
pub use error::{AugmentError, Result};
pub use pipeline::{Augmenter, RunSummary};
