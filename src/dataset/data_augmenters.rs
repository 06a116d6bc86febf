pub mod image_augmentations;
pub mod stages;
