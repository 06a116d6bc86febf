//! The augmentation run: glob → load → every stage → write, one file at a time.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, warn};

use crate::config::{AugmentConfig, OutputFormat};
use crate::dataset::common_structs::AnnotatedImage;
use crate::dataset::data_augmenters::stages::{stages_from_config, AugmentationStage};
use crate::dataset::data_loaders::annotated_image_loader::AnnotatedImageLoader;
use crate::dataset::data_writers::augmented_writer::{save_augmented, OutputPaths};
use crate::dataset::DataLoader;
use crate::error::Result;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub files_seen: usize,
    /// Files that could not be loaded at all
    pub files_failed: usize,
    pub variants_written: usize,
    /// Single stages that failed on an otherwise loaded file
    pub variants_failed: usize,
}

pub struct Augmenter {
    stages: Vec<Box<dyn AugmentationStage>>,
    format: OutputFormat,
    debug_file_cap: usize,
    rng: StdRng,
}

impl Augmenter {
    /// Validates the config up front, a bad range never reaches the first file
    pub fn new(config: &AugmentConfig) -> Result<Augmenter> {
        config.validate()?;
        Ok(Augmenter {
            stages: stages_from_config(config),
            format: config.output_format,
            debug_file_cap: config.debug_file_cap,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Runs every stage on one loaded image and writes each result.
    /// One result per stage, a failing stage doesn't stop the others.
    pub fn augment_sample(&mut self, sample: &AnnotatedImage) -> Vec<Result<OutputPaths>> {
        let Augmenter {
            stages, format, rng, ..
        } = self;
        stages
            .iter()
            .map(|stage| {
                let augmented = stage.augment(sample, rng)?;
                save_augmented(&augmented, *format, rng)
            })
            .collect()
    }

    /// Processes every image matching `pattern`; in debug mode only the first few
    pub fn run(&mut self, pattern: &str, debug: bool) -> Result<RunSummary> {
        let limit = if debug { Some(self.debug_file_cap) } else { None };
        let mut loader = AnnotatedImageLoader::from_glob(pattern, limit)?;
        if loader.max_elem_index() == 0 {
            warn!("no file matches {}", pattern);
        }
        let mut summary = RunSummary::default();

        while let Some((img_path, loaded)) = loader.next() {
            summary.files_seen += 1;
            info!(
                "[{}/{}] {}",
                loader.next_element_index(),
                loader.max_elem_index(),
                img_path.display()
            );
            let sample = match loaded {
                Ok(sample) => sample,
                Err(e) => {
                    error!("skipping {}: {}", img_path.display(), e);
                    summary.files_failed += 1;
                    continue;
                }
            };
            for (stage, result) in self.stage_names().into_iter().zip(self.augment_sample(&sample)) {
                match result {
                    Ok(_) => summary.variants_written += 1,
                    Err(e) => {
                        error!("{} stage failed on {}: {}", stage, img_path.display(), e);
                        summary.variants_failed += 1;
                    }
                }
            }
        }

        info!(
            "done: {} files, {} failed, {} augmented images written, {} rejected",
            summary.files_seen, summary.files_failed, summary.variants_written, summary.variants_failed
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::common_structs::BoundingBox;
    use crate::dataset::data_transformers::pascal_voc::{
        annotation_path_for, read_voc_annotation, single_object_annotation, write_voc_annotation,
    };
    use crate::helpers::bb::OutOfFramePolicy;
    use image::{Rgb, RgbImage};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_sample(dir: &Path, stem: &str) {
        let img_path = dir.join(format!("{}.jpeg", stem));
        RgbImage::from_fn(100, 100, |x, y| Rgb([x as u8, y as u8, 128]))
            .save(&img_path)
            .unwrap();
        let bbox = BoundingBox::new(10, 10, 50, 50).unwrap();
        let annotation =
            single_object_annotation("images", &format!("{}.jpeg", stem), None, (100, 100, 3), "cat", &bbox, 0);
        write_voc_annotation(&annotation, &annotation_path_for(&img_path)).unwrap();
    }

    fn pattern(dir: &Path) -> String {
        format!("{}/*.jpeg", dir.display())
    }

    #[test]
    fn three_variants_per_image() {
        let dir = TempDir::new().unwrap();
        write_sample(dir.path(), "a");
        write_sample(dir.path(), "b");
        let mut augmenter = Augmenter::new(&AugmentConfig::default()).unwrap();
        let summary = augmenter.run(&pattern(dir.path()), false).unwrap();
        assert_eq!(summary.files_seen, 2);
        assert_eq!(summary.variants_written, 6);
        assert_eq!(summary.variants_failed, 0);
        let augmented_dir = dir.path().join("augmented");
        let annotations: Vec<_> = fs::read_dir(&augmented_dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().map_or(false, |ext| ext == "xml"))
            .collect();
        assert_eq!(annotations.len(), 6);
        for xml_path in annotations {
            let annotation = read_voc_annotation(&xml_path).unwrap();
            assert_eq!(annotation.objects[0].name, "cat");
            assert_eq!(
                annotation.objects[0].bndbox.to_bounding_box().unwrap(),
                BoundingBox::new(10, 10, 50, 50).unwrap()
            );
            assert!(augmented_dir.join(&annotation.filename).is_file());
        }
    }

    #[test]
    fn broken_file_does_not_stop_the_run() {
        let dir = TempDir::new().unwrap();
        write_sample(dir.path(), "a");
        write_sample(dir.path(), "b");
        fs::remove_file(dir.path().join("a.xml")).unwrap();
        let mut augmenter = Augmenter::new(&AugmentConfig::default()).unwrap();
        let summary = augmenter.run(&pattern(dir.path()), false).unwrap();
        assert_eq!(summary.files_seen, 2);
        assert_eq!(summary.files_failed, 1);
        assert_eq!(summary.variants_written, 3);
    }

    #[test]
    fn debug_caps_files() {
        let dir = TempDir::new().unwrap();
        for stem in ["a", "b", "c", "d", "e", "f"] {
            write_sample(dir.path(), stem);
        }
        let mut augmenter = Augmenter::new(&AugmentConfig::default()).unwrap();
        let summary = augmenter.run(&pattern(dir.path()), true).unwrap();
        assert_eq!(summary.files_seen, 4);
    }

    #[test]
    fn rejected_variant_is_counted_not_written() {
        let dir = TempDir::new().unwrap();
        write_sample(dir.path(), "a");
        let mut config = AugmentConfig::default();
        config.affine.enabled = true;
        // always pushes the (10,10,50,50) box far to the right
        config.affine.scale = crate::config::ParamRange::new(1.0, 1.0);
        config.affine.translate = crate::config::ParamRange::new(150., 150.);
        config.out_of_frame = OutOfFramePolicy::Clip;
        let mut augmenter = Augmenter::new(&config).unwrap();
        assert_eq!(augmenter.stage_names(), vec!["multi", "brighter", "darker", "affine"]);
        let summary = augmenter.run(&pattern(dir.path()), false).unwrap();
        assert_eq!(summary.variants_written, 3);
        assert_eq!(summary.variants_failed, 1);
        assert_eq!(fs::read_dir(dir.path().join("augmented")).unwrap().count(), 6);
    }

    #[test]
    fn invalid_config_fails_fast() {
        let mut config = AugmentConfig::default();
        config.darker = crate::config::ParamRange::new(0.9, 0.2);
        assert!(Augmenter::new(&config).is_err());
    }

    #[test]
    fn bad_pattern_fails_fast() {
        let mut augmenter = Augmenter::new(&AugmentConfig::default()).unwrap();
        assert!(augmenter.run("data/[", false).is_err());
    }
}
