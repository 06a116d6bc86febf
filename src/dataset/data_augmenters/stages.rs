use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use tracing::debug;

use super::image_augmentations::{affine, average_blur, contrast_normalization, multiply, resize};
use crate::config::{AugmentConfig, ParamRange};
use crate::dataset::common_structs::AnnotatedImage;
use crate::error::{AugmentError, Result};
use crate::helpers::bb::{fit_to_frame, resize_bb, AffineMatrix, OutOfFramePolicy};

/// One randomized, label preserving transform of an image and its box.
///
/// Implementations draw all their parameters first and then apply that one
/// draw to both the pixels and the box, so the two can't drift apart.
pub trait AugmentationStage {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn augment(&self, sample: &AnnotatedImage, rng: &mut dyn RngCore) -> Result<AnnotatedImage>;
}

fn draw_f32(rng: &mut dyn RngCore, range: &ParamRange<f32>) -> f32 {
    rng.gen_range(range.min..=range.max)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotometricOp {
    AverageBlur,
    ContrastNormalization,
    Multiply,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiParams {
    pub order: [PhotometricOp; 3],
    pub blur_kernel: u32,
    pub contrast: f32,
    pub multiply: f32,
}

/// Blur, contrast and brightness, in a random order
#[derive(Debug, Clone)]
pub struct MultiStage {
    pub blur_kernel: ParamRange<u32>,
    pub contrast: ParamRange<f32>,
    pub multiply: ParamRange<f32>,
}

impl MultiStage {
    pub fn sample(&self, rng: &mut dyn RngCore) -> MultiParams {
        let mut order = [
            PhotometricOp::AverageBlur,
            PhotometricOp::ContrastNormalization,
            PhotometricOp::Multiply,
        ];
        order.shuffle(rng);
        MultiParams {
            order,
            blur_kernel: rng.gen_range(self.blur_kernel.min..=self.blur_kernel.max),
            contrast: draw_f32(rng, &self.contrast),
            multiply: draw_f32(rng, &self.multiply),
        }
    }

    pub fn apply(sample: &AnnotatedImage, params: &MultiParams) -> AnnotatedImage {
        let img = params.order.iter().fold(sample.image.clone(), |img, op| match op {
            PhotometricOp::AverageBlur => average_blur(&img, params.blur_kernel),
            PhotometricOp::ContrastNormalization => contrast_normalization(&img, params.contrast),
            PhotometricOp::Multiply => multiply(&img, params.multiply),
        });
        sample.with_image_and_bbox(img, sample.bbox)
    }
}

impl AugmentationStage for MultiStage {
    fn name(&self) -> &'static str {
        "multi"
    }

    fn augment(&self, sample: &AnnotatedImage, rng: &mut dyn RngCore) -> Result<AnnotatedImage> {
        let params = self.sample(rng);
        debug!("multi params {:?}", params);
        Ok(MultiStage::apply(sample, &params))
    }
}

/// Brightness change by a multiplicative factor
#[derive(Debug, Clone)]
pub struct MultiplyStage {
    name: &'static str,
    pub factor: ParamRange<f32>,
}

impl MultiplyStage {
    pub fn brighter(factor: ParamRange<f32>) -> Self {
        MultiplyStage {
            name: "brighter",
            factor,
        }
    }

    pub fn darker(factor: ParamRange<f32>) -> Self {
        MultiplyStage {
            name: "darker",
            factor,
        }
    }

    pub fn apply(sample: &AnnotatedImage, factor: f32) -> AnnotatedImage {
        sample.with_image_and_bbox(multiply(&sample.image, factor), sample.bbox)
    }
}

impl AugmentationStage for MultiplyStage {
    fn name(&self) -> &'static str {
        self.name
    }

    fn augment(&self, sample: &AnnotatedImage, rng: &mut dyn RngCore) -> Result<AnnotatedImage> {
        let factor = draw_f32(rng, &self.factor);
        debug!("{} factor {}", self.name, factor);
        Ok(MultiplyStage::apply(sample, factor))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineParams {
    pub scale: f32,
    pub rotation_deg: f32,
    pub tx: f32,
    pub ty: f32,
}

/// Scale/rotation about the image center plus a translation, same canvas size
#[derive(Debug, Clone)]
pub struct AffineStage {
    pub scale: ParamRange<f32>,
    pub rotation: ParamRange<f32>,
    pub translate: ParamRange<f32>,
    pub policy: OutOfFramePolicy,
}

impl AffineStage {
    pub fn sample(&self, rng: &mut dyn RngCore) -> AffineParams {
        AffineParams {
            scale: draw_f32(rng, &self.scale),
            rotation_deg: draw_f32(rng, &self.rotation),
            tx: draw_f32(rng, &self.translate),
            ty: draw_f32(rng, &self.translate),
        }
    }

    pub fn matrix(params: &AffineParams, width: u32, height: u32) -> AffineMatrix {
        AffineMatrix::about_center(
            params.scale,
            params.rotation_deg,
            (width as f32 / 2., height as f32 / 2.),
            (params.tx, params.ty),
        )
    }

    pub fn apply(sample: &AnnotatedImage, params: &AffineParams, policy: OutOfFramePolicy) -> Result<AnnotatedImage> {
        let (width, height) = sample.image.dimensions();
        let matrix = AffineStage::matrix(params, width, height);
        let bbox = fit_to_frame(matrix.map_box(&sample.bbox), width, height, policy)?;
        let img = affine(&sample.image, &matrix).ok_or_else(|| {
            AugmentError::InvalidConfig(format!("affine transform {:?} is not invertible", params))
        })?;
        Ok(sample.with_image_and_bbox(img, bbox))
    }
}

impl AugmentationStage for AffineStage {
    fn name(&self) -> &'static str {
        "affine"
    }

    fn augment(&self, sample: &AnnotatedImage, rng: &mut dyn RngCore) -> Result<AnnotatedImage> {
        let params = self.sample(rng);
        debug!("affine params {:?}", params);
        AffineStage::apply(sample, &params, self.policy)
    }
}

/// Resizes the whole image, the box follows the actual width/height ratios
#[derive(Debug, Clone)]
pub struct ScaleStage {
    pub scale: ParamRange<f32>,
    pub policy: OutOfFramePolicy,
}

impl ScaleStage {
    pub fn apply(sample: &AnnotatedImage, scale: f32, policy: OutOfFramePolicy) -> Result<AnnotatedImage> {
        let (img, width_ratio, height_ratio) = resize(&sample.image, scale);
        let bbox = fit_to_frame(
            resize_bb(&sample.bbox, width_ratio, height_ratio),
            img.width(),
            img.height(),
            policy,
        )?;
        Ok(sample.with_image_and_bbox(img, bbox))
    }
}

impl AugmentationStage for ScaleStage {
    fn name(&self) -> &'static str {
        "scale"
    }

    fn augment(&self, sample: &AnnotatedImage, rng: &mut dyn RngCore) -> Result<AnnotatedImage> {
        let scale = draw_f32(rng, &self.scale);
        debug!("scale factor {}", scale);
        ScaleStage::apply(sample, scale, self.policy)
    }
}

/// multi, brighter and darker, then affine and scale when enabled
pub fn stages_from_config(config: &AugmentConfig) -> Vec<Box<dyn AugmentationStage>> {
    let mut stages: Vec<Box<dyn AugmentationStage>> = vec![
        Box::new(MultiStage {
            blur_kernel: config.multi.blur_kernel,
            contrast: config.multi.contrast,
            multiply: config.multi.multiply,
        }),
        Box::new(MultiplyStage::brighter(config.brighter)),
        Box::new(MultiplyStage::darker(config.darker)),
    ];
    if config.affine.enabled {
        stages.push(Box::new(AffineStage {
            scale: config.affine.scale,
            rotation: config.affine.rotation,
            translate: config.affine.translate,
            policy: config.out_of_frame,
        }));
    }
    if config.scale.enabled {
        stages.push(Box::new(ScaleStage {
            scale: config.scale.scale,
            policy: config.out_of_frame,
        }));
    }
    stages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::common_structs::BoundingBox;
    use image::{Rgb, RgbImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::PathBuf;

    fn cat_sample() -> AnnotatedImage {
        let image = RgbImage::from_fn(100, 100, |x, y| Rgb([(x * 2) as u8, (y * 2) as u8, 100]));
        AnnotatedImage {
            image,
            bbox: BoundingBox::new(10, 10, 50, 50).unwrap(),
            label: "cat".to_string(),
            folder: "images".to_string(),
            image_path: PathBuf::from("images/cat.jpeg"),
            annotation_path: PathBuf::from("images/cat.xml"),
        }
    }

    #[test]
    fn photometric_stages_keep_the_box() {
        let sample = cat_sample();
        let mut rng = StdRng::seed_from_u64(7);
        let config = AugmentConfig::default();
        for stage in stages_from_config(&config) {
            for _ in 0..5 {
                let out = stage.augment(&sample, &mut rng).unwrap();
                assert_eq!(out.bbox, sample.bbox, "stage {}", stage.name());
                assert_eq!(out.image.dimensions(), (100, 100));
                assert_eq!(out.label, "cat");
            }
        }
    }

    #[test]
    fn brighter_brightens_and_darker_darkens() {
        let sample = cat_sample();
        let mut rng = StdRng::seed_from_u64(3);
        let brighter = MultiplyStage::brighter(ParamRange::new(1.2, 2.0));
        let darker = MultiplyStage::darker(ParamRange::new(0.2, 0.9));
        let bright = brighter.augment(&sample, &mut rng).unwrap();
        let dark = darker.augment(&sample, &mut rng).unwrap();
        let probe = sample.image.get_pixel(40, 40).0[2];
        assert!(bright.image.get_pixel(40, 40).0[2] > probe);
        assert!(dark.image.get_pixel(40, 40).0[2] < probe);
    }

    #[test]
    fn same_seed_same_output() {
        let sample = cat_sample();
        let stage = MultiStage {
            blur_kernel: ParamRange::new(2, 11),
            contrast: ParamRange::new(0.5, 1.5),
            multiply: ParamRange::new(0.5, 1.5),
        };
        let a = stage.augment(&sample, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = stage.augment(&sample, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn multi_params_follow_ranges() {
        let stage = MultiStage {
            blur_kernel: ParamRange::new(2, 11),
            contrast: ParamRange::new(0.5, 1.5),
            multiply: ParamRange::new(0.5, 1.5),
        };
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let params = stage.sample(&mut rng);
            assert!((2..=11).contains(&params.blur_kernel));
            assert!((0.5..=1.5).contains(&params.contrast));
            assert!((0.5..=1.5).contains(&params.multiply));
            for op in [
                PhotometricOp::AverageBlur,
                PhotometricOp::ContrastNormalization,
                PhotometricOp::Multiply,
            ] {
                assert!(params.order.contains(&op));
            }
        }
    }

    #[test]
    fn scale_stage_scales_box() {
        let sample = cat_sample();
        for scale in [0.5_f32, 1.5, 2.0] {
            let out = ScaleStage::apply(&sample, scale, OutOfFramePolicy::Reject).unwrap();
            let expected = (100. * scale).round() as u32;
            assert_eq!(out.image.dimensions(), (expected, expected));
            let want = [10. * scale, 10. * scale, 50. * scale, 50. * scale];
            let got = [out.bbox.xmin(), out.bbox.ymin(), out.bbox.xmax(), out.bbox.ymax()];
            for (g, w) in got.iter().zip(want.iter()) {
                assert!((*g as f32 - w).abs() <= 1.0, "{:?} vs {:?}", got, want);
            }
        }
    }

    #[test]
    fn affine_zoom_keeps_box_consistent() {
        let sample = cat_sample();
        let params = AffineParams {
            scale: 0.5,
            rotation_deg: 0.,
            tx: 0.,
            ty: 0.,
        };
        let out = AffineStage::apply(&sample, &params, OutOfFramePolicy::Reject).unwrap();
        assert_eq!(out.image.dimensions(), (100, 100));
        // x' = 0.5 * (x - 50) + 50
        assert_eq!(out.bbox, BoundingBox::new(30, 30, 50, 50).unwrap());
    }

    #[test]
    fn affine_out_of_frame_policy() {
        let sample = cat_sample();
        let params = AffineParams {
            scale: 2.0,
            rotation_deg: 0.,
            tx: 0.,
            ty: 0.,
        };
        // box (10,10,50,50) -> (-30,-30,50,50)
        let clipped = AffineStage::apply(&sample, &params, OutOfFramePolicy::Clip).unwrap();
        assert_eq!(clipped.bbox, BoundingBox::new(0, 0, 50, 50).unwrap());
        assert!(matches!(
            AffineStage::apply(&sample, &params, OutOfFramePolicy::Reject),
            Err(AugmentError::BoxOutOfFrame { .. })
        ));

        let far_away = AffineParams {
            scale: 1.0,
            rotation_deg: 0.,
            tx: 200.,
            ty: 0.,
        };
        assert!(AffineStage::apply(&sample, &far_away, OutOfFramePolicy::Clip).is_err());
    }

    #[test]
    fn optional_stages_follow_config() {
        let mut config = AugmentConfig::default();
        assert_eq!(stages_from_config(&config).len(), 3);
        config.affine.enabled = true;
        config.scale.enabled = true;
        let names: Vec<_> = stages_from_config(&config).iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["multi", "brighter", "darker", "affine", "scale"]);
    }
}
