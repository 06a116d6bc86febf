use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::filter::box_filter;
use imageproc::geometric_transformations::{warp, Interpolation, Projection};

use crate::helpers::bb::AffineMatrix;

// Pixel-level kernels. They take already sampled parameters, the stages in
// `stages.rs` do the sampling.

fn clamp_to_u8(value: f32) -> u8 {
    value.round().clamp(0., 255.) as u8
}

/// Multiplies every channel by `factor`; > 1 brightens, < 1 darkens
pub fn multiply(img: &RgbImage, factor: f32) -> RgbImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        pixel.0 = pixel.0.map(|c| clamp_to_u8(c as f32 * factor));
    }
    out
}

/// Stretches (`alpha` > 1) or squeezes (`alpha` < 1) intensities around mid-grey
pub fn contrast_normalization(img: &RgbImage, alpha: f32) -> RgbImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        pixel.0 = pixel.0.map(|c| clamp_to_u8(128. + alpha * (c as f32 - 128.)));
    }
    out
}

/// Mean filter with a square kernel of roughly `kernel_size` pixels.
///
/// The kernel is always odd, `2 * (kernel_size / 2) + 1`, so an even size
/// rounds up.
pub fn average_blur(img: &RgbImage, kernel_size: u32) -> RgbImage {
    let radius = kernel_size / 2;
    if radius == 0 {
        return img.clone();
    }
    let (width, height) = img.dimensions();
    let channels: Vec<GrayImage> = (0..3)
        .map(|ch| {
            let plane = GrayImage::from_fn(width, height, |x, y| Luma([img.get_pixel(x, y).0[ch]]));
            box_filter(&plane, radius, radius)
        })
        .collect();
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            channels[0].get_pixel(x, y).0[0],
            channels[1].get_pixel(x, y).0[0],
            channels[2].get_pixel(x, y).0[0],
        ])
    })
}

/// Warps `img` with `matrix` on a canvas of the same size, uncovered pixels are
/// black. `None` if the matrix can't be inverted (scale of 0).
pub fn affine(img: &RgbImage, matrix: &AffineMatrix) -> Option<RgbImage> {
    let projection = Projection::from_matrix(matrix.0)?;
    Some(warp(img, &projection, Interpolation::Bilinear, Rgb([0, 0, 0])))
}

/// Resizes by `scale` on both axes, returns the new image together with the
/// actual width and height ratios after rounding the new dimensions
pub fn resize(img: &RgbImage, scale: f32) -> (RgbImage, f32, f32) {
    let (ori_width, ori_height) = img.dimensions();
    let new_width = ((ori_width as f32 * scale).round() as u32).max(1);
    let new_height = ((ori_height as f32 * scale).round() as u32).max(1);
    let width_ratio = new_width as f32 / ori_width as f32;
    let height_ratio = new_height as f32 / ori_height as f32;
    let resized = imageops::resize(img, new_width, new_height, FilterType::Triangle);
    (resized, width_ratio, height_ratio)
}
