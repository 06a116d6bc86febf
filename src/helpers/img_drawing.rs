use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::dataset::common_structs::BoundingBox;
use crate::dataset::data_loaders::annotated_image_loader::load_annotated_image;
use crate::error::Result;

pub const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

pub fn draw_bb_to_img(img: &mut RgbImage, bb: &BoundingBox) {
    draw_bb_to_img_with_color(img, bb, BOX_COLOR, 2);
}

/// Draws `thickness` nested hollow rectangles, growing inwards from the box edge
pub fn draw_bb_to_img_with_color(img: &mut RgbImage, bb: &BoundingBox, color: Rgb<u8>, thickness: u32) {
    for inset in 0..thickness as i32 {
        let width = bb.width() as i32 - 2 * inset;
        let height = bb.height() as i32 - 2 * inset;
        if width <= 0 || height <= 0 {
            break;
        }
        let rec = Rect::at(bb.xmin() + inset, bb.ymin() + inset).of_size(width as u32, height as u32);
        draw_hollow_rect_mut(img, rec, color);
    }
}

/// Loads an (augmented) image with its sibling annotation and draws the box on it
pub fn render_verification(img_path: &Path) -> Result<RgbImage> {
    let annotated = load_annotated_image(img_path)?;
    let mut img = annotated.image;
    draw_bb_to_img(&mut img, &annotated.bbox);
    Ok(img)
}
