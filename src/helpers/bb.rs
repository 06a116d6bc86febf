use serde::{Deserialize, Serialize};

use crate::dataset::common_structs::BoundingBox;
use crate::error::{AugmentError, Result};

/// What to do with a box that a geometric stage pushed (partially) out of frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfFramePolicy {
    /// Clamp to the frame, reject only if nothing of the box is left
    #[default]
    Clip,
    /// Reject the sample as soon as any part of the box leaves the frame
    Reject,
}

/// Row-major 3x3 homogeneous matrix, the last row is always `0 0 1`.
///
/// The very same matrix warps the pixels and maps the box corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineMatrix(pub [f32; 9]);

impl AffineMatrix {
    pub fn identity() -> Self {
        AffineMatrix([1., 0., 0., 0., 1., 0., 0., 0., 1.])
    }

    /// Scale by `scale` and rotate by `rotation_deg` around `(cx, cy)`, then
    /// translate by `(tx, ty)`
    pub fn about_center(scale: f32, rotation_deg: f32, (cx, cy): (f32, f32), (tx, ty): (f32, f32)) -> Self {
        let rad = rotation_deg.to_radians();
        let a = scale * rad.cos();
        let b = scale * rad.sin();
        // p' = R*S*(p - c) + c + t
        AffineMatrix([
            a,
            -b,
            cx - a * cx + b * cy + tx,
            b,
            a,
            cy - b * cx - a * cy + ty,
            0.,
            0.,
            1.,
        ])
    }

    pub fn apply(&self, (x, y): (f32, f32)) -> (f32, f32) {
        let m = &self.0;
        (m[0] * x + m[1] * y + m[2], m[3] * x + m[4] * y + m[5])
    }

    /// Axis-aligned hull of the four mapped corners, in unrounded coordinates
    pub fn map_box(&self, bb: &BoundingBox) -> (f32, f32, f32, f32) {
        let corners = [
            (bb.xmin() as f32, bb.ymin() as f32),
            (bb.xmax() as f32, bb.ymin() as f32),
            (bb.xmin() as f32, bb.ymax() as f32),
            (bb.xmax() as f32, bb.ymax() as f32),
        ];
        corners.iter().map(|&c| self.apply(c)).fold(
            (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
            |(xmin, ymin, xmax, ymax), (x, y)| (xmin.min(x), ymin.min(y), xmax.max(x), ymax.max(y)),
        )
    }
}

/// Multiplies every coordinate, used when the image itself is resized.
/// For example, if you scale the image width by 0.7, set width_multiplier to 0.7 and the Bounding
/// Box should stay in the right place in the scaled image.
pub fn resize_bb(bb: &BoundingBox, width_multiplier: f32, height_multiplier: f32) -> (f32, f32, f32, f32) {
    (
        bb.xmin() as f32 * width_multiplier,
        bb.ymin() as f32 * height_multiplier,
        bb.xmax() as f32 * width_multiplier,
        bb.ymax() as f32 * height_multiplier,
    )
}

/// Rounds a transformed box and applies `policy` against a `width` x `height` frame
pub fn fit_to_frame(
    (xmin, ymin, xmax, ymax): (f32, f32, f32, f32),
    width: u32,
    height: u32,
    policy: OutOfFramePolicy,
) -> Result<BoundingBox> {
    let (xmin, ymin, xmax, ymax) = (
        xmin.round() as i32,
        ymin.round() as i32,
        xmax.round() as i32,
        ymax.round() as i32,
    );
    let out_of_frame = || AugmentError::BoxOutOfFrame {
        coords: (xmin, ymin, xmax, ymax),
        width,
        height,
    };
    let in_frame = xmin >= 0 && ymin >= 0 && xmax <= width as i32 && ymax <= height as i32;
    let rounded = match BoundingBox::new(xmin, ymin, xmax, ymax) {
        Ok(rounded) => rounded,
        // collapsed by the transform or the rounding, not by the frame
        Err(collapsed) if in_frame => return Err(collapsed),
        Err(_) => return Err(out_of_frame()),
    };
    if rounded.is_within(width, height) {
        return Ok(rounded);
    }
    match policy {
        OutOfFramePolicy::Reject => Err(out_of_frame()),
        OutOfFramePolicy::Clip => BoundingBox::new(
            xmin.max(0),
            ymin.max(0),
            xmax.min(width as i32),
            ymax.min(height as i32),
        )
        .map_err(|_| out_of_frame()),
    }
}
