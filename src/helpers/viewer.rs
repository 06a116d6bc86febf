use image::RgbImage;
use minifb::{KeyRepeat, Window, WindowOptions};

use crate::error::{AugmentError, Result};

const TARGET_FPS: usize = 30;

/// Packs RGB pixels as `0RGB` words, the layout `minifb` draws
pub fn to_window_buffer(img: &RgbImage) -> Vec<u32> {
    img.pixels()
        .map(|p| (u32::from(p[0]) << 16) | (u32::from(p[1]) << 8) | u32::from(p[2]))
        .collect()
}

/// Opens a window showing `img` and blocks until a key is pressed or the
/// window is closed
pub fn show_until_key_press(title: &str, img: &RgbImage) -> Result<()> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let buffer = to_window_buffer(img);
    let mut window = Window::new(title, width, height, WindowOptions::default())
        .map_err(|e| AugmentError::Viewer(e.to_string()))?;
    window.set_target_fps(TARGET_FPS);

    while window.is_open() && window.get_keys_pressed(KeyRepeat::No).is_empty() {
        window
            .update_with_buffer(&buffer, width, height)
            .map_err(|e| AugmentError::Viewer(e.to_string()))?;
    }
    Ok(())
}
