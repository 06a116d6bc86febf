use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use bbox_augmenter::helpers::img_drawing::render_verification;
use bbox_augmenter::helpers::viewer::show_until_key_press;
use bbox_augmenter::logging::init_logging;

/// Shows an augmented image with its bounding box drawn, to check its
/// position. Press any key to close the window.
///
/// Example: verify_box data/images/augmented/hd_v1_image-076_QJMB6OOVMG.jpeg
#[derive(Parser, Debug)]
struct Args {
    /// Augmented image, its .xml annotation must sit next to it
    image: PathBuf,

    /// Write the rendering to this file instead of opening a window
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(false)?;

    let rendered = render_verification(&args.image)
        .with_context(|| format!("rendering {}", args.image.display()))?;
    match &args.output {
        Some(output) => {
            rendered
                .save(output)
                .with_context(|| format!("saving {}", output.display()))?;
            info!("box drawn to {}", output.display());
        }
        None => {
            let title = args.image.to_string_lossy();
            show_until_key_press(&title, &rendered)
                .with_context(|| format!("showing {}", args.image.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_unless_output_is_given() {
        let args = Args::try_parse_from(["verify_box", "a_QJMB6OOVMG.jpeg"]).unwrap();
        assert_eq!(args.output, None);
        let args = Args::try_parse_from(["verify_box", "a_QJMB6OOVMG.jpeg", "-o", "a.png"]).unwrap();
        assert_eq!(args.output, Some(PathBuf::from("a.png")));
    }
}
