use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use tracing::info;

use bbox_augmenter::logging::init_logging;
use bbox_augmenter::{AugmentConfig, Augmenter, OutputFormat};

/// Writes blurred/contrasted, brighter and darker copies of every matching
/// image, with matching annotation files, under `<image dir>/augmented`.
///
/// Example: augment 'data/original/*.jpeg' false
#[derive(Parser, Debug)]
struct Args {
    /// Glob pattern of the images, each needs a sibling .xml annotation
    pattern: String,

    /// Only process the first few images (true/false)
    #[arg(value_parser = BoolishValueParser::new(), action = ArgAction::Set)]
    debug: bool,

    /// JSON file overriding parameter ranges and options
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output encoding: jpeg, jpg or png
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Random seed, fixes both the augmentations and the file name suffixes
    #[arg(short, long)]
    seed: Option<u64>,

    /// Also write an affine (scale about the center) variant
    #[arg(long)]
    affine: bool,

    /// Also write a resized variant
    #[arg(long)]
    scale: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(path) => AugmentConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AugmentConfig::default(),
    };
    if let Some(format) = args.format {
        config.output_format = format;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.affine.enabled |= args.affine;
    config.scale.enabled |= args.scale;

    let mut augmenter = Augmenter::new(&config)?;
    info!(
        "augmenting {} with stages {:?} as {}",
        args.pattern,
        augmenter.stage_names(),
        config.output_format
    );
    let summary = augmenter
        .run(&args.pattern, args.debug)
        .with_context(|| format!("augmenting {}", args.pattern))?;
    println!(
        "{} files, {} augmented images written ({} files and {} variants failed)",
        summary.files_seen, summary.variants_written, summary.files_failed, summary.variants_failed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_is_checked_by_the_parser() {
        let args = Args::try_parse_from(["augment", "data/*.jpeg", "false", "--format", ".PNG"]).unwrap();
        assert_eq!(args.format, Some(OutputFormat::Png));
        assert!(!args.debug);

        let err = Args::try_parse_from(["augment", "data/*.jpeg", "yes", "--format", "gif"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn both_positionals_are_required() {
        let err = Args::try_parse_from(["augment", "data/*.jpeg"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
