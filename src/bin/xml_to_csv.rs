use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use bbox_augmenter::config::DEFAULT_SEED;
use bbox_augmenter::dataset::dataset_split::{xml_to_csv, DEFAULT_LABELS_DIR};
use bbox_augmenter::logging::init_logging;

/// Creates an 80/20 train/test split of the images of a folder and writes
/// train_labels.csv and test_labels.csv (filename, size, class and box of
/// every object).
///
/// Example: xml_to_csv data/images .jpeg
#[derive(Parser, Debug)]
struct Args {
    /// Folder holding the images and their .xml annotations
    folder: PathBuf,

    /// Image extension, with or without the leading dot
    extension: String,

    #[arg(short, long, default_value = DEFAULT_LABELS_DIR)]
    output_dir: PathBuf,

    /// Seed of the shuffle deciding the split
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(false)?;

    let mut rng = StdRng::seed_from_u64(args.seed);
    let summary = xml_to_csv(&args.folder, &args.extension, &args.output_dir, &mut rng)
        .with_context(|| format!("splitting {}", args.folder.display()))?;
    println!(
        "train: {} images / {} objects, test: {} images / {} objects",
        summary.train_files, summary.train_rows, summary.test_files, summary.test_rows
    );
    Ok(())
}
