use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::RngCore;
use tracing::info;
use walkdir::WalkDir;

use crate::dataset::common_structs::DatasetRow;
use crate::dataset::data_transformers::pascal_voc::{annotation_path_for, read_voc_annotation};
use crate::error::{AugmentError, Result};

pub const TRAIN_FRACTION: f64 = 0.8;
pub const DEFAULT_LABELS_DIR: &str = "data/labels";
pub const TRAIN_CSV: &str = "train_labels.csv";
pub const TEST_CSV: &str = "test_labels.csv";
pub const CSV_COLUMNS: [&str; 8] = ["filename", "width", "height", "class", "xmin", "ymin", "xmax", "ymax"];

#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train: Vec<PathBuf>,
    pub test: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitSummary {
    pub train_files: usize,
    pub test_files: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub train_csv: PathBuf,
    pub test_csv: PathBuf,
}

/// Images directly inside `folder` whose extension matches, `.jpeg` and `jpeg`
/// both accepted. Sorted so a fixed seed gives a fixed split.
pub fn list_images(folder: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(AugmentError::MissingInputFile {
            path: folder.to_path_buf(),
        });
    }
    let wanted = extension.trim_start_matches('.').to_lowercase();
    let mut images = Vec::new();
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| AugmentError::io(folder, e.into()))?;
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase() == wanted)
            .unwrap_or(false);
        if entry.file_type().is_file() && matches {
            images.push(path.to_path_buf());
        }
    }
    images.sort();
    Ok(images)
}

/// Shuffles once, the first 80% go to train and the held-out rest to test
pub fn split_train_test(mut files: Vec<PathBuf>, rng: &mut dyn RngCore) -> TrainTestSplit {
    files.shuffle(rng);
    let train_len = (TRAIN_FRACTION * files.len() as f64) as usize;
    let test = files.split_off(train_len);
    TrainTestSplit { train: files, test }
}

/// One row per object of every image's annotation file
pub fn rows_for_images(img_paths: &[PathBuf]) -> Result<Vec<DatasetRow>> {
    let mut rows = Vec::new();
    for img_path in img_paths {
        let annotation = read_voc_annotation(&annotation_path_for(img_path))?;
        rows.extend(annotation.to_dataset_rows());
    }
    Ok(rows)
}

/// The header is always written, even with no rows
pub fn write_rows_csv(rows: &[DatasetRow], csv_path: &Path) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(csv_path)?;
    wtr.write_record(CSV_COLUMNS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|e| AugmentError::io(csv_path, e))?;
    Ok(())
}

/// Lists the images of `folder`, splits them 80/20 and writes
/// `train_labels.csv` and `test_labels.csv` into `output_dir`
pub fn xml_to_csv(
    folder: &Path,
    extension: &str,
    output_dir: &Path,
    rng: &mut dyn RngCore,
) -> Result<SplitSummary> {
    let images = list_images(folder, extension)?;
    let split = split_train_test(images, rng);
    info!("Size train set: {}", split.train.len());
    info!("Size test set: {}", split.test.len());

    let train_rows = rows_for_images(&split.train)?;
    let test_rows = rows_for_images(&split.test)?;

    if !output_dir.is_dir() {
        fs::create_dir_all(output_dir).map_err(|e| AugmentError::io(output_dir, e))?;
        info!("made labels directory {}", output_dir.display());
    }
    let train_csv = output_dir.join(TRAIN_CSV);
    let test_csv = output_dir.join(TEST_CSV);
    write_rows_csv(&train_rows, &train_csv)?;
    write_rows_csv(&test_rows, &test_csv)?;
    info!("wrote {} and {}", train_csv.display(), test_csv.display());

    Ok(SplitSummary {
        train_files: split.train.len(),
        test_files: split.test.len(),
        train_rows: train_rows.len(),
        test_rows: test_rows.len(),
        train_csv,
        test_csv,
    })
}
