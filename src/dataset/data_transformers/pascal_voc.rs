use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::pascal_voc_struct::*;
use crate::dataset::common_structs::{BoundingBox, DatasetRow};
use crate::error::{AugmentError, Result};

/// Extension of the annotation file that sits next to every image
pub const ANNOTATION_EXTENSION: &str = "xml";

/// `data/img-076.jpeg` -> `data/img-076.xml`
pub fn annotation_path_for(img_path: &Path) -> PathBuf {
    img_path.with_extension(ANNOTATION_EXTENSION)
}

/// Reads and parses a Pascal VOC file into a rust struct
pub fn read_voc_annotation(xml_path: &Path) -> Result<VocAnnotation> {
    if !xml_path.is_file() {
        return Err(AugmentError::MissingInputFile {
            path: xml_path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(xml_path).map_err(|e| AugmentError::io(xml_path, e))?;
    parse_voc_annotation(&content, xml_path)
}

/// `origin` is only used to name the file in errors
pub fn parse_voc_annotation(content: &str, origin: &Path) -> Result<VocAnnotation> {
    quick_xml::de::from_str(content).map_err(|e| AugmentError::malformed(origin, e))
}

pub fn write_voc_annotation(annotation: &VocAnnotation, xml_path: &Path) -> Result<()> {
    let xml = voc_annotation_to_string(annotation)
        .map_err(|reason| AugmentError::malformed(xml_path, reason))?;
    fs::write(xml_path, xml).map_err(|e| AugmentError::io(xml_path, e))
}

pub fn voc_annotation_to_string(annotation: &VocAnnotation) -> std::result::Result<String, String> {
    let mut xml = String::new();
    let mut serializer = quick_xml::se::Serializer::with_root(&mut xml, Some("annotation"))
        .map_err(|e| e.to_string())?;
    serializer.indent('\t', 1);
    annotation
        .serialize(serializer)
        .map_err(|e| e.to_string())?;
    xml.push('\n');
    Ok(xml)
}

impl VocBndBox {
    pub fn to_bounding_box(&self) -> Result<BoundingBox> {
        BoundingBox::new(self.xmin, self.ymin, self.xmax, self.ymax)
    }
}

impl From<&BoundingBox> for VocBndBox {
    fn from(bb: &BoundingBox) -> Self {
        VocBndBox {
            xmin: bb.xmin(),
            ymin: bb.ymin(),
            xmax: bb.xmax(),
            ymax: bb.ymax(),
        }
    }
}

impl VocAnnotation {
    /// The first object of the file, which is the only one the augmentation
    /// path looks at
    pub fn first_object(&self, origin: &Path) -> Result<&VocObject> {
        self.objects
            .first()
            .ok_or_else(|| AugmentError::malformed(origin, "annotation has no <object> entry"))
    }

    /// One `DatasetRow` per object, all sharing the file name and image size
    pub fn to_dataset_rows(&self) -> Vec<DatasetRow> {
        self.objects
            .iter()
            .map(|obj| DatasetRow {
                filename: self.filename.clone(),
                width: self.size.width,
                height: self.size.height,
                class: obj.name.clone(),
                xmin: obj.bndbox.xmin,
                ymin: obj.bndbox.ymin,
                xmax: obj.bndbox.xmax,
                ymax: obj.bndbox.ymax,
            })
            .collect()
    }
}

/// Builds the annotation of a freshly written image holding a single object.
///
/// `truncated` is set like labelImg does it: when the box reaches the image
/// border.
pub fn single_object_annotation(
    folder: &str,
    filename: &str,
    path: Option<String>,
    (width, height, depth): (u32, u32, u32),
    label: &str,
    bbox: &BoundingBox,
    difficult: u8,
) -> VocAnnotation {
    let truncated = bbox.touches_border(width, height) as u8;
    VocAnnotation {
        folder: folder.to_string(),
        filename: filename.to_string(),
        path,
        source: Source::default(),
        size: Size {
            width,
            height,
            depth,
        },
        segmented: 0,
        objects: vec![VocObject {
            name: label.to_string(),
            pose: "Unspecified".to_string(),
            truncated,
            difficult,
            bndbox: VocBndBox::from(bbox),
        }],
    }
}
