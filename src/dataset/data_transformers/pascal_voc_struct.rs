use serde::{Deserialize, Deserializer, Serialize};

/// Pascal VOC annotation as written by labelImg.
///
/// Unknown elements are ignored while reading, so files produced by other
/// tools still load as long as `filename`, `size` and the objects are there.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "annotation")]
pub struct VocAnnotation {
    #[serde(default)]
    pub folder: String,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub source: Source,
    pub size: Size,
    #[serde(default)]
    pub segmented: u8,
    #[serde(rename = "object", default)]
    pub objects: Vec<VocObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub database: String,
}

impl Default for Source {
    fn default() -> Self {
        Source {
            database: "Unknown".to_string(),
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_depth")]
    pub depth: u32,
}

fn default_depth() -> u32 {
    3
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocObject {
    pub name: String,
    #[serde(default = "default_pose")]
    pub pose: String,
    #[serde(default)]
    pub truncated: u8,
    #[serde(default)]
    pub difficult: u8,
    pub bndbox: VocBndBox,
}

fn default_pose() -> String {
    "Unspecified".to_string()
}

/// Box coordinates, element order is part of the format
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VocBndBox {
    #[serde(deserialize_with = "rounded_coordinate")]
    pub xmin: i32,
    #[serde(deserialize_with = "rounded_coordinate")]
    pub ymin: i32,
    #[serde(deserialize_with = "rounded_coordinate")]
    pub xmax: i32,
    #[serde(deserialize_with = "rounded_coordinate")]
    pub ymax: i32,
}

// Some annotation tools write "12.0" or "12.5" instead of "12"
fn rounded_coordinate<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() {
        return Err(serde::de::Error::custom("coordinate is not a finite number"));
    }
    Ok(value.round() as i32)
}
