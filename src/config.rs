//! Run configuration: the parameter range of every stage plus the output
//! settings. Everything has a default, a JSON file only needs the keys it
//! overrides.

use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use image::ImageFormat;
use serde::{Deserialize, Serialize};

use crate::error::{AugmentError, Result};
use crate::helpers::bb::OutOfFramePolicy;

/// Images kept from a glob when running in debug mode
pub const DEBUG_FILE_CAP: usize = 4;

/// Seed used when none is given, so two runs over the same files match
pub const DEFAULT_SEED: u64 = 1;

/// Inclusive range a stage draws one parameter from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy + std::fmt::Debug> ParamRange<T> {
    pub const fn new(min: T, max: T) -> Self {
        ParamRange { min, max }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.min > self.max {
            return Err(AugmentError::InvalidConfig(format!(
                "{}: min {:?} is greater than max {:?}",
                name, self.min, self.max
            )));
        }
        Ok(())
    }
}

impl ParamRange<f32> {
    fn validate_positive(&self, name: &str) -> Result<()> {
        self.validate(name)?;
        if !(self.min > 0.) || !self.max.is_finite() {
            return Err(AugmentError::InvalidConfig(format!(
                "{}: values must be positive and finite, got {:?}",
                name, self
            )));
        }
        Ok(())
    }
}

/// Encodings the writer can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputFormat {
    Jpeg,
    Jpg,
    Png,
}

impl OutputFormat {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg | OutputFormat::Jpg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = AugmentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "jpeg" => Ok(OutputFormat::Jpeg),
            "jpg" => Ok(OutputFormat::Jpg),
            "png" => Ok(OutputFormat::Png),
            _ => Err(AugmentError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = AugmentError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<OutputFormat> for String {
    fn from(format: OutputFormat) -> String {
        format.extension().to_string()
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiConfig {
    /// Average blur kernel size
    pub blur_kernel: ParamRange<u32>,
    pub contrast: ParamRange<f32>,
    pub multiply: ParamRange<f32>,
}

impl Default for MultiConfig {
    fn default() -> Self {
        MultiConfig {
            blur_kernel: ParamRange::new(2, 11),
            contrast: ParamRange::new(0.5, 1.5),
            multiply: ParamRange::new(0.5, 1.5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffineConfig {
    pub enabled: bool,
    pub scale: ParamRange<f32>,
    /// Degrees
    pub rotation: ParamRange<f32>,
    /// Pixels, drawn independently for x and y
    pub translate: ParamRange<f32>,
}

impl Default for AffineConfig {
    fn default() -> Self {
        AffineConfig {
            enabled: false,
            scale: ParamRange::new(0.5, 2.0),
            rotation: ParamRange::new(0., 0.),
            translate: ParamRange::new(0., 0.),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    pub enabled: bool,
    pub scale: ParamRange<f32>,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        ScaleConfig {
            enabled: false,
            scale: ParamRange::new(0.5, 2.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    pub multi: MultiConfig,
    pub brighter: ParamRange<f32>,
    pub darker: ParamRange<f32>,
    pub affine: AffineConfig,
    pub scale: ScaleConfig,
    pub out_of_frame: OutOfFramePolicy,
    pub output_format: OutputFormat,
    pub seed: u64,
    pub debug_file_cap: usize,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        AugmentConfig {
            multi: MultiConfig::default(),
            brighter: ParamRange::new(1.2, 2.0),
            darker: ParamRange::new(0.2, 0.9),
            affine: AffineConfig::default(),
            scale: ScaleConfig::default(),
            out_of_frame: OutOfFramePolicy::default(),
            output_format: OutputFormat::Jpeg,
            seed: DEFAULT_SEED,
            debug_file_cap: DEBUG_FILE_CAP,
        }
    }
}

impl AugmentConfig {
    /// Reads a (partial) config from a JSON file and validates it
    pub fn from_json_file(path: &Path) -> Result<AugmentConfig> {
        let file = File::open(path).map_err(|e| AugmentError::io(path, e))?;
        let config: AugmentConfig = serde_json::from_reader(file).map_err(|e| {
            AugmentError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.multi.blur_kernel.validate("multi.blur_kernel")?;
        if self.multi.blur_kernel.min == 0 {
            return Err(AugmentError::InvalidConfig(
                "multi.blur_kernel: kernel size must be at least 1".to_string(),
            ));
        }
        self.multi.contrast.validate_positive("multi.contrast")?;
        self.multi.multiply.validate_positive("multi.multiply")?;
        self.brighter.validate_positive("brighter")?;
        self.darker.validate_positive("darker")?;
        self.affine.scale.validate_positive("affine.scale")?;
        self.affine.rotation.validate("affine.rotation")?;
        self.affine.translate.validate("affine.translate")?;
        self.scale.scale.validate_positive("scale.scale")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AugmentConfig::default();
        config.validate().unwrap();
        assert!(!config.affine.enabled);
        assert!(!config.scale.enabled);
        assert_eq!(config.output_format, OutputFormat::Jpeg);
        assert_eq!(config.seed, 1);
    }

    #[test]
    fn format_allow_list() {
        assert_eq!("jpeg".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!(".PNG".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!("jpg".parse::<OutputFormat>().unwrap().image_format(), ImageFormat::Jpeg);
        for bad in ["bmp", "tiff", "", "jpeg2000"] {
            assert!(matches!(
                bad.parse::<OutputFormat>(),
                Err(AugmentError::UnsupportedFormat(_))
            ));
        }
    }

    #[test]
    fn partial_json_overrides() {
        let json = r#"{"darker": {"min": 0.3, "max": 0.6}, "affine": {"enabled": true},
                       "out_of_frame": "reject", "output_format": "png"}"#;
        let config: AugmentConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap();
        assert_eq!(config.darker, ParamRange::new(0.3, 0.6));
        assert!(config.affine.enabled);
        assert_eq!(config.affine.scale, ParamRange::new(0.5, 2.0));
        assert_eq!(config.out_of_frame, OutOfFramePolicy::Reject);
        assert_eq!(config.output_format, OutputFormat::Png);
        assert_eq!(config.brighter, ParamRange::new(1.2, 2.0));
    }

    #[test]
    fn rejects_bad_ranges() {
        let mut config = AugmentConfig::default();
        config.brighter = ParamRange::new(2.0, 1.2);
        assert!(matches!(config.validate(), Err(AugmentError::InvalidConfig(_))));

        let mut config = AugmentConfig::default();
        config.darker = ParamRange::new(0.0, 0.5);
        assert!(config.validate().is_err());

        let mut config = AugmentConfig::default();
        config.multi.blur_kernel = ParamRange::new(0, 3);
        assert!(config.validate().is_err());

        assert!(serde_json::from_str::<AugmentConfig>(r#"{"output_format": "gif"}"#).is_err());
    }
}
