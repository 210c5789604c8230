use crate::models::ExtractionRules;
use crate::utils::IdCardError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// OCR engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OcrSettings {
    /// Tesseract language list, `+` separated.
    pub languages: String,
    pub tessdata_dir: Option<PathBuf>,
    pub preprocess: bool,
}

impl Default for OcrSettings {
    fn default() -> Self {
        OcrSettings {
            languages: "eng+ara".to_string(),
            tessdata_dir: None,
            preprocess: true,
        }
    }
}

/// Scanner configuration as read from a JSON file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScannerConfig {
    pub ocr: OcrSettings,
    pub extraction: ExtractionRules,
}

impl ScannerConfig {
    pub fn load(path: &Path) -> Result<Self, IdCardError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            IdCardError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_json(&contents)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, IdCardError> {
        let config: ScannerConfig = serde_json::from_str(json)?;
        config.extraction.check()?;
        Ok(config)
    }
}
