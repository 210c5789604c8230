use crate::config::OcrSettings;
use crate::models::{RecognizedText, Token};
use crate::utils::IdCardError;
use image::DynamicImage;

/// Anything that can turn a card image into recognized text fragments.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<RecognizedText, IdCardError>;
}

/// Picks the recognizer compiled into this build.
pub fn default_recognizer(settings: &OcrSettings) -> Box<dyn TextRecognizer> {
    #[cfg(feature = "tesseract")]
    {
        Box::new(TesseractRecognizer::new(settings.clone()))
    }
    #[cfg(not(feature = "tesseract"))]
    {
        let _ = settings;
        Box::new(UnavailableRecognizer)
    }
}

/// Stands in when no OCR engine is available; every call fails.
pub struct UnavailableRecognizer;

impl TextRecognizer for UnavailableRecognizer {
    fn recognize(&self, _image: &DynamicImage) -> Result<RecognizedText, IdCardError> {
        Err(IdCardError::OcrUnavailable(
            "built without the `tesseract` feature".to_string(),
        ))
    }
}

#[cfg(feature = "tesseract")]
pub use self::tesseract_engine::TesseractRecognizer;

#[cfg(feature = "tesseract")]
mod tesseract_engine {
    use super::{parse_tsv, TextRecognizer};
    use crate::config::OcrSettings;
    use crate::models::RecognizedText;
    use crate::processing::image::ImageProcessor;
    use crate::utils::IdCardError;
    use image::{DynamicImage, ImageFormat};
    use log::debug;
    use tesseract::Tesseract;

    pub struct TesseractRecognizer {
        settings: OcrSettings,
    }

    impl TesseractRecognizer {
        pub fn new(settings: OcrSettings) -> Self {
            TesseractRecognizer { settings }
        }
    }

    impl TextRecognizer for TesseractRecognizer {
        fn recognize(&self, image: &DynamicImage) -> Result<RecognizedText, IdCardError> {
            let prepared = if self.settings.preprocess {
                ImageProcessor::preprocess(image)
            } else {
                image.to_luma8()
            };

            // Tesseract reads from a path, so hand it a temporary PNG
            let temp_file = tempfile::Builder::new()
                .suffix(".png")
                .tempfile()
                .map_err(|e| IdCardError::Recognition(format!("Failed to create temp file: {}", e)))?;
            prepared
                .save_with_format(temp_file.path(), ImageFormat::Png)
                .map_err(|e| IdCardError::Recognition(format!("Failed to write temp image: {}", e)))?;
            let path_str = temp_file
                .path()
                .to_str()
                .ok_or_else(|| IdCardError::Recognition("Temp path is not valid UTF-8".to_string()))?;

            let tessdata = self
                .settings
                .tessdata_dir
                .as_deref()
                .and_then(|dir| dir.to_str());

            let mut tess = Tesseract::new(tessdata, Some(self.settings.languages.as_str()))
                .map_err(|e| IdCardError::OcrUnavailable(format!("Tesseract init error: {}", e)))?
                .set_image(path_str)
                .map_err(|e| IdCardError::Recognition(format!("Tesseract set image error: {}", e)))?
                .recognize()
                .map_err(|e| IdCardError::Recognition(format!("Tesseract recognition error: {}", e)))?;

            let tsv = tess
                .get_tsv_text(0)
                .map_err(|e| IdCardError::Recognition(format!("Tesseract TSV error: {}", e)))?;

            let text = parse_tsv(&tsv);
            debug!("Tesseract returned {} word(s)", text.tokens.len());
            Ok(text)
        }
    }
}

/// Word-level rows of Tesseract TSV output as tokens. Confidence is scaled
/// from 0..100 to 0..1; rows without a confidence or text are skipped.
#[cfg_attr(not(feature = "tesseract"), allow(dead_code))]
pub(crate) fn parse_tsv(tsv: &str) -> RecognizedText {
    const WORD_LEVEL: &str = "5";

    let tokens = tsv
        .lines()
        .filter_map(|line| {
            let columns: Vec<&str> = line.split('\t').collect();
            if columns.len() < 12 || columns[0] != WORD_LEVEL {
                return None;
            }
            let confidence: f32 = columns[10].trim().parse().ok()?;
            let text = columns[11..].join("\t");
            let text = text.trim();
            if confidence < 0.0 || text.is_empty() {
                return None;
            }
            Some(Token::new(text, confidence / 100.0))
        })
        .collect();

    RecognizedText::new(tokens)
}
