use crate::config::ScannerConfig;
use crate::models::*;
use crate::processing::{default_recognizer, FieldExtractor, ImageProcessor, TextRecognizer};
use crate::utils::IdCardError;
use crate::validation::FieldValidator;
use chrono::{Local, NaiveDateTime};
use image::DynamicImage;
use log::{debug, info, warn};
use serde::Deserialize;
use std::path::Path;

/// One entry of a batch request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchItem {
    /// Base64 image data, optionally as a data URL.
    pub image: Option<String>,
    #[serde(default)]
    pub side: Side,
}

/// Result for one batch entry, tagged with its position in the request.
#[derive(Debug)]
pub struct BatchEntry {
    pub index: usize,
    pub side: Side,
    pub result: Result<ScanReport, IdCardError>,
}

/// Runs recognized card text through extraction and validation.
///
/// The extractor and validator hold no state between calls, so one instance
/// can serve any number of cards.
pub struct IdCardValidator {
    extractor: FieldExtractor,
    validator: FieldValidator,
    recognizer: Box<dyn TextRecognizer>,
}

impl Default for IdCardValidator {
    fn default() -> Self {
        Self::from_config(&ScannerConfig::default())
    }
}

impl IdCardValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        IdCardValidator {
            extractor: FieldExtractor::with_rules(config.extraction.clone()),
            validator: FieldValidator::new(),
            recognizer: default_recognizer(&config.ocr),
        }
    }

    pub fn with_recognizer(mut self, recognizer: Box<dyn TextRecognizer>) -> Self {
        self.recognizer = recognizer;
        self
    }

    pub fn extractor(&self) -> &FieldExtractor {
        &self.extractor
    }

    pub fn validator(&self) -> &FieldValidator {
        &self.validator
    }

    /// Extracts and validates a transcript that is already text.
    pub fn process_text(&self, raw_text: &str, side: Side) -> ScanReport {
        self.process_recognized(&RecognizedText::from_text(raw_text), side)
    }

    pub fn process_text_at(&self, raw_text: &str, side: Side, now: NaiveDateTime) -> ScanReport {
        self.process_recognized_at(&RecognizedText::from_text(raw_text), side, now)
    }

    pub fn process_recognized(&self, text: &RecognizedText, side: Side) -> ScanReport {
        self.process_recognized_at(text, side, Local::now().naive_local())
    }

    pub fn process_recognized_at(
        &self,
        text: &RecognizedText,
        side: Side,
        now: NaiveDateTime,
    ) -> ScanReport {
        let mut report = self.report_for(text, side);
        report.validation = Some(self.validator.validate_at(&report.data, side, now));
        report
    }

    /// Decodes and recognizes the image and extracts fields, without validating them.
    pub fn extract_image(&self, encoded_image: &str, side: Side) -> Result<ScanReport, IdCardError> {
        let image = ImageProcessor::decode_base64(encoded_image)?;
        let text = self.recognize(&image, side)?;
        Ok(self.report_for(&text, side))
    }

    /// Full pipeline for base64 image data.
    pub fn process_image(&self, encoded_image: &str, side: Side) -> Result<ScanReport, IdCardError> {
        let image = ImageProcessor::decode_base64(encoded_image)?;
        let text = self.recognize(&image, side)?;
        Ok(self.process_recognized(&text, side))
    }

    /// Full pipeline for an image file on disk.
    pub fn process_image_file(&self, image_path: &Path, side: Side) -> Result<ScanReport, IdCardError> {
        let image = ImageProcessor::open(image_path)?;
        let text = self.recognize(&image, side)?;
        Ok(self.process_recognized(&text, side))
    }

    /// Processes every item on its own; one failing item never affects the
    /// others. Results come back in input order.
    pub fn process_batch(&self, items: &[BatchItem]) -> Vec<BatchEntry> {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let result = match item.image.as_deref() {
                    Some(image) if !image.trim().is_empty() => self.process_image(image, item.side),
                    _ => Err(IdCardError::ImageDecoding("Image is required".to_string())),
                };
                if let Err(err) = &result {
                    warn!("Batch item {} failed: {}", index, err);
                }
                BatchEntry {
                    index,
                    side: item.side,
                    result,
                }
            })
            .collect()
    }

    fn recognize(&self, image: &DynamicImage, side: Side) -> Result<RecognizedText, IdCardError> {
        info!("Performing OCR on {} side of Emirates ID", side);
        let text = self.recognizer.recognize(image)?;
        let raw_text = text.raw_text();
        debug!(
            "Extracted raw text: {}...",
            raw_text.chars().take(100).collect::<String>()
        );
        Ok(text)
    }

    fn report_for(&self, text: &RecognizedText, side: Side) -> ScanReport {
        let raw_text = text.raw_text();
        let data = self.extractor.extract(&raw_text, side);
        ScanReport {
            side,
            data,
            raw_text,
            ocr_confidence: text.mean_confidence(),
            validation: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use chrono::NaiveDate;
    use image::ImageOutputFormat;
    use std::io::Cursor;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    /// Returns the same tokens for every image.
    struct FixedRecognizer(Vec<Token>);

    impl TextRecognizer for FixedRecognizer {
        fn recognize(&self, _image: &DynamicImage) -> Result<RecognizedText, IdCardError> {
            Ok(RecognizedText::new(self.0.clone()))
        }
    }

    struct FailingRecognizer;

    impl TextRecognizer for FailingRecognizer {
        fn recognize(&self, _image: &DynamicImage) -> Result<RecognizedText, IdCardError> {
            Err(IdCardError::Recognition("engine crashed".to_string()))
        }
    }

    fn encoded_png() -> String {
        let mut bytes = Vec::new();
        DynamicImage::new_rgb8(8, 8)
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(bytes))
    }

    fn outcome(report: &ScanReport) -> &ValidationOutcome {
        report.validation.as_ref().unwrap()
    }

    #[test]
    fn test_front_card_with_name_and_two_dates() {
        let report = IdCardValidator::new().process_text_at(
            "784-1234-5678901-2 John Smith 15/01/1990 31/12/2030",
            Side::Front,
            now(),
        );
        let expected: FieldMap = vec![
            (FieldName::IdNumber, "784-1234-5678901-2"),
            (FieldName::Name, "John Smith"),
            (FieldName::DateOfBirth, "15/01/1990"),
            (FieldName::ExpiryDate, "31/12/2030"),
        ]
        .into_iter()
        .collect();
        assert_eq!(report.data, expected);

        let outcome = outcome(&report);
        assert!(outcome.is_emirates_id);
        assert!(outcome.is_valid);
        assert!((outcome.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_front_single_past_date_becomes_birth_date() {
        let report = IdCardValidator::new().process_text_at(
            "784-1234-5678901-2 ... 31/12/2010",
            Side::Front,
            now(),
        );
        assert_eq!(report.data.get(FieldName::DateOfBirth), Some("31/12/2010"));
        assert!(!report.data.contains(FieldName::ExpiryDate));

        let outcome = outcome(&report);
        assert!(outcome.warnings.iter().any(|w| w == "Expiry date not found"));
        assert!(outcome.errors.is_empty());
        assert!(outcome.is_valid);
    }

    #[test]
    fn test_back_card_number_and_id_number() {
        let report = IdCardValidator::new().process_text_at(
            "123456789012 784-1234-5678901-2",
            Side::Back,
            now(),
        );
        assert_eq!(report.data.get(FieldName::CardNumber), Some("123456789012"));
        assert_eq!(report.data.get(FieldName::IdNumber), Some("784-1234-5678901-2"));

        let outcome = outcome(&report);
        assert!((outcome.confidence - 0.7).abs() < 1e-9);
        assert!(outcome.is_emirates_id);
        assert!(outcome.is_valid);
    }

    #[test]
    fn test_expired_card_is_invalid() {
        let report = IdCardValidator::new().process_text_at(
            "784-1234-5678901-2 Expiry 01/01/2000",
            Side::Front,
            now(),
        );
        assert_eq!(report.data.get(FieldName::ExpiryDate), Some("01/01/2000"));

        let outcome = outcome(&report);
        assert!(outcome.is_emirates_id);
        assert!(!outcome.is_valid);
        assert!(outcome.errors.iter().any(|e| e.contains("expired")));
    }

    #[test]
    fn test_text_without_dates_warns_for_both() {
        let report =
            IdCardValidator::new().process_text_at("784-1234-5678901-2 Sara Khan", Side::Front, now());
        assert!(!report.data.contains(FieldName::DateOfBirth));
        assert!(!report.data.contains(FieldName::ExpiryDate));

        let warnings = &outcome(&report).warnings;
        assert!(warnings.iter().any(|w| w == "Date of birth not found"));
        assert!(warnings.iter().any(|w| w == "Expiry date not found"));
    }

    #[test]
    fn test_spaced_id_number_gets_full_credit() {
        let report =
            IdCardValidator::new().process_text_at("ID 784 1985 7654321 3", Side::Front, now());
        assert_eq!(report.data.get(FieldName::IdNumber), Some("784-1985-7654321-3"));

        let outcome = outcome(&report);
        assert!(outcome.is_emirates_id);
        assert!((outcome.confidence - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let validator = IdCardValidator::new();
        let text = "Name: Ali Hassan 784-1990-1234567-1 Sex: M Egyptian 02/03/1991 04/05/2029";
        assert_eq!(
            validator.process_text_at(text, Side::Front, now()),
            validator.process_text_at(text, Side::Front, now())
        );
    }

    #[test]
    fn test_process_image_with_recognizer() {
        let validator = IdCardValidator::new().with_recognizer(Box::new(FixedRecognizer(vec![
            Token::new("784-1234-5678901-2", 0.9),
            Token::new("John Smith", 0.8),
            Token::new("Female", 0.7),
        ])));

        let report = validator.process_image(&encoded_png(), Side::Front).unwrap();
        assert_eq!(report.raw_text, "784-1234-5678901-2 John Smith Female");
        assert_eq!(report.data.get(FieldName::Gender), Some("Female"));
        assert!((report.ocr_confidence - 0.8).abs() < 1e-6);
        assert!(outcome(&report).is_emirates_id);

        let extracted = validator.extract_image(&encoded_png(), Side::Front).unwrap();
        assert!(extracted.validation.is_none());
        assert_eq!(extracted.data, report.data);
    }

    #[test]
    fn test_upstream_failures_propagate() {
        let validator = IdCardValidator::new().with_recognizer(Box::new(FailingRecognizer));
        let err = validator.process_image(&encoded_png(), Side::Front).unwrap_err();
        assert!(matches!(err, IdCardError::Recognition(_)));

        let err = validator.process_image("@@@", Side::Front).unwrap_err();
        assert!(matches!(err, IdCardError::ImageDecoding(_)));
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_failures() {
        let validator = IdCardValidator::new().with_recognizer(Box::new(FixedRecognizer(vec![
            Token::new("123456789012", 0.9),
        ])));
        let items = vec![
            BatchItem {
                image: Some(encoded_png()),
                side: Side::Back,
            },
            BatchItem {
                image: None,
                side: Side::Front,
            },
            BatchItem {
                image: Some("not an image".to_string()),
                side: Side::Front,
            },
        ];

        let entries = validator.process_batch(&items);
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries.iter().map(|e| e.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );

        let first = entries[0].result.as_ref().unwrap();
        assert_eq!(first.data.get(FieldName::CardNumber), Some("123456789012"));
        assert_eq!(entries[0].side, Side::Back);

        match &entries[1].result {
            Err(IdCardError::ImageDecoding(msg)) => assert_eq!(msg, "Image is required"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(entries[2].result.is_err());
    }

    #[test]
    fn test_batch_item_json() {
        let items: Vec<BatchItem> =
            serde_json::from_str(r#"[{"image": "abc", "side": "back"}, {"image": "def"}]"#).unwrap();
        assert_eq!(items[0].side, Side::Back);
        assert_eq!(items[1].side, Side::Front);
    }
}
