pub mod dates;
pub mod extractors;
pub mod image;
pub mod ocr;

pub use dates::{DateDisambiguator, DateRole};
pub use extractors::FieldExtractor;
pub use self::image::ImageProcessor;
pub use ocr::{default_recognizer, TextRecognizer, UnavailableRecognizer};
#[cfg(feature = "tesseract")]
pub use ocr::TesseractRecognizer;
