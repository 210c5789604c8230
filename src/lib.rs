pub mod config;
pub mod id_card_validator;
pub mod models;
pub mod processing;
pub mod utils;
pub mod validation;

pub use config::ScannerConfig;
pub use id_card_validator::{BatchEntry, BatchItem, IdCardValidator};
pub use utils::IdCardError;
