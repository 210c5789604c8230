pub mod expiry;
pub mod format;
pub mod scoring;
pub mod verdict;

pub use expiry::ExpiryValidator;
pub use format::FormatValidator;
pub use scoring::{FieldValidator, Findings, SideScore};
pub use verdict::VerdictComposer;
