pub mod document;
pub mod error;
pub mod extractor;
pub mod fact;
pub mod store;

pub use document::Document;
pub use error::ScanError;
pub use extractor::FactExtractor;
pub use fact::Fact;
pub use store::{DocumentStore, LoadFailure};
