//! Quotation pipeline.

pub mod engine;
pub mod error;
pub mod types;
pub mod upstream;

pub use engine::{Outcome, QuoteEngine};
pub use error::{FetchError, PipelineError};
pub use types::{QuotationRecord, QuotationResponse, UpstreamEnvelope};
pub use upstream::{QuotationSource, UpstreamClient};
