//! Result extraction from solved models.

pub mod extract;
pub mod record;

pub use extract::{ExtractError, ResultExtractor};
pub use record::{Column, RecordSummary, ResultRecord, YearRow};
