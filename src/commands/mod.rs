pub mod link;
pub mod signatures;

pub use link::{run_batch, run_link, AggregationStatus, BatchReport, PairReport, PairStatus};
pub use signatures::run_signatures;
