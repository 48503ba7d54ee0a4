//! Derivation engine.
//!
//! Data flows strictly upward: ward records become ward summaries, ward
//! summaries roll up into council summaries and the dashboard snapshot.
//! Everything here is a pure function of its inputs.

pub mod aggregator;
pub mod dashboard;
pub mod ward;

pub use aggregator::aggregate_council;
pub use dashboard::compile_dashboard;
pub use ward::{summarize_ward, WardOptions};
