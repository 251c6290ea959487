//! Analytics core.
//!
//! Normalization, period filtering, aggregation and context extraction
//! over soil boring field reports.

pub mod aggregator;
pub mod context;
pub mod filter;
pub mod normalize;
pub mod tally;

pub use aggregator::*;
pub use context::{build_context, DEFAULT_MAX_ROWS};
pub use filter::{filter_period, filter_period_at};
pub use normalize::{normalize, normalize_dated};
pub use tally::Tally;

/// Render a number the way field staff expect to read it back:
/// whole values keep one decimal (`30.0`), others print in shortest form.
pub fn display_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
