//! Report building and rendering.

pub mod builder;
pub mod generator;

pub use builder::{build_dashboard_report, build_summary_report, ReportOptions};
pub use generator::{
    generate_json_report, generate_markdown_answer, generate_markdown_dashboard,
    generate_markdown_summary, write_report,
};
