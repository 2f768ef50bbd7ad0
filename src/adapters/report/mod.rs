//! Report rendering for finished runs.

mod text_report;

pub use text_report::ReportFormatter;
