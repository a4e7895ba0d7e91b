// Sat Oct 17 2026 - Alex

pub mod diagnostics;
pub mod report;

pub use diagnostics::DiagnosticsWriter;
pub use report::{render_launch_summary, render_race_summary, ReportWriter};
