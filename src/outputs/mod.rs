//! Output generation: charts, their storage, and JSON reports.
//!
//! # Submodules
//!
//! - [`chart`]: renders a frequency result as a PNG or SVG bar chart
//! - [`storage`]: writes charts to disk or an object store, reads inputs back
//! - [`json`]: files weekly run reports by date
//!
//! # Output Structure
//!
//! ```text
//! ./report_2025-08-16.png              # local chart
//! bucket/reports/report_20250816093000.png
//! bucket/headlines/36kr_headlines_2025-08-16_20250816093000.txt
//! bucket/metadata/latest_headlines_path.txt
//! json_output_dir/2025-08-16/report.json
//! ```

pub mod chart;
pub mod json;
pub mod storage;
