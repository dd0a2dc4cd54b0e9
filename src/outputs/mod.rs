//! Report writers for JSON and HTML.
//!
//! # Submodules
//!
//! - [`json`]: Writes the full `TrendReport` for API consumption
//! - [`html`]: Renders the daily page with trending keywords and article cards
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── 2025-05-06/
//! │   └── report.json
//! └── index.html             # Latest run
//! ```

pub mod html;
pub mod json;
