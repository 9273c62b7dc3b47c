//! Project timeline dashboard core.
//!
//! Raw spreadsheet rows are normalized into a [`Dataset`] of projects, which
//! the filter engine and the period aggregator turn into the timeline,
//! workload and heatmap views.
//!
//! ```text
//! raw rows -> loader (columns + dates) -> Dataset -> filter -> reports
//! ```

pub mod cache;
pub mod columns;
pub mod config;
pub mod dates;
pub mod error;
pub mod fallback;
pub mod filter;
pub mod ingest;
pub mod loader;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;

pub use config::Config;
pub use error::IngestError;
pub use ingest::{DataOrigin, IngestOutcome, RowSource, Session};
pub use loader::{build_dataset, normalize_row};
pub use types::{Dataset, Filter, Heatmap, PeriodMode, Project, RawRow, Workload};
