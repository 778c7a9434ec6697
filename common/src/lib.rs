//! PCB Inspect Common Library
//!
//! CLIとWeb(WASM)で共有される型と画面ロジック

pub mod types;
pub mod error;
pub mod working_set;
pub mod sorter;
pub mod filter;
pub mod sort;
pub mod pagination;
pub mod chart;
pub mod detail;
pub mod progress;
pub mod export;
pub mod image;
pub mod summary;
pub mod cascade;
pub mod theme;

pub use types::{Lot, LotHeader, LotId, LotSummary, MultiSummary, RawRecord, SelectOption};
pub use error::{Error, Result};
pub use working_set::{WorkingSet, MAX_LOTS};
pub use sorter::SorterSelection;
pub use filter::FilterState;
pub use sort::{SortConfig, SortDirection};
pub use chart::{AnalysisOptions, ChartSpec, GraphType, GroupBy, Metric};
pub use detail::{DetailState, Effect, ViewMode};
pub use progress::{Abort, ProgressStore, ProgressView};
pub use export::{export_filename, ExportOptions, ExportRequest};
pub use cascade::{CascadeState, SearchQuery, Vendor};
pub use theme::Theme;
