//! The dashboard's view logic: aggregation, the transaction table, date presets, chart data and
//! the upload panel. Everything here is synchronous and independent of how it is displayed.

pub mod aggregate;
pub mod chart;
pub mod date_range;
pub mod table;
pub mod upload;

pub use aggregate::{category_stats, totals, CategoryStat, Totals};
pub use chart::Period;
pub use date_range::{DateRange, Preset};
pub use table::{SortDirection, SortField, TableState, TableView, PAGE_SIZE};
pub use upload::{FileStatus, PdfFile, UploadPhase, UploadQueue};
