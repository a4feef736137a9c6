//! Types that represent the data the backend serves, such as `Transaction` and `Summary`.
mod amount;
mod category;
mod summary;
mod transaction;

pub use amount::Amount;
pub use category::{Category, CategoryFilter, ALL_CATEGORIES};
pub use summary::{CategorySummary, Summary, SummaryResponse, UploadResponse};
pub use transaction::{Transaction, TransactionsResponse};
