//! These structs provide the CLI interface for the spend-dash CLI.

use crate::dashboard::{Period, Preset, SortDirection, SortField};
use crate::model::CategoryFilter;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// spend-dash: A command-line dashboard for your spending.
///
/// Bank statement PDFs are uploaded to a statement-parsing backend, which extracts, categorizes
/// and stores the transactions. This program talks to that backend and shows you totals, a
/// searchable transaction table, category breakdowns and spending trends. It can also export your
/// transactions as CSV.
///
/// Run `spend-dash init` once to create the home directory and point it at your backend.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and the configuration file.
    ///
    /// The backend URL is taken from --api-url (or SPEND_DASH_API_URL) and defaults to
    /// http://localhost:8000.
    Init,
    /// Show income, spending and net for a date range.
    Summary(SummaryArgs),
    /// Show one page of the transaction table.
    Transactions(TransactionsArgs),
    /// Show spending grouped by category.
    Categories(CategoriesArgs),
    /// Show income, spending and net for the most recent periods.
    Trend(TrendArgs),
    /// Upload bank statement PDFs for parsing. All files are sent in one request.
    Upload(UploadArgs),
    /// Export every transaction to a CSV file.
    Export(ExportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the configuration is held. Defaults to ~/spend-dash
    #[arg(long, env = "SPEND_DASH_HOME", default_value_t = default_home())]
    home: DisplayPath,

    /// The base URL of the backend. Overrides the URL stored in the config for this run.
    #[arg(long, env = "SPEND_DASH_API_URL")]
    api_url: Option<String>,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf, api_url: Option<String>) -> Self {
        Self {
            log_level,
            home: home.into(),
            api_url,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }

    pub fn api_url(&self) -> Option<&str> {
        self.api_url.as_deref()
    }
}

/// Selects one of the date range presets.
#[derive(Debug, Parser, Clone)]
pub struct RangeArgs {
    /// The date range to show.
    #[arg(long, value_enum, default_value_t = Preset::ThisMonth)]
    range: Preset,

    /// Resolve the range as if today were this date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    as_of: Option<NaiveDate>,
}

impl RangeArgs {
    pub fn new(range: Preset, as_of: Option<NaiveDate>) -> Self {
        Self { range, as_of }
    }

    pub fn range(&self) -> Preset {
        self.range
    }

    /// The date to resolve the range against.
    pub fn today(&self) -> NaiveDate {
        self.as_of
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Args for the `spend-dash summary` command.
#[derive(Debug, Parser, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    range: RangeArgs,
}

impl SummaryArgs {
    pub fn new(range: RangeArgs) -> Self {
        Self { range }
    }

    pub fn range(&self) -> &RangeArgs {
        &self.range
    }
}

/// Args for the `spend-dash transactions` command.
#[derive(Debug, Parser, Clone)]
pub struct TransactionsArgs {
    #[command(flatten)]
    range: RangeArgs,

    /// Only show rows whose description or merchant contains this text, ignoring case.
    #[arg(long, default_value = "")]
    search: String,

    /// Only show rows in this category, e.g. "Food & Dining". Use "all" for every category.
    #[arg(long, default_value_t = CategoryFilter::All)]
    category: CategoryFilter,

    /// The column to sort by.
    #[arg(long, value_enum, default_value_t = SortField::Date)]
    sort: SortField,

    /// The sort direction.
    #[arg(long, value_enum, default_value_t = SortDirection::Desc)]
    direction: SortDirection,

    /// The page to show, starting at 1.
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Show the recurring transactions instead of the selected range.
    #[arg(long)]
    recurring: bool,
}

impl TransactionsArgs {
    pub fn new(range: RangeArgs) -> Self {
        Self {
            range,
            search: String::new(),
            category: CategoryFilter::All,
            sort: SortField::Date,
            direction: SortDirection::Desc,
            page: 1,
            recurring: false,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    pub fn with_sort(mut self, sort: SortField, direction: SortDirection) -> Self {
        self.sort = sort;
        self.direction = direction;
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn with_recurring(mut self, recurring: bool) -> Self {
        self.recurring = recurring;
        self
    }

    pub fn range(&self) -> &RangeArgs {
        &self.range
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn category(&self) -> CategoryFilter {
        self.category
    }

    pub fn sort(&self) -> SortField {
        self.sort
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn recurring(&self) -> bool {
        self.recurring
    }
}

/// Args for the `spend-dash categories` command.
#[derive(Debug, Parser, Clone)]
pub struct CategoriesArgs {
    #[command(flatten)]
    range: RangeArgs,
}

impl CategoriesArgs {
    pub fn new(range: RangeArgs) -> Self {
        Self { range }
    }

    pub fn range(&self) -> &RangeArgs {
        &self.range
    }
}

/// Args for the `spend-dash trend` command.
#[derive(Debug, Parser, Clone)]
pub struct TrendArgs {
    /// Group by day, ISO week or month.
    #[arg(long, value_enum, default_value_t = Period::Daily)]
    view: Period,
}

impl TrendArgs {
    pub fn new(view: Period) -> Self {
        Self { view }
    }

    pub fn view(&self) -> Period {
        self.view
    }
}

/// Args for the `spend-dash upload` command.
#[derive(Debug, Parser, Clone)]
pub struct UploadArgs {
    /// The statement files to upload. Files that are not PDFs are skipped.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl UploadArgs {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

/// Args for the `spend-dash export` command.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    /// The directory to write `transactions-<date>.csv` into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

impl ExportArgs {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("spend-dash"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or SPEND_DASH_HOME instead of relying on the default \
                home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("spend-dash")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
