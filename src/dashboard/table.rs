//! The transaction table: search, category filter, sort and pagination.
//!
//! `TableState` is an immutable value. Every interaction consumes the state and returns the next
//! one, and `TableState::view` renders a page from any transaction slice. Nothing here knows how
//! the table is displayed.

use crate::model::{Category, CategoryFilter, Transaction};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Rows shown per page.
pub const PAGE_SIZE: usize = 20;

/// The columns the table can be sorted by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Date,
    Amount,
}

serde_plain::derive_display_from_serialize!(SortField);
serde_plain::derive_fromstr_from_deserialize!(SortField);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

serde_plain::derive_display_from_serialize!(SortDirection);
serde_plain::derive_fromstr_from_deserialize!(SortDirection);

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Everything the user has chosen about the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableState {
    search: String,
    category: CategoryFilter,
    sort_field: SortField,
    sort_direction: SortDirection,
    page: usize,
}

impl Default for TableState {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: CategoryFilter::All,
            sort_field: SortField::Date,
            sort_direction: SortDirection::Desc,
            page: 1,
        }
    }
}

impl TableState {
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn category(&self) -> CategoryFilter {
        self.category
    }

    pub fn sort_field(&self) -> SortField {
        self.sort_field
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Sets the search term. The page goes back to 1 so a narrower result is never shown as an
    /// empty page.
    pub fn with_search(self, search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            page: 1,
            ..self
        }
    }

    /// Sets the category filter. The page goes back to 1.
    pub fn with_category(self, category: CategoryFilter) -> Self {
        Self {
            category,
            page: 1,
            ..self
        }
    }

    /// Header click: the same field flips direction, a different field sorts descending.
    pub fn toggle_sort(self, field: SortField) -> Self {
        if self.sort_field == field {
            Self {
                sort_direction: self.sort_direction.toggled(),
                ..self
            }
        } else {
            Self {
                sort_field: field,
                sort_direction: SortDirection::Desc,
                ..self
            }
        }
    }

    pub fn with_sort(self, field: SortField, direction: SortDirection) -> Self {
        Self {
            sort_field: field,
            sort_direction: direction,
            ..self
        }
    }

    /// Jumps to `page`. Pages start at 1.
    pub fn with_page(self, page: usize) -> Self {
        Self {
            page: page.max(1),
            ..self
        }
    }

    pub fn next_page(self, total_pages: usize) -> Self {
        let page = (self.page + 1).min(total_pages).max(1);
        Self { page, ..self }
    }

    pub fn previous_page(self) -> Self {
        let page = self.page.saturating_sub(1).max(1);
        Self { page, ..self }
    }

    /// Search, then category, then sort. No pagination.
    pub fn filtered<'a>(&self, transactions: &'a [Transaction]) -> Vec<&'a Transaction> {
        let rows = apply_search(transactions.iter().collect(), &self.search);
        let mut rows = apply_category(rows, self.category);
        sort_rows(&mut rows, self.sort_field, self.sort_direction);
        rows
    }

    /// Produces the page of rows for this state.
    ///
    /// When the filtered set has shrunk below the current page, the last page is shown instead.
    pub fn view(&self, transactions: &[Transaction]) -> TableView {
        let filtered = self.filtered(transactions);
        let filtered_count = filtered.len();
        let total_pages = total_pages(filtered_count);
        let page = self.page.min(total_pages.max(1));
        let start = (page - 1) * PAGE_SIZE;
        let rows: Vec<Transaction> = filtered
            .into_iter()
            .skip(start)
            .take(PAGE_SIZE)
            .cloned()
            .collect();
        let (first, last) = if rows.is_empty() {
            (0, 0)
        } else {
            (start + 1, start + rows.len())
        };
        TableView {
            rows,
            page,
            total_pages,
            filtered_count,
            first,
            last,
            category_options: category_options(transactions),
        }
    }
}

/// One rendered page of the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub rows: Vec<Transaction>,
    pub page: usize,
    pub total_pages: usize,
    pub filtered_count: usize,
    /// 1-based index of the first row shown, 0 when nothing is shown.
    pub first: usize,
    pub last: usize,
    /// Choices for the category filter, taken from the unfiltered list.
    pub category_options: Vec<Category>,
}

impl TableView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn total_pages(filtered_count: usize) -> usize {
    filtered_count.div_ceil(PAGE_SIZE)
}

/// Keeps rows whose description or merchant contains `term`, ignoring case.
pub fn apply_search<'a>(rows: Vec<&'a Transaction>, term: &str) -> Vec<&'a Transaction> {
    let needle = term.to_lowercase();
    rows.into_iter()
        .filter(|t| t.matches_search(&needle))
        .collect()
}

pub fn apply_category(rows: Vec<&Transaction>, filter: CategoryFilter) -> Vec<&Transaction> {
    rows.into_iter()
        .filter(|t| filter.matches(t.category()))
        .collect()
}

/// Stable sort, so rows that compare equal keep their incoming order.
pub fn sort_rows(rows: &mut [&Transaction], field: SortField, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let ord = compare(a, b, field);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

fn compare(a: &Transaction, b: &Transaction, field: SortField) -> Ordering {
    match field {
        SortField::Date => a.date().cmp(&b.date()),
        SortField::Amount => a.amount().cmp(&b.amount()),
    }
}

/// The distinct categories present in `transactions`, in the order they first appear.
pub fn category_options(transactions: &[Transaction]) -> Vec<Category> {
    let mut seen = Vec::new();
    for t in transactions {
        if !seen.contains(&t.category()) {
            seen.push(t.category());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{mock_transactions, txn};

    fn ids(rows: &[Transaction]) -> Vec<&str> {
        rows.iter().map(|t| t.id()).collect()
    }

    fn many(n: usize) -> Vec<Transaction> {
        (0..n)
            .map(|i| {
                let day = (i % 28) + 1;
                txn(
                    &format!("t{i}"),
                    &format!("2024-02-{day:02}"),
                    -((i as i64) + 1) * 1000,
                    Category::ShoppingAndEntertainment,
                )
            })
            .collect()
    }

    #[test]
    fn test_default_state() {
        let state = TableState::default();
        assert_eq!(state.sort_field(), SortField::Date);
        assert_eq!(state.sort_direction(), SortDirection::Desc);
        assert_eq!(state.page(), 1);
        assert_eq!(state.category(), CategoryFilter::All);
    }

    #[test]
    fn test_food_and_dining_filter() {
        let data = mock_transactions();
        let view = TableState::default()
            .with_category(CategoryFilter::Only(Category::FoodAndDining))
            .with_sort(SortField::Date, SortDirection::Asc)
            .view(&data);
        assert_eq!(ids(&view.rows), vec!["2", "4", "7"]);
        assert_eq!(view.filtered_count, 3);
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let data = mock_transactions();
        let view = TableState::default().view(&data);
        assert_eq!(view.rows.first().unwrap().id(), "10");
        assert_eq!(view.rows.last().unwrap().id(), "1");
    }

    #[test]
    fn test_search_matches_description_or_merchant() {
        let data = mock_transactions();
        let by_description = TableState::default().with_search("PAYMENT").view(&data);
        let mut found = ids(&by_description.rows);
        found.sort();
        assert_eq!(found, vec!["1", "10", "3"]);

        let by_merchant = TableState::default().with_search("netflix").view(&data);
        assert_eq!(ids(&by_merchant.rows), vec!["6"]);
    }

    #[test]
    fn test_search_and_category_commute() {
        let data = mock_transactions();
        let all: Vec<&Transaction> = data.iter().collect();
        let filter = CategoryFilter::Only(Category::FoodAndDining);
        let a = apply_category(apply_search(all.clone(), "shop"), filter);
        let b = apply_search(apply_category(all, filter), "shop");
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_sort_by_amount() {
        let data = mock_transactions();
        let asc = TableState::default()
            .with_sort(SortField::Amount, SortDirection::Asc)
            .view(&data);
        assert_eq!(asc.rows.first().unwrap().id(), "8");
        assert_eq!(asc.rows.last().unwrap().id(), "1");
    }

    #[test]
    fn test_sort_is_idempotent_and_stable() {
        let data = vec![
            txn("a", "2024-01-02", -10, Category::Income),
            txn("b", "2024-01-01", -10, Category::Income),
            txn("c", "2024-01-03", -10, Category::Income),
            txn("d", "2024-01-01", 5, Category::Income),
        ];
        let mut once: Vec<&Transaction> = data.iter().collect();
        sort_rows(&mut once, SortField::Amount, SortDirection::Desc);
        let order: Vec<&str> = once.iter().map(|t| t.id()).collect();
        // ties keep their input order
        assert_eq!(order, vec!["d", "a", "b", "c"]);

        let mut twice = once.clone();
        sort_rows(&mut twice, SortField::Amount, SortDirection::Desc);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_toggle_sort() {
        let s = TableState::default().toggle_sort(SortField::Date);
        assert_eq!(s.sort_direction(), SortDirection::Asc);
        let s = s.toggle_sort(SortField::Date);
        assert_eq!(s.sort_direction(), SortDirection::Desc);

        let s = TableState::default()
            .toggle_sort(SortField::Date)
            .toggle_sort(SortField::Amount);
        assert_eq!(s.sort_field(), SortField::Amount);
        assert_eq!(s.sort_direction(), SortDirection::Desc);
    }

    #[test]
    fn test_pages_concatenate_to_filtered() {
        let data = many(45);
        let state = TableState::default();
        let expected: Vec<Transaction> = state.filtered(&data).into_iter().cloned().collect();
        let first = state.view(&data);
        assert_eq!(first.total_pages, 3);

        let mut all = Vec::new();
        for page in 1..=first.total_pages {
            all.extend(state.clone().with_page(page).view(&data).rows);
        }
        assert_eq!(all, expected);
    }

    #[test]
    fn test_page_bounds_and_footer() {
        let data = many(45);
        let view = TableState::default().with_page(3).view(&data);
        assert_eq!(view.rows.len(), 5);
        assert_eq!((view.first, view.last), (41, 45));

        let state = TableState::default().next_page(3).next_page(3).next_page(3);
        assert_eq!(state.page(), 3);
        let state = state.previous_page().previous_page().previous_page();
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_next_page_with_no_rows() {
        assert_eq!(TableState::default().next_page(0).page(), 1);
    }

    #[test]
    fn test_filter_change_resets_page() {
        let data = many(45);
        let state = TableState::default().with_page(3).with_search("t1");
        assert_eq!(state.page(), 1);
        let state = state.with_page(2).with_category(CategoryFilter::All);
        assert_eq!(state.page(), 1);
        assert!(!state.view(&data).is_empty());
    }

    #[test]
    fn test_out_of_range_page_shows_last_page() {
        let data = many(25);
        let view = TableState::default().with_page(9).view(&data);
        assert_eq!(view.page, 2);
        assert_eq!(view.rows.len(), 5);
    }

    #[test]
    fn test_empty_view() {
        let view = TableState::default().with_search("nothing").view(&mock_transactions());
        assert!(view.is_empty());
        assert_eq!(view.total_pages, 0);
        assert_eq!(view.page, 1);
        assert_eq!((view.first, view.last), (0, 0));
    }

    #[test]
    fn test_category_options_from_unfiltered_list() {
        let data = mock_transactions();
        let view = TableState::default()
            .with_category(CategoryFilter::Only(Category::Income))
            .view(&data);
        assert_eq!(
            view.category_options,
            vec![
                Category::Income,
                Category::FoodAndDining,
                Category::BillsAndUtilities,
                Category::TransportAndMobility,
                Category::ShoppingAndEntertainment,
            ]
        );
    }
}
