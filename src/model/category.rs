use crate::Result;
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The closed set of categories the statement parser assigns to transactions.
///
/// The serialized form is the display name, e.g. `"Food & Dining"`, which is what the backend
/// sends and what the dashboard shows.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Income")]
    Income,
    #[serde(rename = "Food & Dining")]
    FoodAndDining,
    #[serde(rename = "Transport & Mobility")]
    TransportAndMobility,
    #[serde(rename = "Bills & Utilities")]
    BillsAndUtilities,
    #[serde(rename = "Shopping & Entertainment")]
    ShoppingAndEntertainment,
}

serde_plain::derive_display_from_serialize!(Category);
serde_plain::derive_fromstr_from_deserialize!(Category);

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Income,
        Category::FoodAndDining,
        Category::TransportAndMobility,
        Category::BillsAndUtilities,
        Category::ShoppingAndEntertainment,
    ];
}

/// The sentinel used by the category filter to mean "no filtering".
pub const ALL_CATEGORIES: &str = "all";

/// A category filter: either everything, or exactly one category.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => *c == category,
        }
    }
}

impl Display for CategoryFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(ALL_CATEGORIES),
            CategoryFilter::Only(c) => Display::fmt(c, f),
        }
    }
}

impl Serialize for CategoryFilter {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl FromStr for CategoryFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == ALL_CATEGORIES {
            return Ok(CategoryFilter::All);
        }
        match Category::from_str(s) {
            Ok(c) => Ok(CategoryFilter::Only(c)),
            Err(_) => bail!(
                "Invalid category '{s}', expected '{ALL_CATEGORIES}' or one of: {}",
                Category::ALL
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}
