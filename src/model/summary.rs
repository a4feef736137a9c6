use crate::model::Amount;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Income, spending and their difference for one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub income: Amount,
    pub spend: Amount,
    pub net: Amount,
}

impl Summary {
    pub fn new(income: Amount, spend: Amount) -> Self {
        Self {
            income,
            spend,
            net: income - spend,
        }
    }
}

/// A `Summary` for one category plus the number of transactions in it.
///
/// The backend does not send `net` for categories, so it is derived when missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub income: Amount,
    pub spend: Amount,
    pub net: Amount,
    pub count: u64,
}

impl<'de> Deserialize<'de> for CategorySummary {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            income: Amount,
            #[serde(default)]
            spend: Amount,
            net: Option<Amount>,
            #[serde(default)]
            count: u64,
        }

        let raw = Raw::deserialize(deserializer)?;
        Ok(CategorySummary {
            income: raw.income,
            spend: raw.spend,
            net: raw.net.unwrap_or(raw.income - raw.spend),
            count: raw.count,
        })
    }
}

/// The body of the `/summary/*` endpoints. Keys are period keys such as `2024-01-15`,
/// `2024-W03` or `2024-01`, or category names for `/summary/category`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResponse<T> {
    pub summary: BTreeMap<String, T>,
}

impl<T> Default for SummaryResponse<T> {
    fn default() -> Self {
        Self {
            summary: BTreeMap::new(),
        }
    }
}

/// The body of `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub import_id: String,
    pub parsed_count: u64,
}
