use crate::model::{Amount, Category};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single dated monetary event as reported by the backend.
///
/// `amount` is positive for income and negative for spending. `recurring` is decided by the
/// server when it sees a repeating payment pattern, it is never computed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: String,
    date: NaiveDate,
    description: String,
    amount: Amount,
    #[serde(default)]
    merchant_canonical: String,
    category: Category,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    recurring: bool,
    #[serde(default)]
    import_id: String,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        date: NaiveDate,
        description: impl Into<String>,
        amount: impl Into<Amount>,
        merchant_canonical: impl Into<String>,
        category: Category,
        confidence: f64,
        recurring: bool,
        import_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            date,
            description: description.into(),
            amount: amount.into(),
            merchant_canonical: merchant_canonical.into(),
            category,
            confidence,
            recurring,
            import_id: import_id.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn merchant_canonical(&self) -> &str {
        &self.merchant_canonical
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn recurring(&self) -> bool {
        self.recurring
    }

    pub fn import_id(&self) -> &str {
        &self.import_id
    }

    /// Case-insensitive substring match against the description or the merchant.
    pub fn matches_search(&self, needle_lower: &str) -> bool {
        self.description.to_lowercase().contains(needle_lower)
            || self.merchant_canonical.to_lowercase().contains(needle_lower)
    }
}

/// The body of `GET /transactions` and `GET /recurring`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<Transaction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_backend_row() {
        let json = r#"{
            "id": "7f0c",
            "date": "2024-01-21",
            "description": "Restaurant Dinner",
            "amount": -650000,
            "merchant_canonical": "Sushi Tei",
            "category": "Food & Dining",
            "confidence": 0.92,
            "recurring": false,
            "import_id": "imp-1"
        }"#;
        let t: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(t.id(), "7f0c");
        assert_eq!(t.date(), NaiveDate::from_ymd_opt(2024, 1, 21).unwrap());
        assert_eq!(t.amount(), Amount::new(-650_000));
        assert_eq!(t.category(), Category::FoodAndDining);
        assert!(!t.recurring());
    }

    #[test]
    fn test_deserialize_missing_optional_fields() {
        let json = r#"{
            "id": "1",
            "date": "2024-01-15",
            "description": "Salary Payment",
            "amount": 5000000,
            "category": "Income"
        }"#;
        let t: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(t.merchant_canonical(), "");
        assert!(!t.recurring());
        assert_eq!(t.import_id(), "");
    }

    #[test]
    fn test_matches_search() {
        let t = Transaction::new(
            "1",
            NaiveDate::from_ymd_opt(2024, 1, 18).unwrap(),
            "Coffee Shop - Daily Brew",
            -45_000,
            "Daily Brew",
            Category::FoodAndDining,
            0.9,
            false,
            "mock-1",
        );
        assert!(t.matches_search("coffee"));
        assert!(t.matches_search("daily brew"));
        assert!(t.matches_search(""));
        assert!(!t.matches_search("netflix"));
    }
}
