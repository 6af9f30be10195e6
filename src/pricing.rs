// 🏷️ Pricing - category-keyed discount table
//
// Discounts are data, not conditionals: a new category gets a new table
// entry, and every category without an entry falls back to `default`.
// Categories read from JSON are layered over the stock entries, and a
// missing `default` keeps the stock one.

use crate::error::{ReportError, Result};
use crate::value::round_currency;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Fractions taken off the hourly and daily price (0.1 = 10% off).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub hourly: f64,
    pub daily: f64,
}

impl Discount {
    pub fn new(hourly: f64, daily: f64) -> Self {
        Discount { hourly, daily }
    }

    /// Discounted hourly price, rounded to cents.
    pub fn hourly_price(&self, price: f64) -> f64 {
        round_currency(price * (1.0 - self.hourly))
    }

    /// Discounted daily price, rounded to cents.
    pub fn daily_price(&self, price: f64) -> f64 {
        round_currency(price * (1.0 - self.daily))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscountTable {
    #[serde(deserialize_with = "over_stock_categories")]
    categories: BTreeMap<String, Discount>,
    default: Discount,
}

fn over_stock_categories<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, Discount>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut categories = DiscountTable::default().categories;
    categories.extend(BTreeMap::<String, Discount>::deserialize(deserializer)?);
    Ok(categories)
}

impl DiscountTable {
    pub fn new(default: Discount) -> Self {
        DiscountTable {
            categories: BTreeMap::new(),
            default,
        }
    }

    pub fn with_category(mut self, category: &str, discount: Discount) -> Self {
        self.insert(category, discount);
        self
    }

    pub fn insert(&mut self, category: &str, discount: Discount) {
        self.categories.insert(category.to_string(), discount);
    }

    /// Discount for `category`, or the default one.
    pub fn lookup(&self, category: &str) -> Discount {
        self.categories.get(category).copied().unwrap_or(self.default)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &Discount)> {
        self.categories.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every fraction must lie in [0, 1] so no price ever goes up or negative.
    pub fn validate(&self) -> Result<()> {
        let entries = self
            .categories
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .chain(std::iter::once(("default", &self.default)));

        for (category, discount) in entries {
            for (kind, fraction) in [("hourly", discount.hourly), ("daily", discount.daily)] {
                if !(0.0..=1.0).contains(&fraction) {
                    return Err(ReportError::InvalidConfig(format!(
                        "{} discount for '{}' must be within [0, 1], got {}",
                        kind, category, fraction
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for DiscountTable {
    fn default() -> Self {
        DiscountTable::new(Discount::new(0.5, 0.5))
            .with_category("electric", Discount::new(0.1, 0.2))
            .with_category("mountain bike", Discount::new(0.2, 0.5))
    }
}
