// Entity Models - the five relations of the rental dataset
//
// Each entity:
// - knows its relation name and column layout (Entity trait)
// - renders itself as a relation row of Values
// - reports broken invariants as QualityIssues (never panics, never aborts)

pub mod bike;
pub mod customer;
pub mod membership;
pub mod rental;

pub use bike::{Bike, BikeStatus};
pub use customer::Customer;
pub use membership::{Membership, MembershipType};
pub use rental::Rental;

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed row that can be exposed through the relation store.
pub trait Entity {
    /// Relation name used by `RelationStore::get`.
    const RELATION: &'static str;

    /// Column names, in the order `to_row` emits values.
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> i64;

    fn to_row(&self) -> Vec<Value>;

    /// Invariant checks local to one row.
    fn validate(&self) -> Vec<QualityIssue> {
        Vec::new()
    }
}

// ============================================================================
// QUALITY ISSUES
// ============================================================================

/// A broken invariant found in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub relation: String,
    pub id: i64,
    pub field: String,
    pub message: String,
}

impl QualityIssue {
    pub fn new(relation: &str, id: i64, field: &str, message: impl Into<String>) -> Self {
        QualityIssue {
            relation: relation.to_string(),
            id,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} #{}] {}: {}", self.relation, self.id, self.field, self.message)
    }
}

/// Push an issue when `amount` is negative.
pub(crate) fn check_non_negative(
    issues: &mut Vec<QualityIssue>,
    relation: &str,
    id: i64,
    field: &str,
    amount: f64,
) {
    if amount < 0.0 {
        issues.push(QualityIssue::new(
            relation,
            id,
            field,
            format!("must be >= 0, got {}", amount),
        ));
    }
}
