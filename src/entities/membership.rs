// 🎫 Membership Entities - membership plans and the memberships sold

use super::{check_non_negative, Entity, QualityIssue};
use crate::value::Value;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// MEMBERSHIP TYPE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipType {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
}

impl MembershipType {
    pub fn new(id: i64, name: &str, description: &str, price: f64) -> Self {
        MembershipType {
            id,
            name: name.to_string(),
            description: description.to_string(),
            price,
        }
    }
}

impl Entity for MembershipType {
    const RELATION: &'static str = "membership_type";
    const COLUMNS: &'static [&'static str] = &["id", "name", "description", "price"];

    fn id(&self) -> i64 {
        self.id
    }

    fn to_row(&self) -> Vec<Value> {
        vec![
            Value::Int(self.id),
            Value::text(&self.name),
            Value::text(&self.description),
            Value::Float(self.price),
        ]
    }

    fn validate(&self) -> Vec<QualityIssue> {
        let mut issues = Vec::new();
        check_non_negative(&mut issues, Self::RELATION, self.id, "price", self.price);
        issues
    }
}

// ============================================================================
// MEMBERSHIP
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub id: i64,
    pub membership_type_id: i64,
    pub customer_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_paid: f64,
}

impl Membership {
    pub fn new(
        id: i64,
        membership_type_id: i64,
        customer_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        total_paid: f64,
    ) -> Self {
        Membership {
            id,
            membership_type_id,
            customer_id,
            start_date,
            end_date,
            total_paid,
        }
    }
}

impl Entity for Membership {
    const RELATION: &'static str = "membership";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "membership_type_id",
        "customer_id",
        "start_date",
        "end_date",
        "total_paid",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn to_row(&self) -> Vec<Value> {
        vec![
            Value::Int(self.id),
            Value::Int(self.membership_type_id),
            Value::Int(self.customer_id),
            Value::Date(self.start_date),
            Value::Date(self.end_date),
            Value::Float(self.total_paid),
        ]
    }

    fn validate(&self) -> Vec<QualityIssue> {
        let mut issues = Vec::new();
        if self.end_date < self.start_date {
            issues.push(QualityIssue::new(
                Self::RELATION,
                self.id,
                "end_date",
                format!("ends {} before it starts {}", self.end_date, self.start_date),
            ));
        }
        check_non_negative(&mut issues, Self::RELATION, self.id, "total_paid", self.total_paid);
        issues
    }
}
