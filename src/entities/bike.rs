// 🚲 Bike Entity - priced per hour and per day, with a rental status

use super::{check_non_negative, Entity, QualityIssue};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// BIKE STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BikeStatus {
    #[serde(rename = "available")]
    Available,

    #[serde(rename = "rented")]
    Rented,

    #[serde(rename = "out of service")]
    OutOfService,
}

impl BikeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BikeStatus::Available => "available",
            BikeStatus::Rented => "rented",
            BikeStatus::OutOfService => "out of service",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(BikeStatus::Available),
            "rented" => Some(BikeStatus::Rented),
            "out of service" => Some(BikeStatus::OutOfService),
            _ => None,
        }
    }
}

impl fmt::Display for BikeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// BIKE ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bike {
    pub id: i64,
    pub model: String,

    /// Free-form category, e.g. "electric", "mountain bike", "road bike"
    pub category: String,

    pub price_per_hour: f64,
    pub price_per_day: f64,
    pub status: BikeStatus,
}

impl Bike {
    pub fn new(
        id: i64,
        model: &str,
        category: &str,
        price_per_hour: f64,
        price_per_day: f64,
        status: BikeStatus,
    ) -> Self {
        Bike {
            id,
            model: model.to_string(),
            category: category.to_string(),
            price_per_hour,
            price_per_day,
            status,
        }
    }
}

impl Entity for Bike {
    const RELATION: &'static str = "bike";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "model",
        "category",
        "price_per_hour",
        "price_per_day",
        "status",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn to_row(&self) -> Vec<Value> {
        vec![
            Value::Int(self.id),
            Value::text(&self.model),
            Value::text(&self.category),
            Value::Float(self.price_per_hour),
            Value::Float(self.price_per_day),
            Value::text(self.status.as_str()),
        ]
    }

    fn validate(&self) -> Vec<QualityIssue> {
        let mut issues = Vec::new();
        check_non_negative(&mut issues, Self::RELATION, self.id, "price_per_hour", self.price_per_hour);
        check_non_negative(&mut issues, Self::RELATION, self.id, "price_per_day", self.price_per_day);
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_through_strings() {
        for status in [BikeStatus::Available, BikeStatus::Rented, BikeStatus::OutOfService] {
            assert_eq!(BikeStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BikeStatus::parse("stolen"), None);
    }

    #[test]
    fn test_negative_price_is_reported() {
        let bike = Bike::new(4, "Trek Marlin", "mountain bike", -1.0, 40.0, BikeStatus::Available);
        let issues = bike.validate();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "price_per_hour");
        assert_eq!(issues[0].id, 4);
    }

    #[test]
    fn test_status_serializes_with_spaces() {
        let json = serde_json::to_string(&BikeStatus::OutOfService).unwrap();
        assert_eq!(json, "\"out of service\"");
    }
}
