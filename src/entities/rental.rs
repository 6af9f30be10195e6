// ⏱️ Rental Entity - one bike rented by one customer

use super::{check_non_negative, Entity, QualityIssue};
use crate::value::Value;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rental {
    pub id: i64,
    pub customer_id: i64,
    pub bike_id: i64,

    #[serde(with = "sql_timestamp")]
    pub start_timestamp: NaiveDateTime,

    /// Rental length in minutes
    pub duration: i64,

    pub total_paid: f64,
}

impl Rental {
    pub fn new(
        id: i64,
        customer_id: i64,
        bike_id: i64,
        start_timestamp: NaiveDateTime,
        duration: i64,
        total_paid: f64,
    ) -> Self {
        Rental {
            id,
            customer_id,
            bike_id,
            start_timestamp,
            duration,
            total_paid,
        }
    }
}

impl Entity for Rental {
    const RELATION: &'static str = "rental";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "customer_id",
        "bike_id",
        "start_timestamp",
        "duration",
        "total_paid",
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn to_row(&self) -> Vec<Value> {
        vec![
            Value::Int(self.id),
            Value::Int(self.customer_id),
            Value::Int(self.bike_id),
            Value::Timestamp(self.start_timestamp),
            Value::Int(self.duration),
            Value::Float(self.total_paid),
        ]
    }

    fn validate(&self) -> Vec<QualityIssue> {
        let mut issues = Vec::new();
        if self.duration <= 0 {
            issues.push(QualityIssue::new(
                Self::RELATION,
                self.id,
                "duration",
                format!("must be > 0 minutes, got {}", self.duration),
            ));
        }
        check_non_negative(&mut issues, Self::RELATION, self.id, "total_paid", self.total_paid);
        issues
    }
}

/// `YYYY-MM-DD HH:MM:SS`, the way the seed files and SQLite spell timestamps.
pub(crate) mod sql_timestamp {
    use crate::value::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
