// 👤 Customer Entity

use super::Entity;
use crate::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl Customer {
    pub fn new(id: i64, name: &str, email: &str) -> Self {
        Customer {
            id,
            name: name.to_string(),
            email: email.to_string(),
        }
    }
}

impl Entity for Customer {
    const RELATION: &'static str = "customer";
    const COLUMNS: &'static [&'static str] = &["id", "name", "email"];

    fn id(&self) -> i64 {
        self.id
    }

    fn to_row(&self) -> Vec<Value> {
        vec![
            Value::Int(self.id),
            Value::text(&self.name),
            Value::text(&self.email),
        ]
    }
}
