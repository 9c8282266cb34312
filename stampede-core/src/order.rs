use serde::{Deserialize, Serialize};

/// A record of the orders resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub item: String,
    pub amount: i64,
}

impl Order {
    pub fn new(id: &str, item: &str, amount: i64) -> Self {
        Self {
            id: id.to_string(),
            item: item.to_string(),
            amount,
        }
    }
}

/// Body of the `increase`/`decrease` partial updates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountChange {
    pub amount: i64,
}
