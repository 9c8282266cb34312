//! Operations against the orders resource.
//!
//! ```text
//! GET    /orders                 -> [Order]
//! GET    /orders/{id}            -> Order
//! POST   /orders                 <- Order
//! PUT    /orders/{id}            <- Order
//! PUT    /orders/{id}/increase   <- {"amount": n}
//! PUT    /orders/{id}/decrease   <- {"amount": n}
//! DELETE /orders/{id}
//! ```
//!
//! `id` arguments are path templates, so `"{id}"` refers to a value captured earlier.
use crate::workload::HttpWorkload;
use serde_json::json;
use stampede_core::{ConfigError, Decode, Operation, Order};

pub fn list() -> Operation {
    Operation::get("/orders").decode(Decode::OrderList)
}

pub fn get(id: &str) -> Operation {
    Operation::get(&format!("/orders/{id}")).decode(Decode::Order)
}

pub fn create(order: &Order) -> Operation {
    Operation::post("/orders", order_body(order))
}

pub fn update(id: &str, order: &Order) -> Operation {
    Operation::put(&format!("/orders/{id}"), order_body(order))
}

pub fn increase(id: &str, amount: i64) -> Operation {
    Operation::put(&format!("/orders/{id}/increase"), json!({ "amount": amount }))
        .decode(Decode::Order)
}

pub fn decrease(id: &str, amount: i64) -> Operation {
    Operation::put(&format!("/orders/{id}/decrease"), json!({ "amount": amount }))
        .decode(Decode::Order)
}

pub fn delete(id: &str) -> Operation {
    Operation::delete(&format!("/orders/{id}"))
}

fn order_body(order: &Order) -> serde_json::Value {
    json!({
        "id": order.id,
        "item": order.item,
        "amount": order.amount,
    })
}

/// Read the whole list, then create order `3`.
pub fn stress_workload(base_url: &str) -> Result<HttpWorkload, ConfigError> {
    HttpWorkload::builder(base_url)
        .operation(list())
        .operation(create(&Order::new("3", "Item 3", 30)))
        .build()
}

/// Create an order with a fresh id, adjust its amount both ways, then delete it.
pub fn lifecycle_workload(base_url: &str) -> Result<HttpWorkload, ConfigError> {
    HttpWorkload::builder(base_url)
        .operation(
            create(&Order::new("{uuid}", "Item {user}", 10))
                .decode(Decode::Order)
                .capture("id", "/id"),
        )
        .operation(get("{id}"))
        .operation(increase("{id}", 5))
        .operation(decrease("{id}", 3))
        .operation(delete("{id}"))
        .build()
}
