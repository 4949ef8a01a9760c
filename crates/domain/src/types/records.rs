//! Remote record shapes
//!
//! Orders and customers type the fields the pipeline and the document store
//! care about and carry every other remote field through `extra`, so a stored
//! document is the full remote document. Customer groups are small and fully
//! typed.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient::string_or_number;
use super::time::qdm_time;

/// A store order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: i64,
    #[serde(default)]
    pub order_status: i64,
    #[serde(default)]
    pub customer_id: i64,
    #[serde(default)]
    pub customer_group_id: i64,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub currency_code: String,
    #[serde(default, with = "qdm_time")]
    pub date_added: Option<NaiveDateTime>,
    #[serde(default, with = "qdm_time")]
    pub date_modified: Option<NaiveDateTime>,
    #[serde(default, with = "qdm_time")]
    pub payment_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    #[serde(default)]
    pub order_subtotals: Vec<OrderSubtotal>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A purchased line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub product_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub options: Vec<OrderProductOption>,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub giveaway: i64,
}

/// Selected product option; the API sends its id as either a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderProductOption {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSubtotal {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: i64,
}

/// A registered store member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: i64,
    #[serde(default)]
    pub customer_group_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub telephone: String,
    #[serde(default, with = "qdm_time")]
    pub date_added: Option<NaiveDateTime>,
    #[serde(default, with = "qdm_time")]
    pub date_modified: Option<NaiveDateTime>,
    #[serde(default)]
    pub address_info: Vec<AddressInfo>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInfo {
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub address: String,
}

/// Member tier definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerGroup {
    pub customer_group_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// 0 means joining needs no approval
    #[serde(default)]
    pub approval: i64,
    /// Membership validity in years, 0 for permanent
    #[serde(default)]
    pub effective_period: i64,
    #[serde(default)]
    pub renewal_by_amount: i64,
    #[serde(default)]
    pub renewal_by_total: i64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn order_keeps_unknown_fields() {
        let raw = json!({
            "order_id": 1001,
            "order_status": 5,
            "total": 1280.0,
            "date_added": "2024-02-01T10:00:00",
            "payment_time": "",
            "order_items": [{
                "product_id": 7,
                "name": "Tea",
                "options": [{"id": 3, "name": "Size", "value": "L"}],
                "price": 640,
                "quantity": 2,
                "total": 1280
            }],
            "shipping_status": "SHIPPED",
            "utm_source": "newsletter"
        });

        let order: Order = serde_json::from_value(raw).unwrap();
        assert_eq!(order.order_id, 1001);
        assert!(order.date_added.is_some());
        assert!(order.payment_time.is_none());
        assert_eq!(order.order_items[0].options[0].id, "3");
        assert_eq!(order.extra["shipping_status"], "SHIPPED");

        let back = serde_json::to_value(&order).unwrap();
        assert_eq!(back["utm_source"], "newsletter");
        assert_eq!(back["order_id"], 1001);
    }

    #[test]
    fn customer_decodes_with_sparse_fields() {
        let customer: Customer = serde_json::from_value(json!({
            "customer_id": 9,
            "name": "Lin",
            "date_added": "bogus",
            "reward": {"total": 30, "rows": []}
        }))
        .unwrap();

        assert_eq!(customer.customer_id, 9);
        assert!(customer.date_added.is_none());
        assert!(customer.address_info.is_empty());
        assert_eq!(customer.extra["reward"]["total"], 30);
    }

    #[test]
    fn customer_group_is_fully_typed() {
        let group: CustomerGroup = serde_json::from_value(json!({
            "customer_group_id": 2,
            "name": "VIP",
            "effective_period": 1
        }))
        .unwrap();
        assert_eq!(group.name, "VIP");
        assert_eq!(group.approval, 0);
        assert_eq!(group.effective_period, 1);
    }
}
