//! Shared request and response types for the shopper commerce API.
//!
//! Only the fields the cache layer reads are modelled explicitly; everything
//! else the server sends is preserved in `extra` so that values can round-trip
//! through the query cache without loss.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field carrying a basket identifier in basket payloads.
pub const BASKET_ID_FIELD: &str = "basketId";
/// Field holding the basket list inside [`BasketsResult`].
pub const BASKETS_FIELD: &str = "baskets";
/// Field carrying an order number in order payloads.
pub const ORDER_NO_FIELD: &str = "orderNo";
/// Field carrying an address identifier in customer address payloads.
pub const ADDRESS_ID_FIELD: &str = "addressId";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
}

/// A shopping basket as returned by basket endpoints.
///
/// `basket_id` is optional because several endpoints may respond with a
/// partial document (or nothing at all).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Basket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basket_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_info: Option<CustomerInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product_items: Vec<ProductItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A customer's list of baskets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasketsResult {
    #[serde(default)]
    pub baskets: Vec<Basket>,
    #[serde(default)]
    pub total: u32,
}

impl BasketsResult {
    pub fn find(&self, basket_id: &str) -> Option<&Basket> {
        self.baskets
            .iter()
            .find(|basket| basket.basket_id.as_deref() == Some(basket_id))
    }
}

/// An order as returned by order endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_info: Option<CustomerInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn basket_keeps_unknown_fields() {
        let raw = json!({
            "basketId": "B1",
            "currency": "USD",
            "orderTotal": 42.5,
            "shipments": [{"shipmentId": "me"}]
        });

        let basket: Basket = serde_json::from_value(raw.clone()).expect("basket decodes");
        assert_eq!(basket.basket_id.as_deref(), Some("B1"));
        assert_eq!(basket.extra.get("orderTotal"), Some(&json!(42.5)));

        let back = serde_json::to_value(&basket).expect("basket encodes");
        assert_eq!(back, raw);
    }

    #[test]
    fn basket_without_id_decodes() {
        let basket: Basket = serde_json::from_value(json!({})).expect("empty basket decodes");
        assert!(basket.basket_id.is_none());
    }

    #[test]
    fn baskets_result_finds_by_id() {
        let result: BasketsResult = serde_json::from_value(json!({
            "baskets": [{"basketId": "other"}, {"basketId": "B1"}],
            "total": 2
        }))
        .expect("result decodes");

        assert!(result.find("B1").is_some());
        assert!(result.find("missing").is_none());
    }
}
