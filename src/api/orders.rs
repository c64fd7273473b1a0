//! ShopperOrders queries and their cache maintenance.

use serde_json::Value;
use storefront_api_types::{BASKET_ID_FIELD, ORDER_NO_FIELD};
use tracing::debug;

use super::baskets::basket_path;
use super::customers::{customer_baskets, customer_orders};
use super::{CacheUpdateMatrix, QueryDefinition, RequestOptions};
use crate::cache::{CacheEffectSet, CacheUpdate, KeyMatch, KeyPath};
use crate::params::{OperationSchema, Params};

const GET_ORDER: OperationSchema = OperationSchema {
    name: "getOrder",
    required: &["organizationId", "orderNo", "siteId"],
    optional: &["locale"],
};

const GET_PAYMENT_METHODS_FOR_ORDER: OperationSchema = OperationSchema {
    name: "getPaymentMethodsForOrder",
    required: &["organizationId", "orderNo", "siteId"],
    optional: &["locale"],
};

const GET_TAXES_FROM_ORDER: OperationSchema = OperationSchema {
    name: "getTaxesFromOrder",
    required: &["organizationId", "orderNo", "siteId"],
    optional: &[],
};

const CREATE_ORDER: OperationSchema = OperationSchema {
    name: "createOrder",
    required: &["organizationId", "siteId"],
    optional: &["locale"],
};

const CREATE_PAYMENT_INSTRUMENT_FOR_ORDER: OperationSchema = OperationSchema {
    name: "createPaymentInstrumentForOrder",
    required: &["organizationId", "orderNo", "siteId"],
    optional: &["locale"],
};

const REMOVE_PAYMENT_INSTRUMENT_FROM_ORDER: OperationSchema = OperationSchema {
    name: "removePaymentInstrumentFromOrder",
    required: &["organizationId", "orderNo", "paymentInstrumentId", "siteId"],
    optional: &["locale"],
};

const UPDATE_PAYMENT_INSTRUMENT_FOR_ORDER: OperationSchema = OperationSchema {
    name: "updatePaymentInstrumentForOrder",
    required: &["organizationId", "orderNo", "paymentInstrumentId", "siteId"],
    optional: &["locale"],
};

/// `ROOT, "/organizations/", org, "/orders/", orderNo`.
pub fn order_path(params: &Params) -> KeyPath {
    KeyPath::organization(params)
        .literal("/orders/")
        .id(params.get_str("orderNo"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderQuery {
    GetOrder,
    GetPaymentMethodsForOrder,
    GetTaxesFromOrder,
}

impl OrderQuery {
    pub const ALL: &'static [OrderQuery] = &[
        OrderQuery::GetOrder,
        OrderQuery::GetPaymentMethodsForOrder,
        OrderQuery::GetTaxesFromOrder,
    ];
}

impl QueryDefinition for OrderQuery {
    fn schema(&self) -> &'static OperationSchema {
        match self {
            OrderQuery::GetOrder => &GET_ORDER,
            OrderQuery::GetPaymentMethodsForOrder => &GET_PAYMENT_METHODS_FOR_ORDER,
            OrderQuery::GetTaxesFromOrder => &GET_TAXES_FROM_ORDER,
        }
    }

    fn path(&self, params: &Params) -> KeyPath {
        let order = order_path(params);
        match self {
            OrderQuery::GetOrder => order,
            OrderQuery::GetPaymentMethodsForOrder => order.literal("/payment-methods"),
            OrderQuery::GetTaxesFromOrder => order.literal("/taxes"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderMutation {
    CreateOrder,
    CreatePaymentInstrumentForOrder,
    RemovePaymentInstrumentFromOrder,
    UpdatePaymentInstrumentForOrder,
}

impl OrderMutation {
    pub const ALL: &'static [OrderMutation] = &[
        OrderMutation::CreateOrder,
        OrderMutation::CreatePaymentInstrumentForOrder,
        OrderMutation::RemovePaymentInstrumentFromOrder,
        OrderMutation::UpdatePaymentInstrumentForOrder,
    ];
}

impl CacheUpdateMatrix for OrderMutation {
    fn schema(&self) -> &'static OperationSchema {
        match self {
            OrderMutation::CreateOrder => &CREATE_ORDER,
            OrderMutation::CreatePaymentInstrumentForOrder => &CREATE_PAYMENT_INSTRUMENT_FOR_ORDER,
            OrderMutation::RemovePaymentInstrumentFromOrder => {
                &REMOVE_PAYMENT_INSTRUMENT_FROM_ORDER
            }
            OrderMutation::UpdatePaymentInstrumentForOrder => &UPDATE_PAYMENT_INSTRUMENT_FOR_ORDER,
        }
    }

    fn cache_effects(
        &self,
        customer_id: Option<&str>,
        request: &RequestOptions,
        response: &Value,
    ) -> CacheEffectSet {
        let params = &request.parameters;

        match self {
            OrderMutation::CreateOrder => {
                let mut effects = CacheEffectSet::empty();

                match response_order_no(response) {
                    Some(order_no) => {
                        effects = effects.with_update(CacheUpdate::replace(
                            OrderQuery::GetOrder.key(&params.clone().with("orderNo", order_no)),
                            response.clone(),
                        ));
                    }
                    None => debug!(
                        mutation = self.name(),
                        "Response carries no order number, not seeding order key"
                    ),
                }

                // The basket an order was created from no longer exists.
                if let Some(basket_id) = consumed_basket_id(request) {
                    let basket = basket_path(&params.clone().with("basketId", basket_id));
                    effects = effects.with_remove(KeyMatch::Prefix(basket));
                }

                if let Some(customer_id) = customer_id {
                    effects = effects
                        .with_invalidate(customer_baskets(params, customer_id))
                        .with_invalidate(customer_orders(params, customer_id));
                }
                effects
            }
            OrderMutation::CreatePaymentInstrumentForOrder
            | OrderMutation::RemovePaymentInstrumentFromOrder
            | OrderMutation::UpdatePaymentInstrumentForOrder => {
                let effects = CacheEffectSet::empty()
                    .with_update(CacheUpdate::replace(
                        OrderQuery::GetOrder.key(params),
                        response.clone(),
                    ))
                    .with_invalidate(KeyMatch::Path(
                        OrderQuery::GetPaymentMethodsForOrder.path(params),
                    ));
                match customer_id {
                    Some(customer_id) => effects.with_invalidate(customer_orders(params, customer_id)),
                    None => effects,
                }
            }
        }
    }
}

fn response_order_no(response: &Value) -> Option<&str> {
    response.get(ORDER_NO_FIELD).and_then(Value::as_str)
}

fn consumed_basket_id(request: &RequestOptions) -> Option<&str> {
    request.body.as_ref()?.get(BASKET_ID_FIELD).and_then(Value::as_str)
}
