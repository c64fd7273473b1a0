//! ShopperBaskets queries and their cache maintenance.
//!
//! Baskets are the only resource embedded in another cached result: a
//! registered customer's basket list carries full basket documents. Effects
//! that change a basket in place therefore splice the new document into that
//! list, while effects that change membership invalidate it.

use serde_json::Value;
use storefront_api_types::{BASKET_ID_FIELD, BASKETS_FIELD};
use tracing::debug;

use super::customers::{customer_baskets, customer_baskets_key};
use super::{CacheUpdateMatrix, QueryDefinition, RequestOptions};
use crate::cache::{CacheEffectSet, CacheUpdate, KeyMatch, KeyPath, Updater};
use crate::params::{OperationSchema, Params};

const GET_BASKET: OperationSchema = OperationSchema {
    name: "getBasket",
    required: &["organizationId", "basketId", "siteId"],
    optional: &["locale"],
};

const GET_PAYMENT_METHODS_FOR_BASKET: OperationSchema = OperationSchema {
    name: "getPaymentMethodsForBasket",
    required: &["organizationId", "basketId", "siteId"],
    optional: &["locale"],
};

const GET_PRICE_BOOKS_FOR_BASKET: OperationSchema = OperationSchema {
    name: "getPriceBooksForBasket",
    required: &["organizationId", "basketId", "siteId"],
    optional: &[],
};

const GET_TAXES_FROM_BASKET: OperationSchema = OperationSchema {
    name: "getTaxesFromBasket",
    required: &["organizationId", "basketId", "siteId"],
    optional: &[],
};

const GET_SHIPPING_METHODS_FOR_SHIPMENT: OperationSchema = OperationSchema {
    name: "getShippingMethodsForShipment",
    required: &["organizationId", "basketId", "shipmentId", "siteId"],
    optional: &["locale"],
};

/// Schema of a mutation addressed by basket identifier only.
const fn on_basket(name: &'static str) -> OperationSchema {
    OperationSchema {
        name,
        required: &["organizationId", "basketId", "siteId"],
        optional: &["locale"],
    }
}

const ADD_COUPON_TO_BASKET: OperationSchema = on_basket("addCouponToBasket");
const ADD_GIFT_CERTIFICATE_ITEM_TO_BASKET: OperationSchema =
    on_basket("addGiftCertificateItemToBasket");
const ADD_ITEM_TO_BASKET: OperationSchema = on_basket("addItemToBasket");
const ADD_PAYMENT_INSTRUMENT_TO_BASKET: OperationSchema =
    on_basket("addPaymentInstrumentToBasket");
const CREATE_SHIPMENT_FOR_BASKET: OperationSchema = on_basket("createShipmentForBasket");
const UPDATE_BASKET: OperationSchema = on_basket("updateBasket");
const UPDATE_CUSTOMER_FOR_BASKET: OperationSchema = on_basket("updateCustomerForBasket");
const UPDATE_ITEMS_IN_BASKET: OperationSchema = on_basket("updateItemsInBasket");
const ADD_PRICE_BOOKS_TO_BASKET: OperationSchema = on_basket("addPriceBooksToBasket");
const ADD_TAXES_FOR_BASKET: OperationSchema = on_basket("addTaxesForBasket");
const DELETE_BASKET: OperationSchema = on_basket("deleteBasket");

const UPDATE_BILLING_ADDRESS_FOR_BASKET: OperationSchema = OperationSchema {
    name: "updateBillingAddressForBasket",
    required: &["organizationId", "basketId", "siteId"],
    optional: &["locale", "useAsShipping"],
};

const REMOVE_COUPON_FROM_BASKET: OperationSchema = OperationSchema {
    name: "removeCouponFromBasket",
    required: &["organizationId", "basketId", "couponItemId", "siteId"],
    optional: &["locale"],
};

const REMOVE_GIFT_CERTIFICATE_ITEM_FROM_BASKET: OperationSchema = OperationSchema {
    name: "removeGiftCertificateItemFromBasket",
    required: &["organizationId", "basketId", "giftCertificateItemId", "siteId"],
    optional: &["locale"],
};

const UPDATE_GIFT_CERTIFICATE_ITEM_IN_BASKET: OperationSchema = OperationSchema {
    name: "updateGiftCertificateItemInBasket",
    required: &["organizationId", "basketId", "giftCertificateItemId", "siteId"],
    optional: &["locale"],
};

const REMOVE_ITEM_FROM_BASKET: OperationSchema = OperationSchema {
    name: "removeItemFromBasket",
    required: &["organizationId", "basketId", "itemId", "siteId"],
    optional: &["locale"],
};

const UPDATE_ITEM_IN_BASKET: OperationSchema = OperationSchema {
    name: "updateItemInBasket",
    required: &["organizationId", "basketId", "itemId", "siteId"],
    optional: &["locale"],
};

const ADD_TAXES_FOR_BASKET_ITEM: OperationSchema = OperationSchema {
    name: "addTaxesForBasketItem",
    required: &["organizationId", "basketId", "itemId", "siteId"],
    optional: &[],
};

const REMOVE_PAYMENT_INSTRUMENT_FROM_BASKET: OperationSchema = OperationSchema {
    name: "removePaymentInstrumentFromBasket",
    required: &["organizationId", "basketId", "paymentInstrumentId", "siteId"],
    optional: &["locale"],
};

const UPDATE_PAYMENT_INSTRUMENT_IN_BASKET: OperationSchema = OperationSchema {
    name: "updatePaymentInstrumentInBasket",
    required: &["organizationId", "basketId", "paymentInstrumentId", "siteId"],
    optional: &["locale"],
};

const REMOVE_SHIPMENT_FROM_BASKET: OperationSchema = OperationSchema {
    name: "removeShipmentFromBasket",
    required: &["organizationId", "basketId", "shipmentId", "siteId"],
    optional: &["locale"],
};

const UPDATE_SHIPMENT_FOR_BASKET: OperationSchema = OperationSchema {
    name: "updateShipmentForBasket",
    required: &["organizationId", "basketId", "shipmentId", "siteId"],
    optional: &["locale"],
};

const UPDATE_SHIPPING_ADDRESS_FOR_SHIPMENT: OperationSchema = OperationSchema {
    name: "updateShippingAddressForShipment",
    required: &["organizationId", "basketId", "shipmentId", "siteId"],
    optional: &["locale", "useAsBilling", "removeExternalTax"],
};

const UPDATE_SHIPPING_METHOD_FOR_SHIPMENT: OperationSchema = OperationSchema {
    name: "updateShippingMethodForShipment",
    required: &["organizationId", "basketId", "shipmentId", "siteId"],
    optional: &["locale"],
};

const CREATE_BASKET: OperationSchema = OperationSchema {
    name: "createBasket",
    required: &["organizationId", "siteId"],
    optional: &["locale"],
};

const MERGE_BASKET: OperationSchema = OperationSchema {
    name: "mergeBasket",
    required: &["organizationId", "siteId"],
    optional: &["locale", "createDestinationBasket", "productItemMergeMode"],
};

const TRANSFER_BASKET: OperationSchema = OperationSchema {
    name: "transferBasket",
    required: &["organizationId", "siteId"],
    optional: &["locale", "overrideExisting", "merge"],
};

/// `ROOT, "/organizations/", org, "/baskets/", basketId`.
pub fn basket_path(params: &Params) -> KeyPath {
    KeyPath::organization(params)
        .literal("/baskets/")
        .id(params.get_str("basketId"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasketQuery {
    GetBasket,
    GetPaymentMethodsForBasket,
    GetPriceBooksForBasket,
    GetTaxesFromBasket,
    GetShippingMethodsForShipment,
}

impl BasketQuery {
    pub const ALL: &'static [BasketQuery] = &[
        BasketQuery::GetBasket,
        BasketQuery::GetPaymentMethodsForBasket,
        BasketQuery::GetPriceBooksForBasket,
        BasketQuery::GetTaxesFromBasket,
        BasketQuery::GetShippingMethodsForShipment,
    ];
}

impl QueryDefinition for BasketQuery {
    fn schema(&self) -> &'static OperationSchema {
        match self {
            BasketQuery::GetBasket => &GET_BASKET,
            BasketQuery::GetPaymentMethodsForBasket => &GET_PAYMENT_METHODS_FOR_BASKET,
            BasketQuery::GetPriceBooksForBasket => &GET_PRICE_BOOKS_FOR_BASKET,
            BasketQuery::GetTaxesFromBasket => &GET_TAXES_FROM_BASKET,
            BasketQuery::GetShippingMethodsForShipment => &GET_SHIPPING_METHODS_FOR_SHIPMENT,
        }
    }

    fn path(&self, params: &Params) -> KeyPath {
        let basket = basket_path(params);
        match self {
            BasketQuery::GetBasket => basket,
            BasketQuery::GetPaymentMethodsForBasket => basket.literal("/payment-methods"),
            BasketQuery::GetPriceBooksForBasket => basket.literal("/price-books"),
            BasketQuery::GetTaxesFromBasket => basket.literal("/taxes"),
            BasketQuery::GetShippingMethodsForShipment => basket
                .literal("/shipments/")
                .id(params.get_str("shipmentId"))
                .literal("/shipping-methods"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasketMutation {
    AddCouponToBasket,
    AddGiftCertificateItemToBasket,
    AddItemToBasket,
    AddPaymentInstrumentToBasket,
    AddPriceBooksToBasket,
    AddTaxesForBasket,
    AddTaxesForBasketItem,
    CreateBasket,
    CreateShipmentForBasket,
    DeleteBasket,
    MergeBasket,
    RemoveCouponFromBasket,
    RemoveGiftCertificateItemFromBasket,
    RemoveItemFromBasket,
    RemovePaymentInstrumentFromBasket,
    RemoveShipmentFromBasket,
    TransferBasket,
    UpdateBasket,
    UpdateBillingAddressForBasket,
    UpdateCustomerForBasket,
    UpdateGiftCertificateItemInBasket,
    UpdateItemInBasket,
    UpdateItemsInBasket,
    UpdatePaymentInstrumentInBasket,
    UpdateShipmentForBasket,
    UpdateShippingAddressForShipment,
    UpdateShippingMethodForShipment,
}

impl BasketMutation {
    pub const ALL: &'static [BasketMutation] = &[
        BasketMutation::AddCouponToBasket,
        BasketMutation::AddGiftCertificateItemToBasket,
        BasketMutation::AddItemToBasket,
        BasketMutation::AddPaymentInstrumentToBasket,
        BasketMutation::AddPriceBooksToBasket,
        BasketMutation::AddTaxesForBasket,
        BasketMutation::AddTaxesForBasketItem,
        BasketMutation::CreateBasket,
        BasketMutation::CreateShipmentForBasket,
        BasketMutation::DeleteBasket,
        BasketMutation::MergeBasket,
        BasketMutation::RemoveCouponFromBasket,
        BasketMutation::RemoveGiftCertificateItemFromBasket,
        BasketMutation::RemoveItemFromBasket,
        BasketMutation::RemovePaymentInstrumentFromBasket,
        BasketMutation::RemoveShipmentFromBasket,
        BasketMutation::TransferBasket,
        BasketMutation::UpdateBasket,
        BasketMutation::UpdateBillingAddressForBasket,
        BasketMutation::UpdateCustomerForBasket,
        BasketMutation::UpdateGiftCertificateItemInBasket,
        BasketMutation::UpdateItemInBasket,
        BasketMutation::UpdateItemsInBasket,
        BasketMutation::UpdatePaymentInstrumentInBasket,
        BasketMutation::UpdateShipmentForBasket,
        BasketMutation::UpdateShippingAddressForShipment,
        BasketMutation::UpdateShippingMethodForShipment,
    ];
}

impl CacheUpdateMatrix for BasketMutation {
    fn schema(&self) -> &'static OperationSchema {
        match self {
            BasketMutation::AddCouponToBasket => &ADD_COUPON_TO_BASKET,
            BasketMutation::AddGiftCertificateItemToBasket => &ADD_GIFT_CERTIFICATE_ITEM_TO_BASKET,
            BasketMutation::AddItemToBasket => &ADD_ITEM_TO_BASKET,
            BasketMutation::AddPaymentInstrumentToBasket => &ADD_PAYMENT_INSTRUMENT_TO_BASKET,
            BasketMutation::AddPriceBooksToBasket => &ADD_PRICE_BOOKS_TO_BASKET,
            BasketMutation::AddTaxesForBasket => &ADD_TAXES_FOR_BASKET,
            BasketMutation::AddTaxesForBasketItem => &ADD_TAXES_FOR_BASKET_ITEM,
            BasketMutation::CreateBasket => &CREATE_BASKET,
            BasketMutation::CreateShipmentForBasket => &CREATE_SHIPMENT_FOR_BASKET,
            BasketMutation::DeleteBasket => &DELETE_BASKET,
            BasketMutation::MergeBasket => &MERGE_BASKET,
            BasketMutation::RemoveCouponFromBasket => &REMOVE_COUPON_FROM_BASKET,
            BasketMutation::RemoveGiftCertificateItemFromBasket => {
                &REMOVE_GIFT_CERTIFICATE_ITEM_FROM_BASKET
            }
            BasketMutation::RemoveItemFromBasket => &REMOVE_ITEM_FROM_BASKET,
            BasketMutation::RemovePaymentInstrumentFromBasket => {
                &REMOVE_PAYMENT_INSTRUMENT_FROM_BASKET
            }
            BasketMutation::RemoveShipmentFromBasket => &REMOVE_SHIPMENT_FROM_BASKET,
            BasketMutation::TransferBasket => &TRANSFER_BASKET,
            BasketMutation::UpdateBasket => &UPDATE_BASKET,
            BasketMutation::UpdateBillingAddressForBasket => &UPDATE_BILLING_ADDRESS_FOR_BASKET,
            BasketMutation::UpdateCustomerForBasket => &UPDATE_CUSTOMER_FOR_BASKET,
            BasketMutation::UpdateGiftCertificateItemInBasket => {
                &UPDATE_GIFT_CERTIFICATE_ITEM_IN_BASKET
            }
            BasketMutation::UpdateItemInBasket => &UPDATE_ITEM_IN_BASKET,
            BasketMutation::UpdateItemsInBasket => &UPDATE_ITEMS_IN_BASKET,
            BasketMutation::UpdatePaymentInstrumentInBasket => {
                &UPDATE_PAYMENT_INSTRUMENT_IN_BASKET
            }
            BasketMutation::UpdateShipmentForBasket => &UPDATE_SHIPMENT_FOR_BASKET,
            BasketMutation::UpdateShippingAddressForShipment => {
                &UPDATE_SHIPPING_ADDRESS_FOR_SHIPMENT
            }
            BasketMutation::UpdateShippingMethodForShipment => {
                &UPDATE_SHIPPING_METHOD_FOR_SHIPMENT
            }
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
            BasketMutation::AddPaymentInstrumentToBasket
            | BasketMutation::RemovePaymentInstrumentFromBasket
            | BasketMutation::UpdatePaymentInstrumentInBasket
            | BasketMutation::UpdateBillingAddressForBasket
            | BasketMutation::UpdateCustomerForBasket => {
                update_basket(customer_id, params, response).with_invalidate(KeyMatch::Path(
                    BasketQuery::GetPaymentMethodsForBasket.path(params),
                ))
            }
            BasketMutation::AddCouponToBasket
            | BasketMutation::RemoveCouponFromBasket
            | BasketMutation::AddGiftCertificateItemToBasket
            | BasketMutation::RemoveGiftCertificateItemFromBasket
            | BasketMutation::UpdateGiftCertificateItemInBasket
            | BasketMutation::AddItemToBasket
            | BasketMutation::RemoveItemFromBasket
            | BasketMutation::UpdateItemInBasket
            | BasketMutation::UpdateItemsInBasket => update_basket(customer_id, params, response)
                .with_invalidate(KeyMatch::Path(BasketQuery::GetTaxesFromBasket.path(params))),
            BasketMutation::UpdateShipmentForBasket
            | BasketMutation::UpdateShippingAddressForShipment
            | BasketMutation::UpdateShippingMethodForShipment => {
                update_basket(customer_id, params, response).with_invalidate(KeyMatch::Path(
                    BasketQuery::GetShippingMethodsForShipment.path(params),
                ))
            }
            BasketMutation::CreateShipmentForBasket | BasketMutation::RemoveShipmentFromBasket => {
                update_basket(customer_id, params, response).with_invalidate(KeyMatch::Prefix(
                    basket_path(params).literal("/shipments/"),
                ))
            }
            BasketMutation::UpdateBasket => update_basket(customer_id, params, response),
            BasketMutation::CreateBasket
            | BasketMutation::MergeBasket
            | BasketMutation::TransferBasket => {
                let effects = match response_basket_id(response) {
                    Some(basket_id) => CacheEffectSet::empty().with_update(CacheUpdate::replace(
                        BasketQuery::GetBasket.key(&params.clone().with("basketId", basket_id)),
                        response.clone(),
                    )),
                    None => {
                        debug!(
                            mutation = self.name(),
                            "Response carries no basket identifier, not seeding basket key"
                        );
                        CacheEffectSet::empty()
                    }
                };
                invalidate_customer_baskets(effects, customer_id, params)
            }
            BasketMutation::AddPriceBooksToBasket => invalidate_customer_baskets(
                CacheEffectSet::empty()
                    .with_invalidate(KeyMatch::Path(basket_path(params)))
                    .with_invalidate(KeyMatch::Path(
                        BasketQuery::GetPriceBooksForBasket.path(params),
                    )),
                customer_id,
                params,
            ),
            BasketMutation::AddTaxesForBasket | BasketMutation::AddTaxesForBasketItem => {
                invalidate_customer_baskets(
                    CacheEffectSet::empty()
                        .with_invalidate(KeyMatch::Path(basket_path(params)))
                        .with_invalidate(KeyMatch::Path(
                            BasketQuery::GetTaxesFromBasket.path(params),
                        )),
                    customer_id,
                    params,
                )
            }
            BasketMutation::DeleteBasket => invalidate_customer_baskets(
                CacheEffectSet::empty().with_remove(KeyMatch::Prefix(basket_path(params))),
                customer_id,
                params,
            ),
        }
    }
}

/// Replace `getBasket` with `response` and splice it into the customer's
/// basket list when one is known.
fn update_basket(customer_id: Option<&str>, params: &Params, response: &Value) -> CacheEffectSet {
    let effects = CacheEffectSet::empty().with_update(CacheUpdate::replace(
        BasketQuery::GetBasket.key(params),
        response.clone(),
    ));

    let Some(customer_id) = customer_id else {
        debug!("No customer identity, customer basket list left alone");
        return effects;
    };
    let Some(basket_id) = params.get_str("basketId") else {
        debug!(customer_id, "No basket identifier, customer basket list left alone");
        return effects;
    };

    effects.with_update(CacheUpdate {
        key: customer_baskets_key(params, customer_id),
        updater: Updater::ReplaceListElement {
            list_field: BASKETS_FIELD,
            id_field: BASKET_ID_FIELD,
            id: basket_id.to_string(),
            value: response.clone(),
        },
    })
}

fn invalidate_customer_baskets(
    effects: CacheEffectSet,
    customer_id: Option<&str>,
    params: &Params,
) -> CacheEffectSet {
    match customer_id {
        Some(customer_id) => effects.with_invalidate(customer_baskets(params, customer_id)),
        None => effects,
    }
}

fn response_basket_id(response: &Value) -> Option<&str> {
    response.get(BASKET_ID_FIELD).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;
    use crate::api::customers::CustomerQuery;

    fn params() -> Params {
        Params::new()
            .with("organizationId", "f_ecom")
            .with("siteId", "RefArch")
            .with("basketId", "B1")
            .with("locale", "en-US")
            .with("currency", "USD")
    }

    fn request() -> RequestOptions {
        RequestOptions::new(params())
    }

    fn basket() -> Value {
        json!({"basketId": "B1", "productItems": [{"itemId": "i1", "quantity": 2.0}]})
    }

    #[test]
    fn every_mutation_has_a_distinct_name() {
        let names: HashSet<_> = BasketMutation::ALL.iter().map(|m| m.name()).collect();
        assert_eq!(names.len(), BasketMutation::ALL.len());
        assert_eq!(BasketMutation::ALL.len(), 27);
    }

    #[test]
    fn key_is_deterministic_and_narrowed() {
        let reordered = Params::new()
            .with("currency", "EUR")
            .with("locale", "en-US")
            .with("basketId", "B1")
            .with("siteId", "RefArch")
            .with("organizationId", "f_ecom");

        let key = BasketQuery::GetBasket.key(&params());
        assert_eq!(key, BasketQuery::GetBasket.key(&reordered));
        assert!(!key.params().contains("currency"));
    }

    #[test]
    fn secondary_keys_nest_under_basket() {
        let params = params().with("shipmentId", "me");
        let basket = basket_path(&params);
        for query in BasketQuery::ALL {
            assert!(basket.is_prefix_of(&query.path(&params)), "{query:?}");
        }
    }

    #[test]
    fn guest_update_skips_customer_aggregate() {
        let effects = BasketMutation::AddItemToBasket.cache_effects(None, &request(), &basket());

        assert_eq!(effects.update.len(), 1);
        assert_eq!(effects.update[0].key, BasketQuery::GetBasket.key(&params()));
        let customers = KeyPath::organization(&params()).literal("/customers/");
        assert!(effects.paths().all(|path| !customers.is_prefix_of(path)));
    }

    #[test]
    fn registered_update_splices_into_customer_baskets() {
        let effects =
            BasketMutation::UpdateItemInBasket.cache_effects(Some("C1"), &request(), &basket());

        let aggregate = &effects.update[1];
        assert_eq!(
            aggregate.key,
            CustomerQuery::GetCustomerBaskets.key(&params().with("customerId", "C1"))
        );
        assert_eq!(
            aggregate.updater,
            Updater::ReplaceListElement {
                list_field: "baskets",
                id_field: "basketId",
                id: "B1".to_string(),
                value: basket(),
            }
        );
    }

    #[test]
    fn payment_mutations_invalidate_payment_methods() {
        let effects = BasketMutation::AddPaymentInstrumentToBasket.cache_effects(
            None,
            &request(),
            &basket(),
        );
        assert_eq!(
            effects.invalidate,
            vec![KeyMatch::Path(
                BasketQuery::GetPaymentMethodsForBasket.path(&params())
            )]
        );
    }

    #[test]
    fn secondary_invalidations_follow_mutation_group() {
        let params = params().with("shipmentId", "me");
        let request = RequestOptions::new(params.clone());
        let payment_methods = KeyMatch::Path(BasketQuery::GetPaymentMethodsForBasket.path(&params));
        let taxes = KeyMatch::Path(BasketQuery::GetTaxesFromBasket.path(&params));
        let shipping_methods =
            KeyMatch::Path(BasketQuery::GetShippingMethodsForShipment.path(&params));
        let shipments = KeyMatch::Prefix(basket_path(&params).literal("/shipments/"));

        let cases = [
            (BasketMutation::AddPaymentInstrumentToBasket, &payment_methods),
            (BasketMutation::RemovePaymentInstrumentFromBasket, &payment_methods),
            (BasketMutation::UpdatePaymentInstrumentInBasket, &payment_methods),
            (BasketMutation::UpdateBillingAddressForBasket, &payment_methods),
            (BasketMutation::UpdateCustomerForBasket, &payment_methods),
            (BasketMutation::AddCouponToBasket, &taxes),
            (BasketMutation::RemoveGiftCertificateItemFromBasket, &taxes),
            (BasketMutation::UpdateItemsInBasket, &taxes),
            (BasketMutation::UpdateShipmentForBasket, &shipping_methods),
            (BasketMutation::UpdateShippingMethodForShipment, &shipping_methods),
            (BasketMutation::CreateShipmentForBasket, &shipments),
            (BasketMutation::RemoveShipmentFromBasket, &shipments),
        ];

        for (mutation, expected) in cases {
            let effects = mutation.cache_effects(None, &request, &basket());
            assert_eq!(effects.invalidate, vec![expected.clone()], "{mutation:?}");
            assert_eq!(effects.update.len(), 1, "{mutation:?}");
            assert!(effects.remove.is_empty(), "{mutation:?}");
        }
    }

    #[test]
    fn shipment_membership_change_reaches_every_shipment() {
        let effects =
            BasketMutation::CreateShipmentForBasket.cache_effects(None, &request(), &basket());
        let target = &effects.invalidate[0];

        for shipment in ["me", "gift"] {
            let key = BasketQuery::GetShippingMethodsForShipment
                .key(&params().with("shipmentId", shipment));
            assert!(target.matches(&key), "{shipment}");
        }
        assert!(!target.matches(&BasketQuery::GetBasket.key(&params())));
    }

    #[test]
    fn price_books_invalidate_basket_and_price_books() {
        let effects =
            BasketMutation::AddPriceBooksToBasket.cache_effects(None, &request(), &Value::Null);

        assert!(effects.update.is_empty());
        assert_eq!(
            effects.invalidate,
            vec![
                KeyMatch::Path(basket_path(&params())),
                KeyMatch::Path(BasketQuery::GetPriceBooksForBasket.path(&params())),
            ]
        );
    }

    #[test]
    fn creation_reads_identifier_despite_malformed_fields() {
        let response = json!({"basketId": "B9", "productItems": null, "customerInfo": 7});
        let effects = BasketMutation::CreateBasket.cache_effects(Some("C1"), &request(), &response);

        assert_eq!(effects.update.len(), 1);
        assert_eq!(
            effects.update[0].key,
            BasketQuery::GetBasket.key(&params().with("basketId", "B9"))
        );
    }

    #[test]
    fn shipment_address_invalidates_that_shipments_methods() {
        let params = params().with("shipmentId", "me");
        let request = RequestOptions::new(params.clone());
        let effects = BasketMutation::UpdateShippingAddressForShipment.cache_effects(
            None,
            &request,
            &basket(),
        );
        assert_eq!(
            effects.invalidate,
            vec![KeyMatch::Path(
                BasketQuery::GetShippingMethodsForShipment.path(&params)
            )]
        );
    }

    #[test]
    fn creation_seeds_basket_from_response_identifier() {
        let request = RequestOptions::new(params().with("basketId", "ignored"));
        let response = json!({"basketId": "B9"});
        let effects = BasketMutation::CreateBasket.cache_effects(Some("C1"), &request, &response);

        assert_eq!(
            effects.update[0].key,
            BasketQuery::GetBasket.key(&params().with("basketId", "B9"))
        );
        assert_eq!(
            effects.invalidate,
            vec![KeyMatch::Path(
                CustomerQuery::GetCustomerBaskets.path(&params().with("customerId", "C1"))
            )]
        );
    }

    #[test]
    fn creation_without_identifier_only_invalidates_aggregate() {
        let effects =
            BasketMutation::TransferBasket.cache_effects(Some("C1"), &request(), &json!({}));
        assert!(effects.update.is_empty());
        assert_eq!(effects.invalidate.len(), 1);

        let guest = BasketMutation::MergeBasket.cache_effects(None, &request(), &Value::Null);
        assert!(guest.is_empty());
    }

    #[test]
    fn void_response_invalidates_basket_and_secondary() {
        let effects =
            BasketMutation::AddTaxesForBasket.cache_effects(None, &request(), &Value::Null);

        assert!(effects.update.is_empty());
        assert_eq!(
            effects.invalidate,
            vec![
                KeyMatch::Path(basket_path(&params())),
                KeyMatch::Path(BasketQuery::GetTaxesFromBasket.path(&params())),
            ]
        );
    }

    #[test]
    fn delete_removes_subtree_and_invalidates_aggregate() {
        let effects = BasketMutation::DeleteBasket.cache_effects(Some("C1"), &request(), &Value::Null);

        assert_eq!(effects.remove, vec![KeyMatch::Prefix(basket_path(&params()))]);
        assert_eq!(effects.invalidate.len(), 1);
        assert!(effects.update.is_empty());
    }
}
