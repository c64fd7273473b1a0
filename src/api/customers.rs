//! ShopperCustomers queries and their cache maintenance.
//!
//! Unlike the basket and order families, the customer identifier is an
//! ordinary request parameter here, so every key is built from the request.
//! Every key of this family is customer-scoped: without a customer identity
//! no effect is produced.

use serde_json::Value;
use storefront_api_types::ADDRESS_ID_FIELD;
use tracing::debug;

use super::{CacheUpdateMatrix, QueryDefinition, RequestOptions};
use crate::cache::{CacheEffectSet, CacheUpdate, KeyMatch, KeyPath, QueryKey};
use crate::params::{OperationSchema, Params};

const GET_CUSTOMER: OperationSchema = OperationSchema {
    name: "getCustomer",
    required: &["organizationId", "customerId", "siteId"],
    optional: &[],
};

const GET_CUSTOMER_ADDRESS: OperationSchema = OperationSchema {
    name: "getCustomerAddress",
    required: &["organizationId", "customerId", "addressName", "siteId"],
    optional: &[],
};

const GET_CUSTOMER_BASKETS: OperationSchema = OperationSchema {
    name: "getCustomerBaskets",
    required: &["organizationId", "customerId", "siteId"],
    optional: &[],
};

const GET_CUSTOMER_ORDERS: OperationSchema = OperationSchema {
    name: "getCustomerOrders",
    required: &["organizationId", "customerId", "siteId"],
    optional: &["crossSites", "from", "until", "status", "offset", "limit"],
};

const UPDATE_CUSTOMER: OperationSchema = OperationSchema {
    name: "updateCustomer",
    required: &["organizationId", "customerId", "siteId"],
    optional: &[],
};

const CREATE_CUSTOMER_ADDRESS: OperationSchema = OperationSchema {
    name: "createCustomerAddress",
    required: &["organizationId", "customerId", "siteId"],
    optional: &[],
};

const UPDATE_CUSTOMER_ADDRESS: OperationSchema = OperationSchema {
    name: "updateCustomerAddress",
    required: &["organizationId", "customerId", "addressName", "siteId"],
    optional: &[],
};

const REMOVE_CUSTOMER_ADDRESS: OperationSchema = OperationSchema {
    name: "removeCustomerAddress",
    required: &["organizationId", "customerId", "addressName", "siteId"],
    optional: &[],
};

const UPDATE_CUSTOMER_PASSWORD: OperationSchema = OperationSchema {
    name: "updateCustomerPassword",
    required: &["organizationId", "customerId", "siteId"],
    optional: &[],
};

const GET_RESET_PASSWORD_TOKEN: OperationSchema = OperationSchema {
    name: "getResetPasswordToken",
    required: &["organizationId", "siteId"],
    optional: &[],
};

/// `ROOT, "/organizations/", org, "/customers/", customerId`.
pub fn customer_path(params: &Params) -> KeyPath {
    KeyPath::organization(params)
        .literal("/customers/")
        .id(params.get_str("customerId"))
}

/// Copy of `params` scoped to `customer_id`.
pub(crate) fn for_customer(params: &Params, customer_id: &str) -> Params {
    params.clone().with("customerId", customer_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomerQuery {
    GetCustomer,
    GetCustomerAddress,
    GetCustomerBaskets,
    GetCustomerOrders,
}

impl CustomerQuery {
    pub const ALL: &'static [CustomerQuery] = &[
        CustomerQuery::GetCustomer,
        CustomerQuery::GetCustomerAddress,
        CustomerQuery::GetCustomerBaskets,
        CustomerQuery::GetCustomerOrders,
    ];
}

impl QueryDefinition for CustomerQuery {
    fn schema(&self) -> &'static OperationSchema {
        match self {
            CustomerQuery::GetCustomer => &GET_CUSTOMER,
            CustomerQuery::GetCustomerAddress => &GET_CUSTOMER_ADDRESS,
            CustomerQuery::GetCustomerBaskets => &GET_CUSTOMER_BASKETS,
            CustomerQuery::GetCustomerOrders => &GET_CUSTOMER_ORDERS,
        }
    }

    fn path(&self, params: &Params) -> KeyPath {
        let customer = customer_path(params);
        match self {
            CustomerQuery::GetCustomer => customer,
            CustomerQuery::GetCustomerAddress => customer
                .literal("/addresses/")
                .id(params.get_str("addressName")),
            CustomerQuery::GetCustomerBaskets => customer.literal("/baskets"),
            CustomerQuery::GetCustomerOrders => customer.literal("/orders"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomerMutation {
    UpdateCustomer,
    CreateCustomerAddress,
    UpdateCustomerAddress,
    RemoveCustomerAddress,
    UpdateCustomerPassword,
    GetResetPasswordToken,
}

impl CustomerMutation {
    pub const ALL: &'static [CustomerMutation] = &[
        CustomerMutation::UpdateCustomer,
        CustomerMutation::CreateCustomerAddress,
        CustomerMutation::UpdateCustomerAddress,
        CustomerMutation::RemoveCustomerAddress,
        CustomerMutation::UpdateCustomerPassword,
        CustomerMutation::GetResetPasswordToken,
    ];
}

impl CacheUpdateMatrix for CustomerMutation {
    fn schema(&self) -> &'static OperationSchema {
        match self {
            CustomerMutation::UpdateCustomer => &UPDATE_CUSTOMER,
            CustomerMutation::CreateCustomerAddress => &CREATE_CUSTOMER_ADDRESS,
            CustomerMutation::UpdateCustomerAddress => &UPDATE_CUSTOMER_ADDRESS,
            CustomerMutation::RemoveCustomerAddress => &REMOVE_CUSTOMER_ADDRESS,
            CustomerMutation::UpdateCustomerPassword => &UPDATE_CUSTOMER_PASSWORD,
            CustomerMutation::GetResetPasswordToken => &GET_RESET_PASSWORD_TOKEN,
        }
    }

    fn cache_effects(
        &self,
        customer_id: Option<&str>,
        request: &RequestOptions,
        response: &Value,
    ) -> CacheEffectSet {
        if customer_id.is_none() {
            debug!(mutation = self.name(), "No customer identity, customer keys left alone");
            return CacheEffectSet::empty();
        }
        let params = &request.parameters;
        let customer = KeyMatch::Path(customer_path(params));

        match self {
            CustomerMutation::UpdateCustomer => CacheEffectSet::empty().with_update(
                CacheUpdate::replace(CustomerQuery::GetCustomer.key(params), response.clone()),
            ),
            CustomerMutation::CreateCustomerAddress => {
                let effects = CacheEffectSet::empty().with_invalidate(customer);
                match address_id(response) {
                    Some(address_id) => {
                        let params = params.clone().with("addressName", address_id);
                        effects.with_update(CacheUpdate::replace(
                            CustomerQuery::GetCustomerAddress.key(&params),
                            response.clone(),
                        ))
                    }
                    None => {
                        debug!(
                            mutation = self.name(),
                            "Created address has no identifier, not seeding address key"
                        );
                        effects
                    }
                }
            }
            CustomerMutation::UpdateCustomerAddress => CacheEffectSet::empty()
                .with_update(CacheUpdate::replace(
                    CustomerQuery::GetCustomerAddress.key(params),
                    response.clone(),
                ))
                .with_invalidate(customer),
            CustomerMutation::RemoveCustomerAddress => CacheEffectSet::empty()
                .with_invalidate(customer)
                .with_remove(KeyMatch::Prefix(
                    CustomerQuery::GetCustomerAddress.path(params),
                )),
            CustomerMutation::UpdateCustomerPassword | CustomerMutation::GetResetPasswordToken => {
                debug!(mutation = self.name(), "Mutation has no cached counterpart");
                CacheEffectSet::empty()
            }
        }
    }
}

fn address_id(response: &Value) -> Option<&str> {
    response.get(ADDRESS_ID_FIELD).and_then(Value::as_str)
}

/// Key of the customer's basket list.
pub(crate) fn customer_baskets_key(params: &Params, customer_id: &str) -> QueryKey {
    CustomerQuery::GetCustomerBaskets.key(&for_customer(params, customer_id))
}

/// Every cached basket list of the customer, whatever its parameters.
pub(crate) fn customer_baskets(params: &Params, customer_id: &str) -> KeyMatch {
    KeyMatch::Path(CustomerQuery::GetCustomerBaskets.path(&for_customer(params, customer_id)))
}

/// Every cached order list of the customer, whatever its parameters.
pub(crate) fn customer_orders(params: &Params, customer_id: &str) -> KeyMatch {
    KeyMatch::Path(CustomerQuery::GetCustomerOrders.path(&for_customer(params, customer_id)))
}
