//! Acting customer identity.

use std::sync::RwLock;

use tracing::debug;

use crate::cache::lock::{rw_read, rw_write};

const SOURCE: &str = "identity";

/// Source of the acting customer's identifier.
///
/// `None` means a guest: customer-scoped aggregates are never touched.
pub trait IdentityProvider: Send + Sync {
    fn customer_id(&self) -> Option<String>;
}

/// Always a guest.
#[derive(Debug, Clone, Copy, Default)]
pub struct Guest;

impl IdentityProvider for Guest {
    fn customer_id(&self) -> Option<String> {
        None
    }
}

/// Identity that changes as a shopper logs in and out.
#[derive(Debug, Default)]
pub struct CustomerSession {
    customer_id: RwLock<Option<String>>,
}

impl CustomerSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registered(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: RwLock::new(Some(customer_id.into())),
        }
    }

    pub fn set(&self, customer_id: impl Into<String>) {
        let customer_id = customer_id.into();
        debug!(customer_id = %customer_id, "Customer session started");
        *rw_write(&self.customer_id, SOURCE, "set") = Some(customer_id);
    }

    pub fn clear(&self) {
        debug!("Customer session cleared");
        *rw_write(&self.customer_id, SOURCE, "clear") = None;
    }
}

impl IdentityProvider for CustomerSession {
    fn customer_id(&self) -> Option<String> {
        rw_read(&self.customer_id, SOURCE, "customer_id").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_has_no_customer() {
        assert_eq!(Guest.customer_id(), None);
    }

    #[test]
    fn session_tracks_login_and_logout() {
        let session = CustomerSession::new();
        assert_eq!(session.customer_id(), None);

        session.set("C1");
        assert_eq!(session.customer_id().as_deref(), Some("C1"));

        session.clear();
        assert_eq!(session.customer_id(), None);
        assert_eq!(
            CustomerSession::registered("C2").customer_id().as_deref(),
            Some("C2")
        );
    }
}
