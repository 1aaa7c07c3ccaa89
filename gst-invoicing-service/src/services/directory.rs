//! Customer party directory seam.

use crate::error::InvoiceError;
use crate::models::CustomerParty;
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

/// Read-only access to customer master data.
#[async_trait]
pub trait PartyDirectory: Send + Sync {
    /// Look up a customer by ID.
    async fn customer(&self, customer_id: Uuid) -> Result<Option<CustomerParty>, InvoiceError>;
}

/// Fixed in-memory directory for tests and embedders with a known customer set.
#[derive(Debug, Clone, Default)]
pub struct StaticPartyDirectory {
    customers: HashMap<Uuid, CustomerParty>,
}

impl StaticPartyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, customer: CustomerParty) {
        self.customers.insert(customer.customer_id, customer);
    }
}

#[async_trait]
impl PartyDirectory for StaticPartyDirectory {
    async fn customer(&self, customer_id: Uuid) -> Result<Option<CustomerParty>, InvoiceError> {
        Ok(self.customers.get(&customer_id).cloned())
    }
}
