//! In-memory invoice store.

use crate::error::InvoiceError;
use crate::models::{Invoice, InvoiceItem, PaymentStatus};
use crate::services::store::InvoiceStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use tokio::sync::RwLock;
use uuid::Uuid;

struct StoredInvoice {
    invoice: Invoice,
    items: Vec<InvoiceItem>,
}

#[derive(Default)]
struct StoreInner {
    invoices: Vec<StoredInvoice>,
    numbers: HashSet<String>,
}

/// `InvoiceStore` backed by process memory, for tests and ephemeral runs.
///
/// Invoices are held in insertion order; listing walks that order backwards
/// so newest-first holds even when creation timestamps collide. The number
/// uniqueness rule the database enforces with an index is enforced here on
/// insert.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceStore for InMemoryStore {
    async fn insert_invoice(
        &self,
        invoice: &Invoice,
        items: &[InvoiceItem],
    ) -> Result<(), InvoiceError> {
        let mut inner = self.inner.write().await;
        if !inner.numbers.insert(invoice.invoice_number.clone()) {
            return Err(InvoiceError::StorageUnavailable(anyhow::anyhow!(
                "Invoice number {} already exists",
                invoice.invoice_number
            )));
        }
        inner.invoices.push(StoredInvoice {
            invoice: invoice.clone(),
            items: items.to_vec(),
        });
        Ok(())
    }

    async fn get_invoice(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<(Invoice, Vec<InvoiceItem>)>, InvoiceError> {
        let inner = self.inner.read().await;
        Ok(inner
            .invoices
            .iter()
            .find(|s| s.invoice.invoice_id == invoice_id)
            .map(|s| (s.invoice.clone(), s.items.clone())))
    }

    async fn list_for_customer(&self, customer_id: Uuid) -> Result<Vec<Invoice>, InvoiceError> {
        let inner = self.inner.read().await;
        Ok(inner
            .invoices
            .iter()
            .rev()
            .filter(|s| s.invoice.customer_id == customer_id)
            .map(|s| s.invoice.clone())
            .collect())
    }

    async fn update_payment_status(
        &self,
        invoice_id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
        payment_reference: Option<&str>,
    ) -> Result<Option<Invoice>, InvoiceError> {
        let mut inner = self.inner.write().await;
        // Same guard as the database's conditional UPDATE: no write unless
        // the stored status still matches.
        match inner
            .invoices
            .iter_mut()
            .find(|s| s.invoice.invoice_id == invoice_id && s.invoice.payment_status == from.as_str())
        {
            Some(stored) => {
                stored.invoice.payment_status = to.as_str().to_string();
                stored.invoice.payment_reference = payment_reference.map(str::to_string);
                stored.invoice.updated_utc = Utc::now();
                Ok(Some(stored.invoice.clone()))
            }
            None => Ok(None),
        }
    }

    async fn invoice_number_exists(&self, invoice_number: &str) -> Result<bool, InvoiceError> {
        let inner = self.inner.read().await;
        Ok(inner.numbers.contains(invoice_number))
    }
}
