//! Storage seam for invoices.

use crate::error::InvoiceError;
use crate::models::{Invoice, InvoiceItem, PaymentStatus};
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence contract for invoices and their line items.
///
/// An invoice and its items are written atomically: a reader never observes
/// one without the other. After creation only the payment status fields may
/// change, so implementations expose no general update.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Persist a new invoice together with all of its line items.
    async fn insert_invoice(
        &self,
        invoice: &Invoice,
        items: &[InvoiceItem],
    ) -> Result<(), InvoiceError>;

    /// Fetch an invoice and its line items, ordered by line number.
    async fn get_invoice(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<(Invoice, Vec<InvoiceItem>)>, InvoiceError>;

    /// List invoices for a customer, newest first.
    async fn list_for_customer(&self, customer_id: Uuid) -> Result<Vec<Invoice>, InvoiceError>;

    /// Set the payment status fields, guarded by the status the caller
    /// validated against: the write lands only while the stored status still
    /// equals `from`. Returns the updated invoice, or `None` when no row
    /// matched (the invoice is missing or the status changed concurrently).
    async fn update_payment_status(
        &self,
        invoice_id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
        payment_reference: Option<&str>,
    ) -> Result<Option<Invoice>, InvoiceError>;

    /// Whether an invoice number is already taken.
    async fn invoice_number_exists(&self, invoice_number: &str) -> Result<bool, InvoiceError>;
}
