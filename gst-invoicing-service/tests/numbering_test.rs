//! Invoice numbering integration tests for gst-invoicing-service.

mod common;

use async_trait::async_trait;
use common::{spawn_app, standard_item};
use futures::future::join_all;
use gst_invoicing_service::error::InvoiceError;
use gst_invoicing_service::models::{CreateInvoiceRequest, Invoice, InvoiceItem, PaymentStatus};
use gst_invoicing_service::services::numbering::MAX_GENERATION_ATTEMPTS;
use gst_invoicing_service::services::{InvoiceNumberGenerator, InvoiceService, InvoiceStore};
use std::collections::HashSet;
use uuid::Uuid;

/// Store where every candidate number is already taken.
struct SaturatedStore;

#[async_trait]
impl InvoiceStore for SaturatedStore {
    async fn insert_invoice(
        &self,
        _invoice: &Invoice,
        _items: &[InvoiceItem],
    ) -> Result<(), InvoiceError> {
        Ok(())
    }

    async fn get_invoice(
        &self,
        _invoice_id: Uuid,
    ) -> Result<Option<(Invoice, Vec<InvoiceItem>)>, InvoiceError> {
        Ok(None)
    }

    async fn list_for_customer(&self, _customer_id: Uuid) -> Result<Vec<Invoice>, InvoiceError> {
        Ok(vec![])
    }

    async fn update_payment_status(
        &self,
        _invoice_id: Uuid,
        _from: PaymentStatus,
        _to: PaymentStatus,
        _payment_reference: Option<&str>,
    ) -> Result<Option<Invoice>, InvoiceError> {
        Ok(None)
    }

    async fn invoice_number_exists(&self, _invoice_number: &str) -> Result<bool, InvoiceError> {
        Ok(true)
    }
}

/// Creation retried on storage conflicts: a losing race on the number
/// uniqueness backstop surfaces as a storage error and the whole creation
/// is safe to run again.
async fn create_with_retry(service: &InvoiceService, customer_id: Uuid) -> String {
    for _ in 0..3 {
        let request = CreateInvoiceRequest {
            customer_id,
            place_of_supply: "29".to_string(),
            reverse_charge: false,
            due_date: None,
            items: vec![standard_item("Bulk Line", 1, 100)],
            notes: None,
        };
        match service.create_invoice(request).await {
            Ok(created) => return created.invoice.invoice_number,
            Err(InvoiceError::StorageUnavailable(_)) => continue,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    panic!("invoice number collisions persisted across retries");
}

#[tokio::test]
async fn generated_numbers_have_the_documented_shape() {
    let app = spawn_app().await;

    let created = app
        .service
        .create_invoice(CreateInvoiceRequest {
            customer_id: app.customer_id,
            place_of_supply: "29".to_string(),
            reverse_charge: false,
            due_date: None,
            items: vec![standard_item("Consulting Services", 1, 100)],
            notes: None,
        })
        .await
        .expect("Failed to create invoice");

    let number = &created.invoice.invoice_number;
    let parts: Vec<&str> = number.split('-').collect();
    assert_eq!(parts.len(), 4, "unexpected number shape: {number}");
    assert_eq!(parts[0], "INV");
    assert_eq!(parts[1].len(), 8);
    assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
    assert_eq!(parts[2].len(), 9);
    assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    assert_eq!(parts[3].len(), 8);
    assert!(parts[3].chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn generation_stops_after_bounded_attempts() {
    let generator = InvoiceNumberGenerator::new("INV");

    let err = generator
        .generate(&SaturatedStore)
        .await
        .expect_err("A saturated store must exhaust generation");

    match err {
        InvoiceError::NumberGenerationExhausted { attempts } => {
            assert_eq!(attempts, MAX_GENERATION_ATTEMPTS);
            assert_eq!(attempts, 5);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn ten_thousand_concurrent_creations_yield_distinct_numbers() {
    let app = spawn_app().await;

    let mut handles = Vec::with_capacity(10_000);
    for _ in 0..10_000 {
        let service = app.service.clone();
        let customer_id = app.customer_id;
        handles.push(tokio::spawn(async move {
            create_with_retry(&service, customer_id).await
        }));
    }

    let mut numbers = HashSet::with_capacity(10_000);
    for result in join_all(handles).await {
        let number = result.expect("Creation task panicked");
        assert!(
            numbers.insert(number.clone()),
            "duplicate invoice number issued: {number}"
        );
    }
    assert_eq!(numbers.len(), 10_000);

    let listed = app
        .service
        .list_invoices_for_customer(app.customer_id)
        .await
        .expect("Failed to list invoices");
    assert_eq!(listed.len(), 10_000);
}
