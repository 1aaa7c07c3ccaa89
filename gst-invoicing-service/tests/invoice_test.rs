//! Invoice creation and retrieval integration tests for gst-invoicing-service.

mod common;

use chrono::NaiveDate;
use common::{spawn_app, spawn_app_with_config, standard_item, test_config};
use futures::future::join_all;
use gst_invoicing_service::error::InvoiceError;
use gst_invoicing_service::models::{CreateInvoiceRequest, LineItemInput, PaymentStatus};
use gst_invoicing_service::services::get_metrics;
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::test]
async fn create_invoice_persists_and_round_trips() {
    let app = spawn_app().await;

    let created = app
        .service
        .create_invoice(CreateInvoiceRequest {
            customer_id: app.customer_id,
            place_of_supply: "29".to_string(),
            reverse_charge: false,
            due_date: NaiveDate::from_ymd_opt(2026, 9, 21),
            items: vec![
                standard_item("Consulting Services", 10, 50000),
                standard_item("Training Workshop", 5, 20000),
            ],
            notes: Some("Payment due within 30 days".to_string()),
        })
        .await
        .expect("Failed to create invoice");

    assert!(created.warnings.is_empty());
    assert_eq!(created.invoice.status(), PaymentStatus::Draft);
    assert_eq!(created.invoice.payment_reference, None);
    assert_eq!(created.invoice.issuer_gstin, "29ABCDE1234F1Z5");
    assert_eq!(created.invoice.issuer_name, "Acme Supplies Pvt Ltd");
    assert_eq!(created.invoice.customer_name, "Globex Traders");
    assert_eq!(
        created.invoice.customer_contact.as_deref(),
        Some("accounts@globex.example")
    );
    assert_eq!(
        created.invoice.customer_gstin.as_deref(),
        Some("29AABCT1332L1ZT")
    );

    let (fetched, items) = app
        .service
        .get_invoice(created.invoice.invoice_id)
        .await
        .expect("Failed to get invoice");

    assert_eq!(fetched.invoice_number, created.invoice.invoice_number);
    assert_eq!(fetched.due_date, NaiveDate::from_ymd_opt(2026, 9, 21));
    assert_eq!(fetched.grand_total, Decimal::from(708000));
    assert_eq!(fetched.notes.as_deref(), Some("Payment due within 30 days"));
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].line_no, 1);
    assert_eq!(items[1].line_no, 2);
    assert_eq!(items[0].description, "Consulting Services");
}

#[tokio::test]
async fn create_invoice_collects_every_issue_in_one_pass() {
    let app = spawn_app().await;

    let broken_item = LineItemInput {
        description: "   ".to_string(),
        hsn_code: Some("998314".to_string()),
        quantity: Decimal::ZERO,
        unit_price: Decimal::from(-1),
        discount: Decimal::from(-5),
        cgst_rate: Decimal::from(-9),
        sgst_rate: Decimal::from(9),
        igst_rate: Decimal::from(18),
        cess_rate: Decimal::ZERO,
    };
    let mut second_item = standard_item("Valid Description", 1, 100);
    second_item.sgst_rate = Decimal::from(-2);

    let err = app
        .service
        .create_invoice(CreateInvoiceRequest {
            customer_id: app.customer_id,
            place_of_supply: "KA".to_string(),
            reverse_charge: false,
            due_date: None,
            items: vec![broken_item, second_item],
            notes: None,
        })
        .await
        .expect_err("Invalid request must be rejected");

    let report = match err {
        InvoiceError::ValidationFailed(report) => report,
        other => panic!("unexpected error: {other:?}"),
    };

    assert_eq!(report.len(), 7);
    assert!(report.has_field("place_of_supply"));
    assert!(report.has_field("items[0].description"));
    assert!(report.has_field("items[0].quantity"));
    assert!(report.has_field("items[0].unit_price"));
    assert!(report.has_field("items[0].discount"));
    assert!(report.has_field("items[0].cgst_rate"));
    assert!(report.has_field("items[1].sgst_rate"));
}

#[tokio::test]
async fn create_invoice_without_items_fails() {
    let app = spawn_app().await;

    let err = app
        .service
        .create_invoice(CreateInvoiceRequest {
            customer_id: app.customer_id,
            place_of_supply: "29".to_string(),
            reverse_charge: false,
            due_date: None,
            items: vec![],
            notes: None,
        })
        .await
        .expect_err("Empty invoice must be rejected");

    match err {
        InvoiceError::ValidationFailed(report) => {
            assert!(report.has_field("items"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn discount_exceeding_line_value_is_rejected_up_front() {
    let app = spawn_app().await;

    let mut item = standard_item("Over-discounted", 1, 100);
    item.discount = Decimal::from(150);

    let err = app
        .service
        .create_invoice(CreateInvoiceRequest {
            customer_id: app.customer_id,
            place_of_supply: "29".to_string(),
            reverse_charge: false,
            due_date: None,
            items: vec![item],
            notes: None,
        })
        .await
        .expect_err("Discount beyond the line value must be rejected");

    match err {
        InvoiceError::ValidationFailed(report) => {
            assert!(report.has_field("items[0].discount"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn create_invoice_for_unknown_customer_fails() {
    let app = spawn_app().await;

    let err = app
        .service
        .create_invoice(CreateInvoiceRequest {
            customer_id: Uuid::new_v4(),
            place_of_supply: "29".to_string(),
            reverse_charge: false,
            due_date: None,
            items: vec![standard_item("Consulting Services", 1, 100)],
            notes: None,
        })
        .await
        .expect_err("Unknown customer must be rejected");

    assert!(matches!(err, InvoiceError::NotFound));
}

#[tokio::test]
async fn malformed_customer_gstin_is_rejected() {
    let app = spawn_app().await;

    let err = app
        .service
        .create_invoice(CreateInvoiceRequest {
            customer_id: app.bad_gstin_customer_id,
            place_of_supply: "29".to_string(),
            reverse_charge: false,
            due_date: None,
            items: vec![standard_item("Consulting Services", 1, 100)],
            notes: None,
        })
        .await
        .expect_err("Malformed customer GSTIN must be rejected");

    match err {
        InvoiceError::ValidationFailed(report) => {
            assert!(report.has_field("customer_gstin"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unregistered_customer_is_accepted() {
    let app = spawn_app().await;

    let created = app
        .service
        .create_invoice(CreateInvoiceRequest {
            customer_id: app.unregistered_customer_id,
            place_of_supply: "29".to_string(),
            reverse_charge: false,
            due_date: None,
            items: vec![standard_item("Retail Sale", 1, 500)],
            notes: None,
        })
        .await
        .expect("Unregistered customers may still be invoiced");

    assert_eq!(created.invoice.customer_gstin, None);
}

#[tokio::test]
async fn short_classification_codes_warn_without_blocking() {
    let app = spawn_app().await;

    let mut missing_code = standard_item("No Code", 1, 100);
    missing_code.hsn_code = None;
    let mut short_code = standard_item("Short Code", 1, 200);
    short_code.hsn_code = Some("99".to_string());

    let created = app
        .service
        .create_invoice(CreateInvoiceRequest {
            customer_id: app.customer_id,
            place_of_supply: "29".to_string(),
            reverse_charge: false,
            due_date: None,
            items: vec![missing_code, short_code],
            notes: None,
        })
        .await
        .expect("Advisory warnings must not block creation");

    assert_eq!(created.warnings.len(), 2);
    assert_eq!(created.warnings[0].field, "items[0].hsn_code");
    assert_eq!(created.warnings[1].field, "items[1].hsn_code");

    // The invoice itself is stored normally.
    let (fetched, _) = app
        .service
        .get_invoice(created.invoice.invoice_id)
        .await
        .expect("Failed to get invoice");
    assert_eq!(fetched.invoice_number, created.invoice.invoice_number);
}

#[tokio::test]
async fn create_invoice_without_issuer_gstin_fails() {
    let mut config = test_config();
    config.issuer.gstin = None;
    let app = spawn_app_with_config(config).await;

    let err = app
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
        .expect_err("Missing issuer registration must block creation");

    assert!(matches!(err, InvoiceError::IssuerNotConfigured));
}

#[tokio::test]
async fn create_invoice_with_malformed_issuer_gstin_fails() {
    let mut config = test_config();
    config.issuer.gstin = Some("29ABCDE1234F1X5".to_string());
    let app = spawn_app_with_config(config).await;

    let err = app
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
        .expect_err("Malformed issuer registration must block creation");

    assert!(matches!(err, InvoiceError::IssuerNotConfigured));
}

#[tokio::test]
async fn list_invoices_returns_newest_first() {
    let app = spawn_app().await;

    let mut numbers = Vec::new();
    for n in 1..=3 {
        let created = app
            .service
            .create_invoice(CreateInvoiceRequest {
                customer_id: app.customer_id,
                place_of_supply: "29".to_string(),
                reverse_charge: false,
                due_date: None,
                items: vec![standard_item("Consulting Services", n, 100)],
                notes: None,
            })
            .await
            .expect("Failed to create invoice");
        numbers.push(created.invoice.invoice_number);
    }

    let listed = app
        .service
        .list_invoices_for_customer(app.customer_id)
        .await
        .expect("Failed to list invoices");

    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].invoice_number, numbers[2]);
    assert_eq!(listed[1].invoice_number, numbers[1]);
    assert_eq!(listed[2].invoice_number, numbers[0]);
}

#[tokio::test]
async fn list_invoices_for_unknown_customer_is_empty() {
    let app = spawn_app().await;

    let listed = app
        .service
        .list_invoices_for_customer(Uuid::new_v4())
        .await
        .expect("Listing must not fail for unknown customers");

    assert!(listed.is_empty());
}

#[tokio::test]
async fn get_missing_invoice_fails() {
    let app = spawn_app().await;

    let err = app
        .service
        .get_invoice(Uuid::new_v4())
        .await
        .expect_err("Missing invoice must not be found");

    assert!(matches!(err, InvoiceError::NotFound));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_readers_always_see_complete_invoices() {
    let app = spawn_app().await;

    let writers: Vec<_> = (0..20)
        .map(|n| {
            let service = app.service.clone();
            let customer_id = app.customer_id;
            tokio::spawn(async move {
                service
                    .create_invoice(CreateInvoiceRequest {
                        customer_id,
                        place_of_supply: "29".to_string(),
                        reverse_charge: false,
                        due_date: None,
                        items: vec![
                            standard_item("Consulting Services", n + 1, 1000),
                            standard_item("Training Workshop", 1, 500),
                        ],
                        notes: None,
                    })
                    .await
                    .expect("Failed to create invoice")
            })
        })
        .collect();

    // Readers racing the writers must only ever observe whole invoices:
    // anything listed is fetchable with its full two-line item set.
    let readers: Vec<_> = (0..8)
        .map(|_| {
            let service = app.service.clone();
            let customer_id = app.customer_id;
            tokio::spawn(async move {
                for _ in 0..25 {
                    let listed = service
                        .list_invoices_for_customer(customer_id)
                        .await
                        .expect("Failed to list invoices");
                    for invoice in listed {
                        let (_, items) = service
                            .get_invoice(invoice.invoice_id)
                            .await
                            .expect("Listed invoices must always be readable");
                        assert_eq!(items.len(), 2);
                    }
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for writer in join_all(writers).await {
        writer.expect("writer task panicked");
    }
    for reader in join_all(readers).await {
        reader.expect("reader task panicked");
    }

    let listed = app
        .service
        .list_invoices_for_customer(app.customer_id)
        .await
        .expect("Failed to list invoices");
    assert_eq!(listed.len(), 20);
}

#[tokio::test]
async fn metrics_expose_invoice_counters() {
    let app = spawn_app().await;

    app.service
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

    let metrics = get_metrics();
    assert!(metrics.contains("gst_invoicing_invoices_total"));
    assert!(metrics.contains("gst_invoicing_invoice_amount_total"));
}
