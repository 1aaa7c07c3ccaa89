//! Common test utilities for gst-invoicing-service integration tests.

use gst_invoicing_service::config::{
    DatabaseConfig, InvoicingConfig, IssuerProfile, NumberingConfig,
};
use gst_invoicing_service::models::{CustomerParty, LineItemInput};
use gst_invoicing_service::services::{
    init_metrics, InMemoryStore, InvoiceService, StaticPartyDirectory,
};
use rust_decimal::Decimal;
use service_core::config::Config as CommonConfig;
use std::sync::{Arc, Once};
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,gst_invoicing_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Issuer registered in Karnataka (state code 29).
pub fn test_config() -> InvoicingConfig {
    InvoicingConfig {
        common: CommonConfig {
            log_level: "debug".to_string(),
        },
        service_name: "gst-invoicing-service-test".to_string(),
        issuer: IssuerProfile {
            name: "Acme Supplies Pvt Ltd".to_string(),
            gstin: Some("29ABCDE1234F1Z5".to_string()),
            line1: Some("14 Residency Road".to_string()),
            line2: None,
            city: Some("Bengaluru".to_string()),
            state: Some("Karnataka".to_string()),
            postal_code: Some("560025".to_string()),
            country: Some("IN".to_string()),
        },
        numbering: NumberingConfig {
            prefix: "INV".to_string(),
        },
        database: DatabaseConfig {
            url: String::new(), // tests run on the in-memory store
            max_connections: 2,
            min_connections: 1,
        },
    }
}

/// Test application wrapper around the invoice engine with in-memory
/// storage and a seeded party directory.
#[allow(dead_code)]
pub struct TestApp {
    pub service: Arc<InvoiceService>,
    pub store: Arc<InMemoryStore>,
    /// Registered customer with a well-formed GSTIN.
    pub customer_id: Uuid,
    /// Customer without a GSTIN.
    pub unregistered_customer_id: Uuid,
    /// Customer whose directory GSTIN is malformed.
    pub bad_gstin_customer_id: Uuid,
}

/// Spawn a test application with the default issuer profile.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_config(test_config()).await
}

/// Spawn a test application with a custom configuration.
#[allow(dead_code)]
pub async fn spawn_app_with_config(config: InvoicingConfig) -> TestApp {
    init_tracing();
    init_metrics();

    let customer_id = Uuid::new_v4();
    let unregistered_customer_id = Uuid::new_v4();
    let bad_gstin_customer_id = Uuid::new_v4();

    let mut directory = StaticPartyDirectory::new();
    directory.insert(CustomerParty {
        customer_id,
        name: "Globex Traders".to_string(),
        contact: Some("accounts@globex.example".to_string()),
        gstin: Some("29AABCT1332L1ZT".to_string()),
        billing_line1: Some("5 MG Road".to_string()),
        billing_line2: None,
        billing_city: Some("Bengaluru".to_string()),
        billing_state: Some("Karnataka".to_string()),
        billing_postal_code: Some("560001".to_string()),
        billing_country: Some("IN".to_string()),
    });
    directory.insert(CustomerParty {
        customer_id: unregistered_customer_id,
        name: "Walk-in Buyer".to_string(),
        contact: None,
        gstin: None,
        billing_line1: None,
        billing_line2: None,
        billing_city: Some("Mysuru".to_string()),
        billing_state: Some("Karnataka".to_string()),
        billing_postal_code: None,
        billing_country: Some("IN".to_string()),
    });
    directory.insert(CustomerParty {
        customer_id: bad_gstin_customer_id,
        name: "Stale Records Ltd".to_string(),
        contact: None,
        gstin: Some("29ABCDE1234F1X5".to_string()),
        billing_line1: None,
        billing_line2: None,
        billing_city: None,
        billing_state: None,
        billing_postal_code: None,
        billing_country: None,
    });

    let store = Arc::new(InMemoryStore::new());
    let service = Arc::new(InvoiceService::new(
        &config,
        store.clone(),
        Arc::new(directory),
    ));

    TestApp {
        service,
        store,
        customer_id,
        unregistered_customer_id,
        bad_gstin_customer_id,
    }
}

/// Line item with the common 18% split: CGST 9 + SGST 9 intra-state, or
/// IGST 18 inter-state.
#[allow(dead_code)]
pub fn standard_item(description: &str, quantity: i64, unit_price: i64) -> LineItemInput {
    LineItemInput {
        description: description.to_string(),
        hsn_code: Some("998314".to_string()),
        quantity: Decimal::from(quantity),
        unit_price: Decimal::from(unit_price),
        discount: Decimal::ZERO,
        cgst_rate: Decimal::from(9),
        sgst_rate: Decimal::from(9),
        igst_rate: Decimal::from(18),
        cess_rate: Decimal::ZERO,
    }
}
