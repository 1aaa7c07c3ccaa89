//! Customer party model for gst-invoicing-service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer master data as held by the party directory. Copied onto the
/// invoice at creation so later directory edits never change past documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerParty {
    pub customer_id: Uuid,
    pub name: String,
    pub contact: Option<String>,
    pub gstin: Option<String>,
    pub billing_line1: Option<String>,
    pub billing_line2: Option<String>,
    pub billing_city: Option<String>,
    pub billing_state: Option<String>,
    pub billing_postal_code: Option<String>,
    pub billing_country: Option<String>,
}
