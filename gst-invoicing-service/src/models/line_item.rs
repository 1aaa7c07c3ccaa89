//! Line item model for gst-invoicing-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Line item on a tax invoice. Rates are stored as supplied; amounts hold
/// what was actually charged after the jurisdiction split.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceItem {
    pub line_item_id: Uuid,
    pub invoice_id: Uuid,
    pub line_no: i32,
    pub description: String,
    pub hsn_code: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub taxable_value: Decimal,
    pub cgst_rate: Decimal,
    pub sgst_rate: Decimal,
    pub igst_rate: Decimal,
    pub cess_rate: Decimal,
    pub cgst_amount: Decimal,
    pub sgst_amount: Decimal,
    pub igst_amount: Decimal,
    pub cess_amount: Decimal,
    pub total: Decimal,
    pub created_utc: DateTime<Utc>,
}

/// Input for one line item on a new invoice. Rates are percentages.
#[derive(Debug, Clone)]
pub struct LineItemInput {
    pub description: String,
    pub hsn_code: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub cgst_rate: Decimal,
    pub sgst_rate: Decimal,
    pub igst_rate: Decimal,
    pub cess_rate: Decimal,
}
