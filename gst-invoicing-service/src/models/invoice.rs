//! Invoice model for gst-invoicing-service.

use super::line_item::{InvoiceItem, LineItemInput};
use crate::error::ValidationIssue;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Payment lifecycle status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Draft,
    Pending,
    Paid,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Draft => "draft",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "pending" => PaymentStatus::Pending,
            "paid" => PaymentStatus::Paid,
            "cancelled" => PaymentStatus::Cancelled,
            _ => PaymentStatus::Draft,
        }
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (*self, next),
            (PaymentStatus::Draft, PaymentStatus::Pending)
                | (PaymentStatus::Draft, PaymentStatus::Cancelled)
                | (PaymentStatus::Pending, PaymentStatus::Paid)
                | (PaymentStatus::Pending, PaymentStatus::Cancelled)
        )
    }

    /// Terminal states admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Cancelled)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tax invoice document. Party details and amounts are snapshots taken at
/// creation time; only the payment status fields change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_contact: Option<String>,
    pub customer_gstin: Option<String>,
    pub billing_line1: Option<String>,
    pub billing_line2: Option<String>,
    pub billing_city: Option<String>,
    pub billing_state: Option<String>,
    pub billing_postal_code: Option<String>,
    pub billing_country: Option<String>,
    pub issuer_name: String,
    pub issuer_gstin: String,
    pub issuer_line1: Option<String>,
    pub issuer_line2: Option<String>,
    pub issuer_city: Option<String>,
    pub issuer_state: Option<String>,
    pub issuer_postal_code: Option<String>,
    pub issuer_country: Option<String>,
    pub place_of_supply: String,
    pub reverse_charge: bool,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub payment_status: String,
    pub payment_reference: Option<String>,
    pub subtotal: Decimal,
    pub cgst_total: Decimal,
    pub sgst_total: Decimal,
    pub igst_total: Decimal,
    pub cess_total: Decimal,
    pub grand_total: Decimal,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Invoice {
    pub fn status(&self) -> PaymentStatus {
        PaymentStatus::from_string(&self.payment_status)
    }
}

/// Input for creating an invoice. The invoice date is always the creation
/// date; the due date is whatever payment terms the caller applies.
#[derive(Debug, Clone)]
pub struct CreateInvoiceRequest {
    pub customer_id: Uuid,
    pub place_of_supply: String,
    pub reverse_charge: bool,
    pub due_date: Option<NaiveDate>,
    pub items: Vec<LineItemInput>,
    pub notes: Option<String>,
}

/// Result of a successful invoice creation. Advisory warnings (for example a
/// short classification code) never block creation and ride along here.
#[derive(Debug, Clone)]
pub struct CreatedInvoice {
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
    pub warnings: Vec<ValidationIssue>,
}
