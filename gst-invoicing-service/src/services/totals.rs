//! Invoice-level totals and the reconciliation cross-check.

use crate::error::InvoiceError;
use crate::models::InvoiceItem;
use rust_decimal::Decimal;

/// One minor unit (0.01). Largest difference tolerated between the grand
/// total and the recomputed component sum.
pub const RECONCILIATION_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Totals across all line items of one invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub cgst_total: Decimal,
    pub sgst_total: Decimal,
    pub igst_total: Decimal,
    pub cess_total: Decimal,
    pub grand_total: Decimal,
}

/// Sums line items into invoice totals and verifies they reconcile.
pub struct InvoiceAggregator;

impl InvoiceAggregator {
    /// Aggregate item amounts. The grand total is the sum of item totals;
    /// it must agree with subtotal plus component sums to within
    /// [`RECONCILIATION_TOLERANCE`], otherwise the invoice is rejected
    /// rather than silently adjusted.
    pub fn aggregate(items: &[InvoiceItem]) -> Result<InvoiceTotals, InvoiceError> {
        let mut subtotal = Decimal::ZERO;
        let mut cgst_total = Decimal::ZERO;
        let mut sgst_total = Decimal::ZERO;
        let mut igst_total = Decimal::ZERO;
        let mut cess_total = Decimal::ZERO;
        let mut grand_total = Decimal::ZERO;

        for item in items {
            subtotal += item.taxable_value;
            cgst_total += item.cgst_amount;
            sgst_total += item.sgst_amount;
            igst_total += item.igst_amount;
            cess_total += item.cess_amount;
            grand_total += item.total;
        }

        let component_sum = subtotal + cgst_total + sgst_total + igst_total + cess_total;
        if (grand_total - component_sum).abs() > RECONCILIATION_TOLERANCE {
            return Err(InvoiceError::Reconciliation {
                grand_total,
                component_sum,
            });
        }

        Ok(InvoiceTotals {
            subtotal,
            cgst_total,
            sgst_total,
            igst_total,
            cess_total,
            grand_total,
        })
    }
}
