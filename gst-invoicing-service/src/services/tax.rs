//! Line-item tax computation with the intra/inter-state component split.

use crate::error::InvoiceError;
use crate::models::LineItemInput;
use rust_decimal::{Decimal, RoundingStrategy};

/// Stored amounts carry two decimal places (paise).
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Round a monetary amount half-up to the minor unit.
pub fn round_half_up(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Supply jurisdiction relative to the issuer's registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplyType {
    IntraState,
    InterState,
}

impl SupplyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupplyType::IntraState => "intra_state",
            SupplyType::InterState => "inter_state",
        }
    }

    /// Intra-state when the place of supply matches the issuer's state code.
    pub fn from_place_of_supply(place_of_supply: &str, issuer_state_code: &str) -> Self {
        if place_of_supply == issuer_state_code {
            SupplyType::IntraState
        } else {
            SupplyType::InterState
        }
    }
}

/// Amounts computed for one line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedLine {
    pub taxable_value: Decimal,
    pub cgst_amount: Decimal,
    pub sgst_amount: Decimal,
    pub igst_amount: Decimal,
    pub cess_amount: Decimal,
    pub total: Decimal,
}

/// Per-item tax math. CGST and SGST apply on intra-state supplies, IGST on
/// inter-state supplies; the inapplicable side is recorded as zero. Cess
/// applies regardless of jurisdiction.
pub struct TaxCalculator;

impl TaxCalculator {
    /// Compute the taxable value and component amounts for one line.
    /// `line_no` is the 1-based position used in error reporting.
    pub fn compute(
        line_no: usize,
        input: &LineItemInput,
        supply: SupplyType,
    ) -> Result<ComputedLine, InvoiceError> {
        let raw_taxable = input.quantity * input.unit_price - input.discount;
        if raw_taxable < Decimal::ZERO {
            return Err(InvoiceError::InvalidItem {
                line: line_no,
                reason: format!("taxable value {} is negative", raw_taxable),
            });
        }
        let taxable_value = round_half_up(raw_taxable);

        let component = |rate: Decimal| round_half_up(taxable_value * rate / Decimal::ONE_HUNDRED);

        let (cgst_amount, sgst_amount, igst_amount) = match supply {
            SupplyType::IntraState => (
                component(input.cgst_rate),
                component(input.sgst_rate),
                Decimal::ZERO,
            ),
            SupplyType::InterState => {
                (Decimal::ZERO, Decimal::ZERO, component(input.igst_rate))
            }
        };
        let cess_amount = component(input.cess_rate);

        let total = taxable_value + cgst_amount + sgst_amount + igst_amount + cess_amount;

        Ok(ComputedLine {
            taxable_value,
            cgst_amount,
            sgst_amount,
            igst_amount,
            cess_amount,
            total,
        })
    }
}
