//! Error types for gst-invoicing-service.

use crate::models::PaymentStatus;
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// A single field-level problem found while validating a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every problem found in a request, collected in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Whether any issue was recorded against the given field.
    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for issue in &self.issues {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}", issue)?;
            first = false;
        }
        Ok(())
    }
}

/// Errors surfaced by the invoice engine.
#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("Validation failed: {0}")]
    ValidationFailed(ValidationReport),

    #[error("Line {line}: {reason}")]
    InvalidItem { line: usize, reason: String },

    #[error("Issuer profile has no valid GSTIN")]
    IssuerNotConfigured,

    #[error("Invoice totals do not reconcile: grand total {grand_total} vs component sum {component_sum}")]
    Reconciliation {
        grand_total: Decimal,
        component_sum: Decimal,
    },

    #[error("Invalid payment status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("Could not find an unused invoice number after {attempts} attempts")]
    NumberGenerationExhausted { attempts: u32 },

    #[error("Invoice not found")]
    NotFound,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(anyhow::Error),
}

impl InvoiceError {
    /// Stable label for error metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            InvoiceError::ValidationFailed(_) => "validation_failed",
            InvoiceError::InvalidItem { .. } => "invalid_item",
            InvoiceError::IssuerNotConfigured => "issuer_not_configured",
            InvoiceError::Reconciliation { .. } => "reconciliation",
            InvoiceError::InvalidStatusTransition { .. } => "invalid_status_transition",
            InvoiceError::NumberGenerationExhausted { .. } => "number_generation_exhausted",
            InvoiceError::NotFound => "not_found",
            InvoiceError::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}
