//! Invoice orchestration: creation, retrieval, payment lifecycle and
//! document rendering.

use crate::config::{InvoicingConfig, IssuerProfile};
use crate::error::{InvoiceError, ValidationReport};
use crate::models::{CreateInvoiceRequest, CreatedInvoice, Invoice, InvoiceItem, PaymentStatus};
use crate::services::directory::PartyDirectory;
use crate::services::metrics::{ERRORS_TOTAL, INVOICES_TOTAL, INVOICE_AMOUNT_TOTAL};
use crate::services::numbering::InvoiceNumberGenerator;
use crate::services::render::render_invoice_html;
use crate::services::store::InvoiceStore;
use crate::services::tax::{SupplyType, TaxCalculator};
use crate::services::totals::InvoiceAggregator;
use crate::services::validation::IdentifierValidator;
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, instrument, warn, Span};
use uuid::Uuid;

/// Coordinates validation, tax computation, numbering and persistence for
/// tax invoices. The issuer profile is fixed at construction; customers come
/// from the party directory and documents go to the invoice store.
pub struct InvoiceService {
    issuer: IssuerProfile,
    store: Arc<dyn InvoiceStore>,
    directory: Arc<dyn PartyDirectory>,
    numbers: InvoiceNumberGenerator,
}

impl InvoiceService {
    pub fn new(
        config: &InvoicingConfig,
        store: Arc<dyn InvoiceStore>,
        directory: Arc<dyn PartyDirectory>,
    ) -> Self {
        Self {
            issuer: config.issuer.clone(),
            store,
            directory,
            numbers: InvoiceNumberGenerator::new(config.numbering.prefix.clone()),
        }
    }

    fn record_error(err: InvoiceError) -> InvoiceError {
        ERRORS_TOTAL.with_label_values(&[err.error_type()]).inc();
        err
    }

    /// State code from the issuer GSTIN. No invoice can be created while the
    /// issuer registration is missing or malformed.
    fn issuer_state(&self) -> Result<&str, InvoiceError> {
        let state = self.issuer.gstin.as_deref().and_then(|gstin| {
            IdentifierValidator::validate_gstin(gstin).ok()?;
            self.issuer.state_code()
        });
        state.ok_or_else(|| {
            error!("Issuer GSTIN is missing or malformed");
            Self::record_error(InvoiceError::IssuerNotConfigured)
        })
    }

    /// Create a draft invoice. Every problem with the request is collected
    /// into one validation report instead of failing on the first. Advisory
    /// classification-code warnings never block creation and are returned
    /// alongside the stored invoice.
    #[instrument(
        skip(self, request),
        fields(
            service = "gst-invoicing-service",
            method = "CreateInvoice",
            customer_id = %request.customer_id,
            invoice_id
        )
    )]
    pub async fn create_invoice(
        &self,
        request: CreateInvoiceRequest,
    ) -> Result<CreatedInvoice, InvoiceError> {
        let issuer_state = self.issuer_state()?;

        let customer = self
            .directory
            .customer(request.customer_id)
            .await
            .map_err(Self::record_error)?
            .ok_or_else(|| {
                warn!(customer_id = %request.customer_id, "Customer not found in party directory");
                Self::record_error(InvoiceError::NotFound)
            })?;

        let mut report = ValidationReport::default();
        let mut warnings = Vec::new();

        if !IdentifierValidator::is_valid_state_code(&request.place_of_supply) {
            report.push("place_of_supply", "must be a two-digit state code");
        }

        if let Some(gstin) = customer.gstin.as_deref().filter(|g| !g.is_empty()) {
            if let Err(e) = IdentifierValidator::validate_gstin(gstin) {
                report.push("customer_gstin", e.to_string());
            }
        }

        if request.items.is_empty() {
            report.push("items", "at least one line item is required");
        }

        for (idx, item) in request.items.iter().enumerate() {
            if item.description.trim().is_empty() {
                report.push(format!("items[{}].description", idx), "must not be empty");
            }
            if item.quantity <= Decimal::ZERO {
                report.push(format!("items[{}].quantity", idx), "must be positive");
            }
            if item.unit_price < Decimal::ZERO {
                report.push(format!("items[{}].unit_price", idx), "must not be negative");
            }
            if item.discount < Decimal::ZERO {
                report.push(format!("items[{}].discount", idx), "must not be negative");
            } else if item.discount > item.quantity * item.unit_price {
                report.push(format!("items[{}].discount", idx), "exceeds the line value");
            }
            for (rate_field, rate) in [
                ("cgst_rate", item.cgst_rate),
                ("sgst_rate", item.sgst_rate),
                ("igst_rate", item.igst_rate),
                ("cess_rate", item.cess_rate),
            ] {
                if rate < Decimal::ZERO {
                    report.push(
                        format!("items[{}].{}", idx, rate_field),
                        "must not be negative",
                    );
                }
            }
            if let Some(warning) =
                IdentifierValidator::hsn_warning(idx + 1, item.hsn_code.as_deref())
            {
                warnings.push(warning);
            }
        }

        if !report.is_empty() {
            warn!(
                customer_id = %request.customer_id,
                issues = report.len(),
                "Invoice request failed validation"
            );
            return Err(Self::record_error(InvoiceError::ValidationFailed(report)));
        }

        let supply = SupplyType::from_place_of_supply(&request.place_of_supply, issuer_state);

        let invoice_id = Uuid::new_v4();
        Span::current().record("invoice_id", invoice_id.to_string());
        let now = Utc::now();

        let mut items = Vec::with_capacity(request.items.len());
        for (idx, input) in request.items.iter().enumerate() {
            let line_no = idx + 1;
            let computed =
                TaxCalculator::compute(line_no, input, supply).map_err(Self::record_error)?;
            items.push(InvoiceItem {
                line_item_id: Uuid::new_v4(),
                invoice_id,
                line_no: line_no as i32,
                description: input.description.clone(),
                hsn_code: input.hsn_code.clone(),
                quantity: input.quantity,
                unit_price: input.unit_price,
                discount: input.discount,
                taxable_value: computed.taxable_value,
                cgst_rate: input.cgst_rate,
                sgst_rate: input.sgst_rate,
                igst_rate: input.igst_rate,
                cess_rate: input.cess_rate,
                cgst_amount: computed.cgst_amount,
                sgst_amount: computed.sgst_amount,
                igst_amount: computed.igst_amount,
                cess_amount: computed.cess_amount,
                total: computed.total,
                created_utc: now,
            });
        }

        let totals = InvoiceAggregator::aggregate(&items).map_err(|e| {
            error!(invoice_id = %invoice_id, error = %e, "Invoice totals failed reconciliation");
            Self::record_error(e)
        })?;

        let invoice_number = self
            .numbers
            .generate(self.store.as_ref())
            .await
            .map_err(Self::record_error)?;

        let invoice = Invoice {
            invoice_id,
            invoice_number,
            customer_id: customer.customer_id,
            customer_name: customer.name,
            customer_contact: customer.contact,
            customer_gstin: customer.gstin,
            billing_line1: customer.billing_line1,
            billing_line2: customer.billing_line2,
            billing_city: customer.billing_city,
            billing_state: customer.billing_state,
            billing_postal_code: customer.billing_postal_code,
            billing_country: customer.billing_country,
            issuer_name: self.issuer.name.clone(),
            issuer_gstin: self.issuer.gstin.clone().unwrap_or_default(),
            issuer_line1: self.issuer.line1.clone(),
            issuer_line2: self.issuer.line2.clone(),
            issuer_city: self.issuer.city.clone(),
            issuer_state: self.issuer.state.clone(),
            issuer_postal_code: self.issuer.postal_code.clone(),
            issuer_country: self.issuer.country.clone(),
            place_of_supply: request.place_of_supply.clone(),
            reverse_charge: request.reverse_charge,
            invoice_date: now.date_naive(),
            due_date: request.due_date,
            payment_status: PaymentStatus::Draft.as_str().to_string(),
            payment_reference: None,
            subtotal: totals.subtotal,
            cgst_total: totals.cgst_total,
            sgst_total: totals.sgst_total,
            igst_total: totals.igst_total,
            cess_total: totals.cess_total,
            grand_total: totals.grand_total,
            notes: request.notes,
            created_utc: now,
            updated_utc: now,
        };

        self.store
            .insert_invoice(&invoice, &items)
            .await
            .map_err(|e| {
                warn!(invoice_id = %invoice_id, error = %e, "Failed to persist invoice");
                Self::record_error(e)
            })?;

        INVOICES_TOTAL.with_label_values(&["draft"]).inc();
        INVOICE_AMOUNT_TOTAL
            .with_label_values(&[supply.as_str()])
            .inc_by(invoice.grand_total.to_f64().unwrap_or(0.0));

        info!(
            customer_id = %invoice.customer_id,
            invoice_id = %invoice_id,
            invoice_number = %invoice.invoice_number,
            grand_total = %invoice.grand_total,
            warnings = warnings.len(),
            "Draft invoice created"
        );

        Ok(CreatedInvoice {
            invoice,
            items,
            warnings,
        })
    }

    /// Fetch an invoice together with its line items.
    #[instrument(
        skip(self),
        fields(service = "gst-invoicing-service", method = "GetInvoice")
    )]
    pub async fn get_invoice(
        &self,
        invoice_id: Uuid,
    ) -> Result<(Invoice, Vec<InvoiceItem>), InvoiceError> {
        match self
            .store
            .get_invoice(invoice_id)
            .await
            .map_err(Self::record_error)?
        {
            Some(found) => Ok(found),
            None => Err(Self::record_error(InvoiceError::NotFound)),
        }
    }

    /// All invoices for a customer, newest first. An unknown customer yields
    /// an empty list rather than an error.
    #[instrument(
        skip(self),
        fields(service = "gst-invoicing-service", method = "ListInvoicesForCustomer")
    )]
    pub async fn list_invoices_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<Invoice>, InvoiceError> {
        self.store
            .list_for_customer(customer_id)
            .await
            .map_err(Self::record_error)
    }

    /// Move an invoice through its payment lifecycle. Terminal statuses are
    /// immutable, and marking an invoice paid requires a payment reference.
    #[instrument(
        skip(self, payment_reference),
        fields(service = "gst-invoicing-service", method = "UpdatePaymentStatus")
    )]
    pub async fn update_payment_status(
        &self,
        invoice_id: Uuid,
        new_status: PaymentStatus,
        payment_reference: Option<String>,
    ) -> Result<Invoice, InvoiceError> {
        let current = match self
            .store
            .get_invoice(invoice_id)
            .await
            .map_err(Self::record_error)?
        {
            Some((invoice, _)) => invoice.status(),
            None => return Err(Self::record_error(InvoiceError::NotFound)),
        };

        if !current.can_transition_to(new_status) {
            warn!(
                invoice_id = %invoice_id,
                from = %current,
                to = %new_status,
                terminal = current.is_terminal(),
                "Rejected payment status transition"
            );
            return Err(Self::record_error(InvoiceError::InvalidStatusTransition {
                from: current,
                to: new_status,
            }));
        }

        if new_status == PaymentStatus::Paid {
            let has_reference = payment_reference
                .as_deref()
                .map(|r| !r.trim().is_empty())
                .unwrap_or(false);
            if !has_reference {
                let mut report = ValidationReport::default();
                report.push("payment_reference", "required when marking an invoice paid");
                return Err(Self::record_error(InvoiceError::ValidationFailed(report)));
            }
        }

        let reference = match new_status {
            PaymentStatus::Paid => payment_reference.as_deref(),
            _ => None,
        };

        let updated = match self
            .store
            .update_payment_status(invoice_id, current, new_status, reference)
            .await
            .map_err(Self::record_error)?
        {
            Some(invoice) => invoice,
            // The guarded write matched nothing: either the invoice vanished
            // or another transition landed between the check and the write.
            None => {
                let actual = match self
                    .store
                    .get_invoice(invoice_id)
                    .await
                    .map_err(Self::record_error)?
                {
                    Some((invoice, _)) => invoice.status(),
                    None => return Err(Self::record_error(InvoiceError::NotFound)),
                };
                warn!(
                    invoice_id = %invoice_id,
                    validated = %current,
                    actual = %actual,
                    to = %new_status,
                    "Payment status changed concurrently, rejecting stale transition"
                );
                return Err(Self::record_error(InvoiceError::InvalidStatusTransition {
                    from: actual,
                    to: new_status,
                }));
            }
        };

        INVOICES_TOTAL
            .with_label_values(&[new_status.as_str()])
            .inc();
        info!(
            invoice_id = %invoice_id,
            from = %current,
            to = %new_status,
            "Payment status updated"
        );

        Ok(updated)
    }

    /// Render the stored invoice as a standalone HTML document. Amounts come
    /// straight from the record; nothing is recomputed.
    #[instrument(
        skip(self),
        fields(service = "gst-invoicing-service", method = "RenderDocument")
    )]
    pub async fn render_document(&self, invoice_id: Uuid) -> Result<String, InvoiceError> {
        let (invoice, items) = self.get_invoice(invoice_id).await?;
        let html = render_invoice_html(&invoice, &items);
        info!(invoice_id = %invoice_id, bytes = html.len(), "Invoice document rendered");
        Ok(html)
    }
}
