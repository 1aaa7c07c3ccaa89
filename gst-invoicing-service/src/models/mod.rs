//! Domain models for gst-invoicing-service.

mod invoice;
mod line_item;
mod party;

pub use invoice::{CreateInvoiceRequest, CreatedInvoice, Invoice, PaymentStatus};
pub use line_item::{InvoiceItem, LineItemInput};
pub use party::CustomerParty;
