//! Services module for gst-invoicing-service.

pub mod database;
pub mod directory;
pub mod invoice;
pub mod memory;
pub mod metrics;
pub mod numbering;
pub mod render;
pub mod store;
pub mod tax;
pub mod totals;
pub mod validation;

pub use database::Database;
pub use directory::{PartyDirectory, StaticPartyDirectory};
pub use invoice::InvoiceService;
pub use memory::InMemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use numbering::InvoiceNumberGenerator;
pub use render::render_invoice_html;
pub use store::InvoiceStore;
pub use tax::{SupplyType, TaxCalculator};
pub use totals::{InvoiceAggregator, InvoiceTotals};
pub use validation::IdentifierValidator;
