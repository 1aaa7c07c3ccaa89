//! Invoice number generation.

use crate::error::InvoiceError;
use crate::services::store::InvoiceStore;
use chrono::Utc;
use rand::Rng;
use tracing::{instrument, warn};

/// Attempts before giving up on finding an unused number.
pub const MAX_GENERATION_ATTEMPTS: u32 = 5;

/// Produces invoice numbers of the form `PREFIX-YYYYMMDD-HHMMSSmmm-XXXXXXXX`
/// (UTC timestamp to the millisecond plus a random hex suffix). Candidates
/// are checked against the store before being handed out; the store's unique
/// index remains the final arbiter under concurrency.
#[derive(Debug, Clone)]
pub struct InvoiceNumberGenerator {
    prefix: String,
}

impl InvoiceNumberGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn candidate(&self) -> String {
        let timestamp = Utc::now().format("%Y%m%d-%H%M%S%3f");
        let suffix: u32 = rand::thread_rng().gen();
        format!("{}-{}-{:08X}", self.prefix, timestamp, suffix)
    }

    /// Generate a number not currently present in the store.
    #[instrument(skip(self, store))]
    pub async fn generate(&self, store: &dyn InvoiceStore) -> Result<String, InvoiceError> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let candidate = self.candidate();
            if !store.invoice_number_exists(&candidate).await? {
                return Ok(candidate);
            }
            warn!(attempt = attempt, candidate = %candidate, "Invoice number collision, retrying");
        }
        Err(InvoiceError::NumberGenerationExhausted {
            attempts: MAX_GENERATION_ATTEMPTS,
        })
    }
}
