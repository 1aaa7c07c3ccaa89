//! Configuration module for gst-invoicing-service.

use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Registration details of the invoice issuer, stamped onto every invoice.
#[derive(Debug, Clone)]
pub struct IssuerProfile {
    pub name: String,
    pub gstin: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl IssuerProfile {
    /// Two-digit state code taken from the GSTIN prefix, when configured.
    pub fn state_code(&self) -> Option<&str> {
        self.gstin.as_deref().and_then(|g| g.get(..2))
    }
}

/// Invoice number series settings.
#[derive(Debug, Clone)]
pub struct NumberingConfig {
    pub prefix: String,
}

/// Postgres connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Top-level configuration for the invoicing engine.
#[derive(Debug, Clone)]
pub struct InvoicingConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub issuer: IssuerProfile,
    pub numbering: NumberingConfig,
    pub database: DatabaseConfig,
}

impl InvoicingConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "gst-invoicing-service".to_string()),
            issuer: IssuerProfile {
                name: env::var("ISSUER_NAME").unwrap_or_default(),
                gstin: env::var("ISSUER_GSTIN").ok().filter(|g| !g.is_empty()),
                line1: env::var("ISSUER_ADDRESS_LINE1").ok(),
                line2: env::var("ISSUER_ADDRESS_LINE2").ok(),
                city: env::var("ISSUER_CITY").ok(),
                state: env::var("ISSUER_STATE").ok(),
                postal_code: env::var("ISSUER_POSTAL_CODE").ok(),
                country: env::var("ISSUER_COUNTRY").ok(),
            },
            numbering: NumberingConfig {
                prefix: env::var("INVOICE_NUMBER_PREFIX").unwrap_or_else(|_| "INV".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required"))
                })?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            },
        })
    }
}
