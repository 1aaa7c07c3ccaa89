//! service-core: Shared infrastructure for the tax platform services.
pub mod config;
pub mod error;
pub mod observability;
