//! GST Invoicing Service - Tax invoice creation, lifecycle and document rendering.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
