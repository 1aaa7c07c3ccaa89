//! Postgres-backed invoice store.

use crate::error::InvoiceError;
use crate::models::{Invoice, InvoiceItem, PaymentStatus};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::InvoiceStore;
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, instrument};
use uuid::Uuid;

/// Upper bound on any single storage call.
const STATEMENT_TIMEOUT: Duration = Duration::from_secs(10);

const INVOICE_COLUMNS: &str = "invoice_id, invoice_number, customer_id, customer_name, customer_contact, customer_gstin, \
     billing_line1, billing_line2, billing_city, billing_state, billing_postal_code, billing_country, \
     issuer_name, issuer_gstin, issuer_line1, issuer_line2, issuer_city, issuer_state, issuer_postal_code, issuer_country, \
     place_of_supply, reverse_charge, invoice_date, due_date, payment_status, payment_reference, \
     subtotal, cgst_total, sgst_total, igst_total, cess_total, grand_total, \
     notes, created_utc, updated_utc";

const ITEM_COLUMNS: &str = "line_item_id, invoice_id, line_no, description, hsn_code, \
     quantity, unit_price, discount, taxable_value, \
     cgst_rate, sgst_rate, igst_rate, cess_rate, \
     cgst_amount, sgst_amount, igst_amount, cess_amount, total, created_utc";

fn map_db_error(context: &str, e: sqlx::Error) -> InvoiceError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            InvoiceError::StorageUnavailable(anyhow::anyhow!(
                "{}: invoice number already exists",
                context
            ))
        }
        _ => InvoiceError::StorageUnavailable(anyhow::anyhow!("{}: {}", context, e)),
    }
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "gst-invoicing-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Failed to connect to database: {}", e))
            })?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), InvoiceError> {
        self.bounded("Health check failed", async {
            sqlx::query("SELECT 1").execute(&self.pool).await.map(|_| ())
        })
        .await
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), InvoiceError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                InvoiceError::StorageUnavailable(anyhow::anyhow!("Migration failed: {}", e))
            })?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Run a storage future under the statement timeout.
    async fn bounded<T, F>(&self, context: &'static str, fut: F) -> Result<T, InvoiceError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match timeout(STATEMENT_TIMEOUT, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(map_db_error(context, e)),
            Err(_) => Err(InvoiceError::StorageUnavailable(anyhow::anyhow!(
                "{}: timed out after {:?}",
                context,
                STATEMENT_TIMEOUT
            ))),
        }
    }
}

#[async_trait]
impl InvoiceStore for Database {
    #[instrument(skip(self, invoice, items), fields(invoice_id = %invoice.invoice_id))]
    async fn insert_invoice(
        &self,
        invoice: &Invoice,
        items: &[InvoiceItem],
    ) -> Result<(), InvoiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_invoice"])
            .start_timer();

        let insert_sql = format!(
            "INSERT INTO invoices ({}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
              $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32, $33, $34, $35)",
            INVOICE_COLUMNS
        );
        let item_sql = format!(
            "INSERT INTO invoice_items ({}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)",
            ITEM_COLUMNS
        );

        self.bounded("Failed to insert invoice", async {
            let mut tx = self.pool.begin().await?;

            sqlx::query(&insert_sql)
                .bind(invoice.invoice_id)
                .bind(&invoice.invoice_number)
                .bind(invoice.customer_id)
                .bind(&invoice.customer_name)
                .bind(&invoice.customer_contact)
                .bind(&invoice.customer_gstin)
                .bind(&invoice.billing_line1)
                .bind(&invoice.billing_line2)
                .bind(&invoice.billing_city)
                .bind(&invoice.billing_state)
                .bind(&invoice.billing_postal_code)
                .bind(&invoice.billing_country)
                .bind(&invoice.issuer_name)
                .bind(&invoice.issuer_gstin)
                .bind(&invoice.issuer_line1)
                .bind(&invoice.issuer_line2)
                .bind(&invoice.issuer_city)
                .bind(&invoice.issuer_state)
                .bind(&invoice.issuer_postal_code)
                .bind(&invoice.issuer_country)
                .bind(&invoice.place_of_supply)
                .bind(invoice.reverse_charge)
                .bind(invoice.invoice_date)
                .bind(invoice.due_date)
                .bind(&invoice.payment_status)
                .bind(&invoice.payment_reference)
                .bind(invoice.subtotal)
                .bind(invoice.cgst_total)
                .bind(invoice.sgst_total)
                .bind(invoice.igst_total)
                .bind(invoice.cess_total)
                .bind(invoice.grand_total)
                .bind(&invoice.notes)
                .bind(invoice.created_utc)
                .bind(invoice.updated_utc)
                .execute(&mut *tx)
                .await?;

            for item in items {
                sqlx::query(&item_sql)
                    .bind(item.line_item_id)
                    .bind(item.invoice_id)
                    .bind(item.line_no)
                    .bind(&item.description)
                    .bind(&item.hsn_code)
                    .bind(item.quantity)
                    .bind(item.unit_price)
                    .bind(item.discount)
                    .bind(item.taxable_value)
                    .bind(item.cgst_rate)
                    .bind(item.sgst_rate)
                    .bind(item.igst_rate)
                    .bind(item.cess_rate)
                    .bind(item.cgst_amount)
                    .bind(item.sgst_amount)
                    .bind(item.igst_amount)
                    .bind(item.cess_amount)
                    .bind(item.total)
                    .bind(item.created_utc)
                    .execute(&mut *tx)
                    .await?;
            }

            tx.commit().await
        })
        .await?;

        timer.observe_duration();

        info!(
            invoice_id = %invoice.invoice_id,
            invoice_number = %invoice.invoice_number,
            items = items.len(),
            "Invoice persisted"
        );

        Ok(())
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn get_invoice(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<(Invoice, Vec<InvoiceItem>)>, InvoiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice_sql = format!(
            "SELECT {} FROM invoices WHERE invoice_id = $1",
            INVOICE_COLUMNS
        );
        let items_sql = format!(
            "SELECT {} FROM invoice_items WHERE invoice_id = $1 ORDER BY line_no",
            ITEM_COLUMNS
        );

        let result = self
            .bounded("Failed to get invoice", async {
                let invoice = sqlx::query_as::<_, Invoice>(&invoice_sql)
                    .bind(invoice_id)
                    .fetch_optional(&self.pool)
                    .await?;

                match invoice {
                    Some(inv) => {
                        let items = sqlx::query_as::<_, InvoiceItem>(&items_sql)
                            .bind(invoice_id)
                            .fetch_all(&self.pool)
                            .await?;
                        Ok(Some((inv, items)))
                    }
                    None => Ok(None),
                }
            })
            .await?;

        timer.observe_duration();

        Ok(result)
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn list_for_customer(&self, customer_id: Uuid) -> Result<Vec<Invoice>, InvoiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_for_customer"])
            .start_timer();

        let sql = format!(
            "SELECT {} FROM invoices WHERE customer_id = $1 \
             ORDER BY created_utc DESC, invoice_number DESC",
            INVOICE_COLUMNS
        );

        let invoices = self
            .bounded("Failed to list invoices", async {
                sqlx::query_as::<_, Invoice>(&sql)
                    .bind(customer_id)
                    .fetch_all(&self.pool)
                    .await
            })
            .await?;

        timer.observe_duration();

        Ok(invoices)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id, from = %from, to = %to))]
    async fn update_payment_status(
        &self,
        invoice_id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
        payment_reference: Option<&str>,
    ) -> Result<Option<Invoice>, InvoiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_payment_status"])
            .start_timer();

        // The status guard makes the write conditional: a concurrent
        // transition that landed first leaves nothing to match.
        let sql = format!(
            "UPDATE invoices \
             SET payment_status = $2, payment_reference = $3, updated_utc = NOW() \
             WHERE invoice_id = $1 AND payment_status = $4 \
             RETURNING {}",
            INVOICE_COLUMNS
        );

        let invoice = self
            .bounded("Failed to update payment status", async {
                sqlx::query_as::<_, Invoice>(&sql)
                    .bind(invoice_id)
                    .bind(to.as_str())
                    .bind(payment_reference)
                    .bind(from.as_str())
                    .fetch_optional(&self.pool)
                    .await
            })
            .await?;

        timer.observe_duration();

        if let Some(ref inv) = invoice {
            info!(
                invoice_id = %inv.invoice_id,
                status = %inv.payment_status,
                "Payment status persisted"
            );
        }

        Ok(invoice)
    }

    #[instrument(skip(self))]
    async fn invoice_number_exists(&self, invoice_number: &str) -> Result<bool, InvoiceError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["invoice_number_exists"])
            .start_timer();

        let exists = self
            .bounded("Failed to check invoice number", async {
                sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM invoices WHERE invoice_number = $1)",
                )
                .bind(invoice_number)
                .fetch_one(&self.pool)
                .await
            })
            .await?;

        timer.observe_duration();

        Ok(exists)
    }
}
