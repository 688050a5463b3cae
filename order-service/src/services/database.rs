//! Database service for order-service.

use crate::models::{
    CreateCustomOrder, CreateInvoice, CreateMachine, CreateMaterial, CreateQuotation, CustomOrder,
    CustomerApproval, DesignFile, Invoice, InvoiceItem, InvoicePaymentStatus, Job, Machine,
    Material, MaterialImage, Payment, Quotation, QuotationStatus, UpdateJob, UpdateMachine,
    format_request_id, price_order,
};
use crate::services::metrics::DB_QUERY_DURATION;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const QUOTATION_COLUMNS: &str =
    "quotation_id, customer_id, description, amount, status, want_date, created_utc";
const JOB_COLUMNS: &str = "job_id, quotation_id, name, start_date, finish_date, status, \
     customer_id, amount, due_date, created_utc";
const INVOICE_COLUMNS: &str = "invoice_id, quotation_id, total_amount, paid_amount, \
     payment_status, customer_approval_status, created_utc";
const MATERIAL_COLUMNS: &str =
    "item_id, item_name, available_qty, unit_price, preorder_level, created_utc";
const CUSTOM_ORDER_COLUMNS: &str = "request_id, customer_name, item_type, quantity, unit_price, \
     service_charge, total_amount, payment_option, amount_paid, payment_status, created_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "order-service"))]
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
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Quotation Operations
    // -------------------------------------------------------------------------

    /// Create a new pending quotation with amount 0.00.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    pub async fn create_quotation(&self, input: &CreateQuotation) -> Result<Quotation, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_quotation"])
            .start_timer();

        let quotation_id = Uuid::new_v4();
        let quotation = sqlx::query_as::<_, Quotation>(&format!(
            r#"
            INSERT INTO quotations (quotation_id, customer_id, description, amount, status, want_date)
            VALUES ($1, $2, $3, 0, 'pending', $4)
            RETURNING {QUOTATION_COLUMNS}
            "#,
        ))
        .bind(quotation_id)
        .bind(input.customer_id)
        .bind(&input.description)
        .bind(input.want_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create quotation: {}", e)))?;

        timer.observe_duration();

        info!(quotation_id = %quotation.quotation_id, "Quotation created");

        Ok(quotation)
    }

    /// Get a quotation by ID.
    #[instrument(skip(self), fields(quotation_id = %quotation_id))]
    pub async fn get_quotation(&self, quotation_id: Uuid) -> Result<Option<Quotation>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_quotation"])
            .start_timer();

        let quotation = sqlx::query_as::<_, Quotation>(&format!(
            "SELECT {QUOTATION_COLUMNS} FROM quotations WHERE quotation_id = $1",
        ))
        .bind(quotation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get quotation: {}", e)))?;

        timer.observe_duration();

        Ok(quotation)
    }

    /// List all quotations, newest first.
    #[instrument(skip(self))]
    pub async fn list_quotations(
        &self,
        customer_id: Option<Uuid>,
    ) -> Result<Vec<Quotation>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_quotations"])
            .start_timer();

        let quotations = sqlx::query_as::<_, Quotation>(&format!(
            r#"
            SELECT {QUOTATION_COLUMNS} FROM quotations
            WHERE ($1::uuid IS NULL OR customer_id = $1)
            ORDER BY created_utc DESC
            "#,
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list quotations: {}", e)))?;

        timer.observe_duration();

        Ok(quotations)
    }

    /// Transition a quotation out of pending. Approval creates the job in
    /// the same transaction; a repeated transition is a conflict, never a
    /// second job.
    #[instrument(skip(self), fields(quotation_id = %quotation_id, status = status.as_str()))]
    pub async fn set_quotation_status(
        &self,
        quotation_id: Uuid,
        status: QuotationStatus,
    ) -> Result<(Quotation, Option<Job>), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["set_quotation_status"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let quotation = sqlx::query_as::<_, Quotation>(&format!(
            r#"
            UPDATE quotations
            SET status = $2
            WHERE quotation_id = $1 AND status = 'pending'
            RETURNING {QUOTATION_COLUMNS}
            "#,
        ))
        .bind(quotation_id)
        .bind(status.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update quotation status: {}", e))
        })?;

        let quotation = match quotation {
            Some(q) => q,
            None => {
                tx.rollback().await.ok();
                return match self.get_quotation(quotation_id).await? {
                    None => Err(AppError::NotFound(anyhow::anyhow!(
                        "Quotation {} not found",
                        quotation_id
                    ))),
                    Some(existing) => Err(AppError::Conflict(anyhow::anyhow!(
                        "Quotation {} is already {} and cannot transition to {}",
                        quotation_id,
                        existing.status,
                        status.as_str()
                    ))),
                };
            }
        };

        let job = if status == QuotationStatus::Approved {
            let job_id = Uuid::new_v4();
            let job = sqlx::query_as::<_, Job>(&format!(
                r#"
                INSERT INTO jobs (job_id, quotation_id, name, start_date, status, customer_id, amount, due_date)
                VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7)
                RETURNING {JOB_COLUMNS}
                "#,
            ))
            .bind(job_id)
            .bind(quotation.quotation_id)
            .bind(&quotation.description)
            .bind(Utc::now().date_naive())
            .bind(quotation.customer_id)
            .bind(quotation.amount)
            .bind(quotation.want_date)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    AppError::Conflict(anyhow::anyhow!(
                        "A job already exists for quotation {}",
                        quotation.quotation_id
                    ))
                }
                _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create job: {}", e)),
            })?;
            Some(job)
        } else {
            None
        };

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            quotation_id = %quotation.quotation_id,
            status = %quotation.status,
            job_created = job.is_some(),
            "Quotation status updated"
        );

        Ok((quotation, job))
    }

    // -------------------------------------------------------------------------
    // Job Operations
    // -------------------------------------------------------------------------

    /// List jobs, optionally scoped to one customer. An empty result is a
    /// valid successful result.
    #[instrument(skip(self))]
    pub async fn list_jobs(&self, customer_id: Option<Uuid>) -> Result<Vec<Job>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_jobs"])
            .start_timer();

        let jobs = sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {JOB_COLUMNS} FROM jobs
            WHERE ($1::uuid IS NULL OR customer_id = $1)
            ORDER BY created_utc DESC
            "#,
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list jobs: {}", e)))?;

        timer.observe_duration();

        Ok(jobs)
    }

    /// Get a job by ID.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_job"])
            .start_timer();

        let job = sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE job_id = $1",
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get job: {}", e)))?;

        timer.observe_duration();

        Ok(job)
    }

    /// Overwrite a job's schedule and status.
    #[instrument(skip(self, input), fields(job_id = %job_id))]
    pub async fn update_job(&self, job_id: Uuid, input: &UpdateJob) -> Result<Option<Job>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_job"])
            .start_timer();

        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET start_date = $2,
                finish_date = $3,
                status = $4
            WHERE job_id = $1
            RETURNING {JOB_COLUMNS}
            "#,
        ))
        .bind(job_id)
        .bind(input.start_date)
        .bind(input.finish_date)
        .bind(input.status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update job: {}", e)))?;

        timer.observe_duration();

        if let Some(ref job) = job {
            info!(job_id = %job.job_id, status = %job.status, "Job updated");
        }

        Ok(job)
    }

    // -------------------------------------------------------------------------
    // Invoice Operations
    // -------------------------------------------------------------------------

    /// Create an invoice and all of its line items in one transaction.
    #[instrument(skip(self, input), fields(quotation_id = %input.quotation_id))]
    pub async fn create_invoice(
        &self,
        input: &CreateInvoice,
    ) -> Result<(Invoice, Vec<InvoiceItem>), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let quotation_exists = sqlx::query_scalar::<_, i32>(
            "SELECT 1 FROM quotations WHERE quotation_id = $1",
        )
        .bind(input.quotation_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to check quotation: {}", e)))?;

        if quotation_exists.is_none() {
            tx.rollback().await.ok();
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Quotation {} not found",
                input.quotation_id
            )));
        }

        let invoice_id = Uuid::new_v4();
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            INSERT INTO invoices (invoice_id, quotation_id, total_amount, paid_amount, payment_status, customer_approval_status)
            VALUES ($1, $2, $3, 0, 'pending', 'pending')
            RETURNING {INVOICE_COLUMNS}
            "#,
        ))
        .bind(invoice_id)
        .bind(input.quotation_id)
        .bind(input.total_amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice: {}", e)))?;

        let mut items = Vec::with_capacity(input.line_items.len());
        for line in &input.line_items {
            let item = sqlx::query_as::<_, InvoiceItem>(
                r#"
                INSERT INTO invoice_items (item_id, invoice_id, material_name, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING item_id, invoice_id, material_name, quantity, unit_price
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(invoice_id)
            .bind(&line.material_name)
            .bind(line.quantity)
            .bind(line.unit_price)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert line item: {}", e))
            })?;
            items.push(item);
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            invoice_id = %invoice.invoice_id,
            line_items = items.len(),
            total = %invoice.total_amount,
            "Invoice created"
        );

        Ok((invoice, items))
    }

    /// Get an invoice by ID.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_id = $1",
        ))
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();

        Ok(invoice)
    }

    /// List invoices, newest first.
    #[instrument(skip(self))]
    pub async fn list_invoices(&self) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY created_utc DESC",
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        Ok(invoices)
    }

    /// Get the line items of an invoice.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn get_invoice_items(&self, invoice_id: Uuid) -> Result<Vec<InvoiceItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice_items"])
            .start_timer();

        let items = sqlx::query_as::<_, InvoiceItem>(
            r#"
            SELECT item_id, invoice_id, material_name, quantity, unit_price
            FROM invoice_items
            WHERE invoice_id = $1
            ORDER BY item_id
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get line items: {}", e)))?;

        timer.observe_duration();

        Ok(items)
    }

    /// Apply a payment to an invoice. The paid amount and the derived
    /// payment status move in a single conditional UPDATE, so concurrent
    /// payments cannot lose updates or push the invoice past its total.
    #[instrument(skip(self), fields(invoice_id = %invoice_id, amount = %amount))]
    pub async fn apply_payment(
        &self,
        invoice_id: Uuid,
        amount: Decimal,
        method: Option<String>,
    ) -> Result<(Invoice, Payment), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["apply_payment"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            UPDATE invoices
            SET paid_amount = paid_amount + $2,
                payment_status = CASE
                    WHEN paid_amount + $2 >= total_amount THEN 'completed'
                    ELSE 'partially_paid'
                END
            WHERE invoice_id = $1 AND paid_amount + $2 <= total_amount
            RETURNING {INVOICE_COLUMNS}
            "#,
        ))
        .bind(invoice_id)
        .bind(amount)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to apply payment: {}", e)))?;

        let invoice = match invoice {
            Some(inv) => inv,
            None => {
                tx.rollback().await.ok();
                return match self.get_invoice(invoice_id).await? {
                    None => Err(AppError::NotFound(anyhow::anyhow!(
                        "Invoice {} not found",
                        invoice_id
                    ))),
                    Some(existing) => Err(AppError::Conflict(anyhow::anyhow!(
                        "Payment of {} would exceed invoice total: {} of {} already paid",
                        amount,
                        existing.paid_amount,
                        existing.total_amount
                    ))),
                };
            }
        };

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (payment_id, invoice_id, amount, method)
            VALUES ($1, $2, $3, $4)
            RETURNING payment_id, invoice_id, amount, method, recorded_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(invoice_id)
        .bind(amount)
        .bind(&method)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to record payment: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            invoice_id = %invoice.invoice_id,
            paid_amount = %invoice.paid_amount,
            payment_status = %invoice.payment_status,
            "Payment applied"
        );

        Ok((invoice, payment))
    }

    /// List payments recorded against an invoice.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn list_payments(&self, invoice_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_payments"])
            .start_timer();

        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT payment_id, invoice_id, amount, method, recorded_utc
            FROM payments
            WHERE invoice_id = $1
            ORDER BY recorded_utc
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list payments: {}", e)))?;

        timer.observe_duration();

        Ok(payments)
    }

    /// Record the customer's one-time accept/cancel decision. Cancellation
    /// cascades to the job created from the invoice's quotation, in the
    /// same transaction.
    #[instrument(skip(self), fields(invoice_id = %invoice_id, decision = decision.as_str()))]
    pub async fn set_customer_approval(
        &self,
        invoice_id: Uuid,
        decision: CustomerApproval,
    ) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["set_customer_approval"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            UPDATE invoices
            SET customer_approval_status = $2
            WHERE invoice_id = $1 AND customer_approval_status = 'pending'
            RETURNING {INVOICE_COLUMNS}
            "#,
        ))
        .bind(invoice_id)
        .bind(decision.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to record approval decision: {}", e))
        })?;

        let invoice = match invoice {
            Some(inv) => inv,
            None => {
                tx.rollback().await.ok();
                return match self.get_invoice(invoice_id).await? {
                    None => Err(AppError::NotFound(anyhow::anyhow!(
                        "Invoice {} not found",
                        invoice_id
                    ))),
                    Some(existing) => Err(AppError::Conflict(anyhow::anyhow!(
                        "Invoice {} decision already recorded as {}",
                        invoice_id,
                        existing.customer_approval_status
                    ))),
                };
            }
        };

        if decision == CustomerApproval::Cancelled {
            sqlx::query("UPDATE jobs SET status = 'cancelled' WHERE quotation_id = $1")
                .bind(invoice.quotation_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to cascade cancellation: {}", e))
                })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            invoice_id = %invoice.invoice_id,
            decision = %invoice.customer_approval_status,
            "Customer approval recorded"
        );

        Ok(invoice)
    }

    // -------------------------------------------------------------------------
    // Material Operations
    // -------------------------------------------------------------------------

    /// Add a material with its image records in one transaction.
    #[instrument(skip(self, input), fields(item_id = %input.item_id))]
    pub async fn create_material(&self, input: &CreateMaterial) -> Result<Material, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_material"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let material = sqlx::query_as::<_, Material>(&format!(
            r#"
            INSERT INTO materials (item_id, item_name, available_qty, unit_price, preorder_level)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MATERIAL_COLUMNS}
            "#,
        ))
        .bind(&input.item_id)
        .bind(&input.item_name)
        .bind(input.available_qty)
        .bind(input.unit_price)
        .bind(input.preorder_level)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Material '{}' already exists", input.item_id))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create material: {}", e)),
        })?;

        for image_path in &input.images {
            sqlx::query(
                "INSERT INTO material_images (image_id, item_id, image_path) VALUES ($1, $2, $3)",
            )
            .bind(Uuid::new_v4())
            .bind(&input.item_id)
            .bind(image_path)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert image record: {}", e))
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(item_id = %material.item_id, "Material created");

        Ok(material)
    }

    /// Get a material by ID.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn get_material(&self, item_id: &str) -> Result<Option<Material>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_material"])
            .start_timer();

        let material = sqlx::query_as::<_, Material>(&format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials WHERE item_id = $1",
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get material: {}", e)))?;

        timer.observe_duration();

        Ok(material)
    }

    /// Get the image records of a material.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn get_material_images(&self, item_id: &str) -> Result<Vec<MaterialImage>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_material_images"])
            .start_timer();

        let images = sqlx::query_as::<_, MaterialImage>(
            "SELECT image_id, item_id, image_path FROM material_images WHERE item_id = $1",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get images: {}", e)))?;

        timer.observe_duration();

        Ok(images)
    }

    /// List all materials.
    #[instrument(skip(self))]
    pub async fn list_materials(&self) -> Result<Vec<Material>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_materials"])
            .start_timer();

        let materials = sqlx::query_as::<_, Material>(&format!(
            "SELECT {MATERIAL_COLUMNS} FROM materials ORDER BY item_id",
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list materials: {}", e)))?;

        timer.observe_duration();

        Ok(materials)
    }

    /// Overwrite a material's quantity, and optionally its unit price.
    /// Absolute semantics: callers wanting a relative change read first.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn update_material(
        &self,
        item_id: &str,
        available_qty: i32,
        unit_price: Option<Decimal>,
    ) -> Result<Option<Material>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_material"])
            .start_timer();

        let material = sqlx::query_as::<_, Material>(&format!(
            r#"
            UPDATE materials
            SET available_qty = $2,
                unit_price = COALESCE($3, unit_price)
            WHERE item_id = $1
            RETURNING {MATERIAL_COLUMNS}
            "#,
        ))
        .bind(item_id)
        .bind(available_qty)
        .bind(unit_price)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update material: {}", e)))?;

        timer.observe_duration();

        Ok(material)
    }

    /// Atomically consume stock. Fails with a conflict when insufficient
    /// stock remains; never clamps and never goes negative.
    #[instrument(skip(self), fields(item_id = %item_id, quantity = quantity))]
    pub async fn consume_material(
        &self,
        item_id: &str,
        quantity: i32,
    ) -> Result<Material, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["consume_material"])
            .start_timer();

        let material = sqlx::query_as::<_, Material>(&format!(
            r#"
            UPDATE materials
            SET available_qty = available_qty - $2
            WHERE item_id = $1 AND available_qty >= $2
            RETURNING {MATERIAL_COLUMNS}
            "#,
        ))
        .bind(item_id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to consume stock: {}", e)))?;

        timer.observe_duration();

        match material {
            Some(m) => {
                info!(item_id = %m.item_id, remaining = m.available_qty, "Stock consumed");
                Ok(m)
            }
            None => match self.get_material(item_id).await? {
                None => Err(AppError::NotFound(anyhow::anyhow!(
                    "Material '{}' not found",
                    item_id
                ))),
                Some(existing) => Err(AppError::Conflict(anyhow::anyhow!(
                    "Insufficient stock for '{}': {} available, {} requested",
                    item_id,
                    existing.available_qty,
                    quantity
                ))),
            },
        }
    }

    /// Delete a material, removing its image records first, in one
    /// transaction.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn delete_material(&self, item_id: &str) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_material"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        sqlx::query("DELETE FROM material_images WHERE item_id = $1")
            .bind(item_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete image records: {}", e))
            })?;

        let result = sqlx::query("DELETE FROM materials WHERE item_id = $1")
            .bind(item_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete material: {}", e))
            })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(item_id = %item_id, "Material deleted");
        }

        Ok(deleted)
    }

    // -------------------------------------------------------------------------
    // Machine Operations
    // -------------------------------------------------------------------------

    /// Add a machine to the catalog.
    #[instrument(skip(self, input), fields(machine_id = %input.machine_id))]
    pub async fn create_machine(&self, input: &CreateMachine) -> Result<Machine, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_machine"])
            .start_timer();

        let machine = sqlx::query_as::<_, Machine>(
            r#"
            INSERT INTO machines (machine_id, machine_name, hourly_rate, status)
            VALUES ($1, $2, $3, 'available')
            RETURNING machine_id, machine_name, hourly_rate, status, created_utc
            "#,
        )
        .bind(&input.machine_id)
        .bind(&input.machine_name)
        .bind(input.hourly_rate)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Machine '{}' already exists",
                    input.machine_id
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create machine: {}", e)),
        })?;

        timer.observe_duration();

        info!(machine_id = %machine.machine_id, "Machine created");

        Ok(machine)
    }

    /// List all machines.
    #[instrument(skip(self))]
    pub async fn list_machines(&self) -> Result<Vec<Machine>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_machines"])
            .start_timer();

        let machines = sqlx::query_as::<_, Machine>(
            "SELECT machine_id, machine_name, hourly_rate, status, created_utc FROM machines ORDER BY machine_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list machines: {}", e)))?;

        timer.observe_duration();

        Ok(machines)
    }

    /// Update a machine's name, rate or status.
    #[instrument(skip(self, input), fields(machine_id = %machine_id))]
    pub async fn update_machine(
        &self,
        machine_id: &str,
        input: &UpdateMachine,
    ) -> Result<Option<Machine>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_machine"])
            .start_timer();

        let machine = sqlx::query_as::<_, Machine>(
            r#"
            UPDATE machines
            SET machine_name = COALESCE($2, machine_name),
                hourly_rate = COALESCE($3, hourly_rate),
                status = COALESCE($4, status)
            WHERE machine_id = $1
            RETURNING machine_id, machine_name, hourly_rate, status, created_utc
            "#,
        )
        .bind(machine_id)
        .bind(&input.machine_name)
        .bind(input.hourly_rate)
        .bind(input.status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update machine: {}", e)))?;

        timer.observe_duration();

        Ok(machine)
    }

    /// Delete a machine.
    #[instrument(skip(self), fields(machine_id = %machine_id))]
    pub async fn delete_machine(&self, machine_id: &str) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_machine"])
            .start_timer();

        let result = sqlx::query("DELETE FROM machines WHERE machine_id = $1")
            .bind(machine_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete machine: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Custom Order Operations
    // -------------------------------------------------------------------------

    /// Create a custom order with its design-file records in one
    /// transaction. The request id is drawn from a sequence, so concurrent
    /// creates always receive distinct ids.
    #[instrument(skip(self, input), fields(item_type = input.item_type.as_str()))]
    pub async fn create_custom_order(
        &self,
        input: &CreateCustomOrder,
    ) -> Result<(CustomOrder, Vec<DesignFile>), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_custom_order"])
            .start_timer();

        let pricing = price_order(
            input.item_type,
            input.quantity,
            input.service_charge,
            input.payment_option,
        );
        let payment_status =
            InvoicePaymentStatus::derive(pricing.amount_paid, pricing.total_amount);

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let seq = sqlx::query_scalar::<_, i64>("SELECT nextval('custom_order_seq')")
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to allocate request id: {}", e))
            })?;
        let request_id = format_request_id(seq);

        let order = sqlx::query_as::<_, CustomOrder>(&format!(
            r#"
            INSERT INTO custom_orders (
                request_id, customer_name, item_type, quantity, unit_price,
                service_charge, total_amount, payment_option, amount_paid, payment_status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {CUSTOM_ORDER_COLUMNS}
            "#,
        ))
        .bind(&request_id)
        .bind(&input.customer_name)
        .bind(input.item_type.as_str())
        .bind(input.quantity)
        .bind(pricing.unit_price)
        .bind(input.service_charge)
        .bind(pricing.total_amount)
        .bind(input.payment_option.as_str())
        .bind(pricing.amount_paid)
        .bind(payment_status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create custom order: {}", e))
        })?;

        let mut files = Vec::with_capacity(input.design_files.len());
        for file in &input.design_files {
            let record = sqlx::query_as::<_, DesignFile>(
                r#"
                INSERT INTO design_files (file_id, request_id, file_name, stored_path, content_type)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING file_id, request_id, file_name, stored_path, content_type, uploaded_utc
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&request_id)
            .bind(&file.file_name)
            .bind(&file.stored_path)
            .bind(&file.content_type)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert design file: {}", e))
            })?;
            files.push(record);
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            request_id = %order.request_id,
            total = %order.total_amount,
            amount_paid = %order.amount_paid,
            "Custom order created"
        );

        Ok((order, files))
    }

    /// Get a custom order by request ID.
    #[instrument(skip(self), fields(request_id = %request_id))]
    pub async fn get_custom_order(&self, request_id: &str) -> Result<Option<CustomOrder>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_custom_order"])
            .start_timer();

        let order = sqlx::query_as::<_, CustomOrder>(&format!(
            "SELECT {CUSTOM_ORDER_COLUMNS} FROM custom_orders WHERE request_id = $1",
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get custom order: {}", e))
        })?;

        timer.observe_duration();

        Ok(order)
    }

    /// Get the design files of a custom order.
    #[instrument(skip(self), fields(request_id = %request_id))]
    pub async fn get_design_files(&self, request_id: &str) -> Result<Vec<DesignFile>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_design_files"])
            .start_timer();

        let files = sqlx::query_as::<_, DesignFile>(
            r#"
            SELECT file_id, request_id, file_name, stored_path, content_type, uploaded_utc
            FROM design_files
            WHERE request_id = $1
            ORDER BY uploaded_utc
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get design files: {}", e))
        })?;

        timer.observe_duration();

        Ok(files)
    }

    /// List all custom orders, newest first.
    #[instrument(skip(self))]
    pub async fn list_custom_orders(&self) -> Result<Vec<CustomOrder>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_custom_orders"])
            .start_timer();

        let orders = sqlx::query_as::<_, CustomOrder>(&format!(
            "SELECT {CUSTOM_ORDER_COLUMNS} FROM custom_orders ORDER BY created_utc DESC",
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list custom orders: {}", e))
        })?;

        timer.observe_duration();

        Ok(orders)
    }

    // -------------------------------------------------------------------------
    // Report Queries
    // -------------------------------------------------------------------------

    /// Invoices whose creation date falls inside the given period.
    #[instrument(skip(self))]
    pub async fn invoices_in_period(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["invoices_in_period"])
            .start_timer();

        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS} FROM invoices
            WHERE ($1::date IS NULL OR created_utc::date >= $1)
              AND ($2::date IS NULL OR created_utc::date <= $2)
            ORDER BY created_utc
            "#,
        ))
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to query sales period: {}", e))
        })?;

        timer.observe_duration();

        Ok(invoices)
    }
}
