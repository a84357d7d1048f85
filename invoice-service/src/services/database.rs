//! PostgreSQL-backed store for invoice-service.

use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

use crate::models::{
    CollectionStats, Invoice, InvoiceChanges, ListInvoicesFilter, NewInvoice, User,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::{InvoiceStore, UserStore};

const INVOICE_COLUMNS: &str =
    "id, invoice_number, customer_name, amount, invoice_date, status, created_at";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

/// Turn a raw search term into a LIKE pattern, escaping the wildcard
/// characters so the term matches literally.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "invoice-service"))]
    pub async fn connect(
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
            .map_err(|e| AppError::QueryFailed(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::QueryFailed(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl InvoiceStore for Database {
    /// List invoices matching the filter, newest first.
    ///
    /// The active clauses are conjoined in a single parameterized query; the
    /// search clause is the one disjunction, across invoice number and
    /// customer name.
    #[instrument(skip(self, filter))]
    async fn list_invoices(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let status = filter.status.map(|s| s.as_str());
        let search = filter.search.as_deref().map(like_pattern);

        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}
            FROM invoices
            WHERE ($1::varchar IS NULL OR status = $1)
              AND ($2::date IS NULL OR invoice_date >= $2)
              AND ($3::date IS NULL OR invoice_date <= $3)
              AND ($4::varchar IS NULL OR invoice_number LIKE $4 OR customer_name LIKE $4)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(status)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(search)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::QueryFailed(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        Ok(invoices)
    }

    /// Whole-collection aggregates. Issued independently of any filtered
    /// listing; the two reads share no snapshot.
    #[instrument(skip(self))]
    async fn collection_stats(&self) -> Result<CollectionStats, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["collection_stats"])
            .start_timer();

        let stats = sqlx::query_as::<_, CollectionStats>(
            r#"
            SELECT COUNT(*) AS total_invoices,
                   COALESCE(SUM(amount), 0) AS total_amount
            FROM invoices
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::QueryFailed(anyhow::anyhow!("Failed to compute invoice stats: {}", e))
        })?;

        timer.observe_duration();

        Ok(stats)
    }

    #[instrument(skip(self), fields(invoice_id = id))]
    async fn get_invoice(&self, id: i64) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::QueryFailed(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();

        Ok(invoice)
    }

    #[instrument(skip(self))]
    async fn find_by_invoice_number(
        &self,
        invoice_number: &str,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_by_invoice_number"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_number = $1"
        ))
        .bind(invoice_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::QueryFailed(anyhow::anyhow!("Failed to look up invoice number: {}", e))
        })?;

        timer.observe_duration();

        Ok(invoice)
    }

    /// Insert a new invoice. The unique constraint on `invoice_number` is
    /// the source of truth under concurrent creates; a violation maps to
    /// `DuplicateKey` rather than a generic failure.
    #[instrument(skip(self, input))]
    async fn create_invoice(&self, input: &NewInvoice) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            INSERT INTO invoices (invoice_number, customer_name, amount, invoice_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(&input.invoice_number)
        .bind(&input.customer_name)
        .bind(input.amount)
        .bind(input.invoice_date)
        .bind(input.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateKey(anyhow::anyhow!("Invoice number already exists"))
            }
            _ => AppError::QueryFailed(anyhow::anyhow!("Failed to create invoice: {}", e)),
        })?;

        timer.observe_duration();

        Ok(invoice)
    }

    #[instrument(skip(self, changes), fields(invoice_id = id))]
    async fn update_invoice(
        &self,
        id: i64,
        changes: &InvoiceChanges,
    ) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice"])
            .start_timer();

        let status = changes.status.map(|s| s.as_str());

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            UPDATE invoices
            SET invoice_number = COALESCE($2, invoice_number),
                customer_name = COALESCE($3, customer_name),
                amount = COALESCE($4, amount),
                invoice_date = COALESCE($5, invoice_date),
                status = COALESCE($6, status)
            WHERE id = $1
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.invoice_number)
        .bind(&changes.customer_name)
        .bind(changes.amount)
        .bind(changes.invoice_date)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateKey(anyhow::anyhow!("Invoice number already exists"))
            }
            _ => AppError::QueryFailed(anyhow::anyhow!("Failed to update invoice: {}", e)),
        })?;

        timer.observe_duration();

        Ok(invoice)
    }

    #[instrument(skip(self), fields(invoice_id = id))]
    async fn delete_invoice(&self, id: i64) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_invoice"])
            .start_timer();

        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::QueryFailed(anyhow::anyhow!("Failed to delete invoice: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::QueryFailed(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for Database {
    #[instrument(skip(self))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_user_by_email"])
            .start_timer();

        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, name, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::QueryFailed(anyhow::anyhow!("Failed to look up user: {}", e)))?;

        timer.observe_duration();

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn count_users(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::QueryFailed(anyhow::anyhow!("Failed to count users: {}", e)))?;

        Ok(count)
    }

    #[instrument(skip(self, password_hash))]
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, name, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateKey(anyhow::anyhow!("Email already in use"))
            }
            _ => AppError::QueryFailed(anyhow::anyhow!("Failed to create user: {}", e)),
        })?;

        info!(user_id = user.id, "User created");

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_wraps_in_wildcards() {
        assert_eq!(like_pattern("Acme"), "%Acme%");
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("INV_1"), "%INV\\_1%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
