//! Store abstraction in front of the persistence engine.

use async_trait::async_trait;
use service_core::error::AppError;

use crate::models::{
    CollectionStats, Invoice, InvoiceChanges, ListInvoicesFilter, NewInvoice, User,
};

/// Record store for invoices.
///
/// The service relies on the store for unique-constraint enforcement on
/// `invoice_number` and atomic single-record read/write; it adds no locking
/// of its own.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Filtered listing, sorted by creation time descending.
    async fn list_invoices(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError>;

    /// Aggregates over the entire collection, ignoring any filters.
    async fn collection_stats(&self) -> Result<CollectionStats, AppError>;

    async fn get_invoice(&self, id: i64) -> Result<Option<Invoice>, AppError>;

    async fn find_by_invoice_number(
        &self,
        invoice_number: &str,
    ) -> Result<Option<Invoice>, AppError>;

    /// Insert a new record. A unique-constraint violation on
    /// `invoice_number` surfaces as `AppError::DuplicateKey`.
    async fn create_invoice(&self, input: &NewInvoice) -> Result<Invoice, AppError>;

    /// Sparse update; `None` fields are left untouched. Returns `None` when
    /// the id does not exist.
    async fn update_invoice(
        &self,
        id: i64,
        changes: &InvoiceChanges,
    ) -> Result<Option<Invoice>, AppError>;

    /// Returns whether a record was removed.
    async fn delete_invoice(&self, id: i64) -> Result<bool, AppError>;

    /// Store connectivity probe for health reporting.
    async fn health_check(&self) -> Result<(), AppError>;
}

/// User lookups backing login and bootstrap.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn count_users(&self) -> Result<i64, AppError>;

    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
    ) -> Result<User, AppError>;
}
