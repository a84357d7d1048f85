//! Invoice model for invoice-service.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Invoice payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Paid,
    Unpaid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Unpaid => "Unpaid",
        }
    }

    /// Strict parse: `None` for anything outside the two known values.
    ///
    /// Used on the update path, where an unrecognized status leaves the
    /// stored value unchanged.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Paid" => Some(InvoiceStatus::Paid),
            "Unpaid" => Some(InvoiceStatus::Unpaid),
            _ => None,
        }
    }

    /// Lenient parse used on the create path: unknown values fall back to
    /// `Unpaid`.
    pub fn from_string(s: &str) -> Self {
        Self::parse(s).unwrap_or(InvoiceStatus::Unpaid)
    }
}

/// Invoice record.
///
/// `id` is assigned by the store at creation and immutable; `invoice_number`
/// is globally unique, enforced at write time. `status` is stored as text
/// and kept inside {Paid, Unpaid} by the write paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: i64,
    pub invoice_number: String,
    pub customer_name: String,
    pub amount: Decimal,
    pub invoice_date: NaiveDate,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Filter parameters for listing invoices.
///
/// All clauses are AND-combined; `search` is a substring match OR'd across
/// invoice number and customer name. `status` is `None` both when the
/// parameter was absent and when it carried an unrecognized value.
#[derive(Debug, Clone, Default)]
pub struct ListInvoicesFilter {
    pub status: Option<InvoiceStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub search: Option<String>,
}

/// Input for creating an invoice, already validated and normalized.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub customer_name: String,
    pub amount: Decimal,
    pub invoice_date: NaiveDate,
    pub status: InvoiceStatus,
}

/// Sparse update input. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct InvoiceChanges {
    pub invoice_number: Option<String>,
    pub customer_name: Option<String>,
    pub amount: Option<Decimal>,
    pub invoice_date: Option<NaiveDate>,
    pub status: Option<InvoiceStatus>,
}

/// Aggregates computed over the whole collection, regardless of any active
/// filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct CollectionStats {
    pub total_invoices: i64,
    pub total_amount: Decimal,
}
