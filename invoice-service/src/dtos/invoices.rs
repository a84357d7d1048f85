use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Invoice, InvoiceStatus, ListInvoicesFilter};

/// Query parameters accepted by `GET /api/invoices`.
///
/// Every parameter is optional. An unrecognized `status` value applies no
/// status filter at all; an empty `search` string is treated as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInvoicesQuery {
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub search: Option<String>,
}

impl ListInvoicesQuery {
    pub fn into_filter(self) -> ListInvoicesFilter {
        ListInvoicesFilter {
            status: self.status.as_deref().and_then(InvoiceStatus::parse),
            start_date: self.start_date,
            end_date: self.end_date,
            search: self.search.filter(|s| !s.is_empty()),
        }
    }
}

/// Aggregate stats returned alongside every list response.
///
/// `total_invoices` and `total_amount` cover the entire collection even when
/// filters narrow the visible list; only `filtered_count` tracks the filter.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceStatsResponse {
    pub total_invoices: i64,
    pub total_amount: Decimal,
    pub filtered_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListInvoicesResponse {
    pub invoices: Vec<Invoice>,
    pub stats: InvoiceStatsResponse,
}

/// Body for `POST /api/invoices`.
///
/// Requiredness is enforced in the handler rather than by the type so a
/// missing field maps to the contract's 400 instead of a deserialization
/// rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub invoice_number: Option<String>,
    pub customer_name: Option<String>,
    pub amount: Option<Decimal>,
    pub invoice_date: Option<NaiveDate>,
    pub status: Option<String>,
}

/// Body for `PUT /api/invoices/:id`. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceRequest {
    pub invoice_number: Option<String>,
    pub customer_name: Option<String>,
    pub amount: Option<Decimal>,
    pub invoice_date: Option<NaiveDate>,
    pub status: Option<String>,
}
