pub mod auth;
pub mod invoices;

use serde::{Deserialize, Serialize};

/// Error body shared by every failing response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
