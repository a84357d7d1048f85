use serde::{Deserialize, Serialize};

use crate::models::SanitizedUser;

/// Body for `POST /api/auth/login`. Both fields are required; requiredness
/// is enforced in the handler so the response is the contract's 400.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: SanitizedUser,
}
