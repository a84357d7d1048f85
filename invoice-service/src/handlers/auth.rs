use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::auth::{LoginRequest, LoginResponse},
    utils::{verify_password, Password, PasswordHashString},
    AppState,
};

/// Login with email and password, returning a bearer token for the invoice
/// routes.
///
/// Unknown email and wrong password produce the same undifferentiated
/// rejection.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(email), Some(password)) = (
        req.email.filter(|s| !s.is_empty()),
        req.password.filter(|s| !s.is_empty()),
    ) else {
        return Err(AppError::Validation(anyhow::anyhow!(
            "Email and password are required"
        )));
    };

    let user = state
        .users
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthenticated(anyhow::anyhow!("Invalid email or password")))?;

    verify_password(
        &Password::new(password),
        &PasswordHashString::new(user.password_hash.clone()),
    )
    .map_err(|_| AppError::Unauthenticated(anyhow::anyhow!("Invalid email or password")))?;

    let token = state
        .jwt
        .generate_access_token(&user.id.to_string(), &user.email)?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: user.sanitized(),
    }))
}
