//! Shared test harness: the full router over an in-memory store.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use tower::util::ServiceExt;

use invoice_service::{
    build_router,
    config::{
        BootstrapConfig, DatabaseConfig, Environment, JwtConfig, SecurityConfig, ServiceConfig,
    },
    models::{CollectionStats, Invoice, InvoiceChanges, ListInvoicesFilter, NewInvoice, User},
    services::{InvoiceStore, JwtService, UserStore},
    utils::{hash_password, Password},
    AppState,
};
use service_core::error::AppError;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// In-memory store standing in for PostgreSQL, with the same observable
/// semantics: unique invoice numbers, newest-first listings, sparse updates.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    invoices: Vec<Invoice>,
    users: Vec<User>,
    next_invoice_id: i64,
    next_user_id: i64,
}

impl MemoryStore {
    fn matches(invoice: &Invoice, filter: &ListInvoicesFilter) -> bool {
        if let Some(status) = filter.status {
            if invoice.status != status.as_str() {
                return false;
            }
        }
        if let Some(start) = filter.start_date {
            if invoice.invoice_date < start {
                return false;
            }
        }
        if let Some(end) = filter.end_date {
            if invoice.invoice_date > end {
                return false;
            }
        }
        if let Some(ref search) = filter.search {
            if !invoice.invoice_number.contains(search.as_str())
                && !invoice.customer_name.contains(search.as_str())
            {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn list_invoices(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError> {
        let inner = self.inner.lock().unwrap();
        let mut invoices: Vec<Invoice> = inner
            .invoices
            .iter()
            .filter(|inv| Self::matches(inv, filter))
            .cloned()
            .collect();
        invoices.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(invoices)
    }

    async fn collection_stats(&self) -> Result<CollectionStats, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(CollectionStats {
            total_invoices: inner.invoices.len() as i64,
            total_amount: inner.invoices.iter().map(|inv| inv.amount).sum(),
        })
    }

    async fn get_invoice(&self, id: i64) -> Result<Option<Invoice>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.invoices.iter().find(|inv| inv.id == id).cloned())
    }

    async fn find_by_invoice_number(
        &self,
        invoice_number: &str,
    ) -> Result<Option<Invoice>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .invoices
            .iter()
            .find(|inv| inv.invoice_number == invoice_number)
            .cloned())
    }

    async fn create_invoice(&self, input: &NewInvoice) -> Result<Invoice, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .invoices
            .iter()
            .any(|inv| inv.invoice_number == input.invoice_number)
        {
            return Err(AppError::DuplicateKey(anyhow::anyhow!(
                "Invoice number already exists"
            )));
        }

        inner.next_invoice_id += 1;
        let invoice = Invoice {
            id: inner.next_invoice_id,
            invoice_number: input.invoice_number.clone(),
            customer_name: input.customer_name.clone(),
            amount: input.amount,
            invoice_date: input.invoice_date,
            status: input.status.as_str().to_string(),
            created_at: Utc::now(),
        };
        inner.invoices.push(invoice.clone());
        Ok(invoice)
    }

    async fn update_invoice(
        &self,
        id: i64,
        changes: &InvoiceChanges,
    ) -> Result<Option<Invoice>, AppError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(ref number) = changes.invoice_number {
            if inner
                .invoices
                .iter()
                .any(|inv| inv.id != id && inv.invoice_number == *number)
            {
                return Err(AppError::DuplicateKey(anyhow::anyhow!(
                    "Invoice number already exists"
                )));
            }
        }

        let Some(invoice) = inner.invoices.iter_mut().find(|inv| inv.id == id) else {
            return Ok(None);
        };

        if let Some(ref number) = changes.invoice_number {
            invoice.invoice_number = number.clone();
        }
        if let Some(ref name) = changes.customer_name {
            invoice.customer_name = name.clone();
        }
        if let Some(amount) = changes.amount {
            invoice.amount = amount;
        }
        if let Some(date) = changes.invoice_date {
            invoice.invoice_date = date;
        }
        if let Some(status) = changes.status {
            invoice.status = status.as_str().to_string();
        }

        Ok(Some(invoice.clone()))
    }

    async fn delete_invoice(&self, id: i64) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.invoices.len();
        inner.invoices.retain(|inv| inv.id != id);
        Ok(inner.invoices.len() < before)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn count_users(&self) -> Result<i64, AppError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.len() as i64)
    }

    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
    ) -> Result<User, AppError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.iter().any(|u| u.email == email) {
            return Err(AppError::DuplicateKey(anyhow::anyhow!(
                "Email already in use"
            )));
        }

        inner.next_user_id += 1;
        let user = User {
            id: inner.next_user_id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            name: name.map(|n| n.to_string()),
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }
}

pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        common: service_core::config::Config { port: 3000 },
        environment: Environment::Dev,
        service_name: "invoice-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_minutes: 15,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        bootstrap: BootstrapConfig {
            admin_email: None,
            admin_password: None,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub jwt: JwtService,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn spawn() -> Self {
        let config = test_config();
        let store = Arc::new(MemoryStore::default());
        let jwt = JwtService::new(&config.jwt).expect("Failed to create JWT service");

        let state = AppState {
            config,
            store: store.clone(),
            users: store.clone(),
            jwt: jwt.clone(),
        };

        let router = build_router(state).expect("Failed to build router");

        Self { router, jwt, store }
    }

    /// Spawn with a seeded user account for login tests.
    pub async fn spawn_with_user(email: &str, password: &str) -> Self {
        let app = Self::spawn();
        let hash = hash_password(&Password::new(password.to_string())).expect("hash");
        app.store
            .create_user(email, hash.as_str(), Some("Test User"))
            .await
            .expect("seed user");
        app
    }

    /// A valid bearer token for the invoice routes.
    pub fn token(&self) -> String {
        self.jwt
            .generate_access_token("1", "admin@example.com")
            .expect("Failed to generate token")
    }
}

/// Build a request; `token` adds the Authorization header and `body` is sent
/// as JSON.
pub fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("Failed to build request"),
        None => builder.body(Body::empty()).expect("Failed to build request"),
    }
}

/// Fire a request at the router and decode the JSON response body.
pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(req)
        .await
        .expect("Failed to execute request");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();

    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}

/// Parse an amount out of a response body; Decimal serializes as a string.
pub fn amount(value: &serde_json::Value) -> Decimal {
    value
        .as_str()
        .expect("amount should be a string")
        .parse()
        .expect("amount should parse as a decimal")
}
