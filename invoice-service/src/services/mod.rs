pub mod database;
pub mod jwt;
pub mod metrics;
pub mod store;

pub use database::Database;
pub use jwt::{AccessTokenClaims, JwtService};
pub use store::{InvoiceStore, UserStore};
