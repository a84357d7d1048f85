pub mod invoice;
pub mod user;

pub use invoice::{
    CollectionStats, Invoice, InvoiceChanges, InvoiceStatus, ListInvoicesFilter, NewInvoice,
};
pub use user::{SanitizedUser, User};
