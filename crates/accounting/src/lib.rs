//! Accounting service boundary.
//!
//! Remote entities (contacts, invoices, accounts, payments), the
//! [`AccountingClient`] trait the sync pipeline talks to, `where`-style query
//! filters, and two client implementations: an in-memory service for tests
//! and dry runs, and a blocking HTTP client for a Xero-style REST API.

pub mod client;
pub mod filter;
pub mod http;
pub mod in_memory;
pub mod model;
pub mod wire_date;

pub use client::{AccountingClient, RemoteError, RemoteResult, cache_key};
pub use filter::Filter;
pub use http::{HttpAccountingClient, HttpClientConfig};
pub use in_memory::{InMemoryAccounting, Operation};
pub use model::{
    Account, AccountId, Contact, ContactId, Invoice, InvoiceId, InvoiceStatus, InvoiceType,
    LineAmountType, LineItem, Payment, PaymentId,
};
