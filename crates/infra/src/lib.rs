//! Infrastructure layer: local persistence for the sync pipeline.

pub mod link_store;

pub use link_store::{InMemoryLinkStore, InvoiceLink, LinkStore, LinkStoreError};

#[cfg(feature = "postgres")]
pub use link_store::postgres::PostgresLinkStore;
