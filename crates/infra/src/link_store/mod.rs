//! Order ↔ invoice link records.
//!
//! A link is written once, right after an order's invoice is first saved
//! remotely, and answers "has this order already been invoiced?" from then
//! on. Stores are insert-only: creating a second link for the same order is
//! rejected with [`LinkStoreError::Duplicate`], never upserted.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use orderbridge_accounting::InvoiceId;
use orderbridge_commerce::OrderId;

pub use in_memory::InMemoryLinkStore;

/// Local record mapping an order to its remote invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLink {
    pub order_id: OrderId,
    pub invoice_id: InvoiceId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum LinkStoreError {
    /// A link already exists for this order.
    #[error("order {0} already has an invoice link")]
    Duplicate(OrderId),

    /// Backend failure (connection, query, poisoned lock).
    #[error("link store failure: {0}")]
    Storage(String),
}

pub trait LinkStore: Send + Sync {
    fn find_by_order_id(&self, order_id: OrderId) -> Result<Option<InvoiceLink>, LinkStoreError>;

    /// Insert the link for `order_id`; fails if one already exists.
    fn create(&self, order_id: OrderId, invoice_id: InvoiceId) -> Result<InvoiceLink, LinkStoreError>;
}

impl<S> LinkStore for Arc<S>
where
    S: LinkStore + ?Sized,
{
    fn find_by_order_id(&self, order_id: OrderId) -> Result<Option<InvoiceLink>, LinkStoreError> {
        (**self).find_by_order_id(order_id)
    }

    fn create(&self, order_id: OrderId, invoice_id: InvoiceId) -> Result<InvoiceLink, LinkStoreError> {
        (**self).create(order_id, invoice_id)
    }
}
