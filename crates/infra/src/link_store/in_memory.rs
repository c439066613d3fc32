use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use orderbridge_accounting::InvoiceId;
use orderbridge_commerce::OrderId;

use super::{InvoiceLink, LinkStore, LinkStoreError};

/// In-memory link store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryLinkStore {
    inner: RwLock<HashMap<OrderId, InvoiceLink>>,
}

impl InMemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All links, ordered by order id.
    pub fn list(&self) -> Vec<InvoiceLink> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        let mut links: Vec<InvoiceLink> = map.values().cloned().collect();
        links.sort_by_key(|l| l.order_id);
        links
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LinkStore for InMemoryLinkStore {
    fn find_by_order_id(&self, order_id: OrderId) -> Result<Option<InvoiceLink>, LinkStoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| LinkStoreError::Storage("lock poisoned".to_string()))?;
        Ok(map.get(&order_id).cloned())
    }

    fn create(&self, order_id: OrderId, invoice_id: InvoiceId) -> Result<InvoiceLink, LinkStoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| LinkStoreError::Storage("lock poisoned".to_string()))?;

        if map.contains_key(&order_id) {
            return Err(LinkStoreError::Duplicate(order_id));
        }

        let link = InvoiceLink {
            order_id,
            invoice_id,
            created_at: Utc::now(),
        };
        map.insert(order_id, link.clone());
        Ok(link)
    }
}
