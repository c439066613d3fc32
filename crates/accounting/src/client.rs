//! Accounting client boundary.

use std::sync::Arc;

use thiserror::Error;

use orderbridge_core::TenantId;

use crate::filter::Filter;
use crate::model::{Account, Contact, Invoice, Payment};

/// Failure reported by (or while talking to) the accounting service.
///
/// Covers transport errors, validation rejections and auth failures alike;
/// `code` is the HTTP status where one exists, `0` otherwise.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message} (code {code})")]
pub struct RemoteError {
    pub message: String,
    pub code: i32,
}

impl RemoteError {
    pub fn new(message: impl Into<String>, code: i32) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Operations the sync pipeline needs from the accounting service.
///
/// All calls are blocking request/response. Save operations create the
/// entity when it has no remote id yet and update it otherwise; the returned
/// value carries remote-assigned fields (ids, computed totals).
pub trait AccountingClient: Send + Sync {
    /// Organisation the client is connected to.
    fn tenant_id(&self) -> TenantId;

    /// First contact matching `filter`, if any.
    fn find_contact(&self, filter: &Filter) -> RemoteResult<Option<Contact>>;

    fn save_contact(&self, contact: &Contact) -> RemoteResult<Contact>;

    fn save_invoice(&self, invoice: &Invoice) -> RemoteResult<Invoice>;

    /// First account matching `filter`, if any.
    fn find_account(&self, filter: &Filter) -> RemoteResult<Option<Account>>;

    fn save_payment(&self, payment: &Payment) -> RemoteResult<Payment>;
}

impl<C> AccountingClient for Arc<C>
where
    C: AccountingClient + ?Sized,
{
    fn tenant_id(&self) -> TenantId {
        (**self).tenant_id()
    }

    fn find_contact(&self, filter: &Filter) -> RemoteResult<Option<Contact>> {
        (**self).find_contact(filter)
    }

    fn save_contact(&self, contact: &Contact) -> RemoteResult<Contact> {
        (**self).save_contact(contact)
    }

    fn save_invoice(&self, invoice: &Invoice) -> RemoteResult<Invoice> {
        (**self).save_invoice(invoice)
    }

    fn find_account(&self, filter: &Filter) -> RemoteResult<Option<Account>> {
        (**self).find_account(filter)
    }

    fn save_payment(&self, payment: &Payment) -> RemoteResult<Payment> {
        (**self).save_payment(payment)
    }
}

/// Tenant-scoped cache key: `"{key}-{tenant}"`.
pub fn cache_key(tenant_id: TenantId, key: &str) -> String {
    format!("{key}-{tenant_id}")
}
