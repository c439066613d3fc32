//! Sync pipeline errors.

use core::fmt;

use thiserror::Error;

use orderbridge_accounting::{InvoiceId, RemoteError};
use orderbridge_commerce::OrderId;
use orderbridge_core::DomainError;
use orderbridge_infra::LinkStoreError;

/// Pipeline stage a failure was observed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Contact,
    Invoice,
    Link,
    Account,
    Payment,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Contact => "contact",
            Stage::Invoice => "invoice",
            Stage::Link => "link",
            Stage::Account => "account",
            Stage::Payment => "payment",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// The accounting service rejected or failed a call.
    #[error("{stage} stage failed: {source}")]
    Remote {
        stage: Stage,
        #[source]
        source: RemoteError,
    },

    /// No remote account carries the configured code.
    #[error("no account with code `{code}`")]
    AccountNotFound { code: String },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    LinkStore(#[from] LinkStoreError),

    /// The order already has an invoice; nothing was submitted.
    #[error("order {order_id} is already invoiced as {invoice_id}")]
    AlreadyInvoiced {
        order_id: OrderId,
        invoice_id: InvoiceId,
    },

    /// Another sync of the same order is running in this process.
    #[error("order {0} is already being synced")]
    InProgress(OrderId),
}

impl SyncError {
    pub fn remote(stage: Stage, source: RemoteError) -> Self {
        Self::Remote { stage, source }
    }

    /// Stage the error belongs to, where one applies.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            SyncError::Remote { stage, .. } => Some(*stage),
            SyncError::AccountNotFound { .. } => Some(Stage::Account),
            SyncError::LinkStore(_) => Some(Stage::Link),
            SyncError::Domain(_) | SyncError::AlreadyInvoiced { .. } | SyncError::InProgress(_) => None,
        }
    }

    /// Remote error code, for remote failures.
    pub fn remote_code(&self) -> Option<i32> {
        match self {
            SyncError::Remote { source, .. } => Some(source.code),
            _ => None,
        }
    }
}
