//! End-to-end order sync.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::instrument;

use orderbridge_accounting::{Account, AccountingClient, Contact, Invoice, Payment};
use orderbridge_commerce::{Order, OrderId};
use orderbridge_core::DomainError;
use orderbridge_infra::{InvoiceLink, LinkStore};

use crate::accounts::AccountDirectory;
use crate::contact::ContactResolver;
use crate::error::SyncError;
use crate::invoice_builder::InvoiceBuilder;
use crate::payment::PaymentRecorder;
use crate::settings::{AccountRole, SyncSettings};
use crate::submitter::InvoiceSubmitter;

/// Why no payment was recorded for a synced order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotPaid,
    /// Payment recording is switched off in settings.
    Disabled,
}

/// Result of the payment sub-step.
///
/// A failed payment does not fail the sync: the invoice exists and is
/// linked either way.
#[derive(Debug)]
pub enum PaymentOutcome {
    Recorded(Payment),
    Skipped(SkipReason),
    Failed(SyncError),
}

impl PaymentOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, PaymentOutcome::Recorded(_))
    }

    pub fn payment(&self) -> Option<&Payment> {
        match self {
            PaymentOutcome::Recorded(payment) => Some(payment),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct SyncReport {
    pub order_id: OrderId,
    pub contact: Contact,
    pub invoice: Invoice,
    pub payment: PaymentOutcome,
}

/// Sequences contact → invoice → link → payment for one order at a time.
///
/// Runs for the same order are serialised inside the process: a second call
/// while one is in flight fails with [`SyncError::InProgress`], and a call
/// for an order that already has a link fails with
/// [`SyncError::AlreadyInvoiced`] before anything is sent.
pub struct OrderSync<C, L> {
    settings: Arc<SyncSettings>,
    links: L,
    contacts: ContactResolver<C>,
    builder: InvoiceBuilder,
    submitter: InvoiceSubmitter<C, L>,
    accounts: AccountDirectory<C>,
    payments: PaymentRecorder<C>,
    in_flight: Mutex<HashSet<OrderId>>,
}

impl<C, L> OrderSync<C, L>
where
    C: AccountingClient + Clone,
    L: LinkStore + Clone,
{
    pub fn new(client: C, links: L, settings: SyncSettings) -> Result<Self, DomainError> {
        settings.validate()?;
        let settings = Arc::new(settings);
        let builder = InvoiceBuilder::new(Arc::clone(&settings));

        Ok(Self {
            contacts: ContactResolver::new(client.clone(), settings.contact_match),
            submitter: InvoiceSubmitter::new(client.clone(), links.clone(), builder.clone()),
            accounts: AccountDirectory::new(client.clone()),
            payments: PaymentRecorder::new(client, settings.create_payments, settings.decimal_places),
            builder,
            links,
            settings,
            in_flight: Mutex::new(HashSet::new()),
        })
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn sync_order(&self, order: &Order) -> Result<SyncReport, SyncError> {
        self.sync_order_at(order, Utc::now())
    }

    /// Sync with an explicit submission time (invoice due date, and the
    /// payment date when the order has no paid date).
    #[instrument(skip_all, fields(order_id = %order.id, reference = %order.reference))]
    pub fn sync_order_at(&self, order: &Order, now: DateTime<Utc>) -> Result<SyncReport, SyncError> {
        let _claim = self.claim(order.id)?;

        if let Some(link) = self.links.find_by_order_id(order.id)? {
            tracing::warn!(invoice_id = %link.invoice_id, "order already invoiced; skipping");
            return Err(SyncError::AlreadyInvoiced {
                order_id: order.id,
                invoice_id: link.invoice_id,
            });
        }

        let contact = self.contacts.resolve(&order.purchaser)?;
        let draft = self.builder.build(&contact, order, now)?;
        let invoice = self.submitter.submit(order, &draft)?;
        let payment = self.record_payment(order, &invoice, now);

        tracing::info!(payment_recorded = payment.is_recorded(), "order synced");
        Ok(SyncReport {
            order_id: order.id,
            contact,
            invoice,
            payment,
        })
    }

    fn record_payment(&self, order: &Order, invoice: &Invoice, now: DateTime<Utc>) -> PaymentOutcome {
        if !self.payments.is_enabled() {
            return PaymentOutcome::Skipped(SkipReason::Disabled);
        }
        if !order.is_paid {
            tracing::info!("order not paid; no payment recorded");
            return PaymentOutcome::Skipped(SkipReason::NotPaid);
        }

        let recorded = self
            .account_by_code(self.settings.account_code(AccountRole::AccountsReceivable))
            .and_then(|account| self.payments.record(order, invoice, &account, now));
        match recorded {
            Ok(payment) => PaymentOutcome::Recorded(payment),
            Err(err) => {
                tracing::warn!(error = %err, "invoice synced but payment was not recorded");
                PaymentOutcome::Failed(err)
            }
        }
    }

    /// Whether the order already has an invoice link.
    pub fn is_order_invoiced(&self, order: &Order) -> Result<bool, SyncError> {
        Ok(self.invoice_link(order.id)?.is_some())
    }

    pub fn invoice_link(&self, order_id: OrderId) -> Result<Option<InvoiceLink>, SyncError> {
        Ok(self.links.find_by_order_id(order_id)?)
    }

    pub fn account_by_code(&self, code: &str) -> Result<Account, SyncError> {
        self.accounts.account_by_code(code)
    }

    fn claim(&self, order_id: OrderId) -> Result<InFlight<'_>, SyncError> {
        let mut in_flight = lock(&self.in_flight);
        if !in_flight.insert(order_id) {
            tracing::warn!("order sync already in progress");
            return Err(SyncError::InProgress(order_id));
        }
        Ok(InFlight {
            set: &self.in_flight,
            order_id,
        })
    }
}

// The set only holds ids, so a poisoned lock is still consistent.
fn lock(set: &Mutex<HashSet<OrderId>>) -> MutexGuard<'_, HashSet<OrderId>> {
    set.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Releases an order's in-flight claim on drop.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<OrderId>>,
    order_id: OrderId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.set).remove(&self.order_id);
    }
}
