//! In-memory accounting service.
//!
//! Behaves like the remote service for the operations the pipeline uses:
//! assigns ids on save, computes invoice totals (line amounts plus tax on
//! tax-exclusive invoices), and answers filter queries. Failures can be
//! injected per operation and every call is recorded.
//!
//! Intended for tests and dry runs.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rust_decimal::Decimal;

use orderbridge_core::{TenantId, normalize};

use crate::client::{AccountingClient, RemoteError, RemoteResult};
use crate::filter::Filter;
use crate::model::{
    Account, Contact, ContactId, Invoice, InvoiceId, LineAmountType, Payment, PaymentId,
};

/// Client operation, used for call recording and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FindContact,
    SaveContact,
    SaveInvoice,
    FindAccount,
    SavePayment,
}

#[derive(Debug, Default)]
struct State {
    contacts: Vec<Contact>,
    invoices: Vec<Invoice>,
    /// Every invoice as it was submitted, one entry per save call.
    invoice_saves: Vec<Invoice>,
    accounts: Vec<Account>,
    payments: Vec<Payment>,
    calls: Vec<Operation>,
    failures: HashMap<Operation, RemoteError>,
    /// Totals to report for the next invoice saves, overriding computation.
    queued_totals: VecDeque<Decimal>,
}

#[derive(Debug)]
pub struct InMemoryAccounting {
    tenant_id: TenantId,
    tax_rate: Decimal,
    /// Simulated round-trip time per operation, slept outside the state lock.
    latency: HashMap<Operation, Duration>,
    state: Mutex<State>,
}

impl Default for InMemoryAccounting {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAccounting {
    pub fn new() -> Self {
        Self {
            tenant_id: TenantId::new(),
            tax_rate: Decimal::ZERO,
            latency: HashMap::new(),
            state: Mutex::new(State::default()),
        }
    }

    /// Tax rate (fraction, e.g. `0.15`) added to tax-exclusive invoices.
    pub fn with_tax_rate(mut self, rate: Decimal) -> Self {
        self.tax_rate = rate;
        self
    }

    /// Make every call to `operation` take at least `delay`.
    pub fn with_latency(mut self, operation: Operation, delay: Duration) -> Self {
        self.latency.insert(operation, delay);
        self
    }

    pub fn with_account(self, account: Account) -> Self {
        self.lock().accounts.push(account);
        self
    }

    /// Seed an existing contact (an id is assigned if it has none).
    pub fn with_contact(self, mut contact: Contact) -> Self {
        contact.id.get_or_insert_with(ContactId::new);
        self.lock().contacts.push(contact);
        self
    }

    /// Make every subsequent call to `operation` fail with `error`.
    pub fn fail_on(&self, operation: Operation, error: RemoteError) {
        self.lock().failures.insert(operation, error);
    }

    pub fn clear_failure(&self, operation: Operation) {
        self.lock().failures.remove(&operation);
    }

    /// Report `total` for the next invoice save instead of computing it.
    pub fn queue_invoice_total(&self, total: Decimal) {
        self.lock().queued_totals.push_back(total);
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.lock().contacts.clone()
    }

    pub fn invoices(&self) -> Vec<Invoice> {
        self.lock().invoices.clone()
    }

    pub fn invoice_saves(&self) -> Vec<Invoice> {
        self.lock().invoice_saves.clone()
    }

    pub fn payments(&self) -> Vec<Payment> {
        self.lock().payments.clone()
    }

    pub fn calls(&self) -> Vec<Operation> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, operation: Operation) -> usize {
        self.lock().calls.iter().filter(|c| **c == operation).count()
    }

    // Test-facing accessors tolerate poisoning; client calls report it.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin(&self, operation: Operation) -> RemoteResult<MutexGuard<'_, State>> {
        if let Some(delay) = self.latency.get(&operation) {
            std::thread::sleep(*delay);
        }
        let mut state = self
            .state
            .lock()
            .map_err(|_| RemoteError::new("in-memory accounting state poisoned", 500))?;
        state.calls.push(operation);
        if let Some(err) = state.failures.get(&operation) {
            return Err(err.clone());
        }
        Ok(state)
    }

    fn compute_total(&self, invoice: &Invoice) -> Decimal {
        let lines = invoice.line_total();
        let tax = match invoice.line_amount_type {
            LineAmountType::Exclusive => normalize(lines * self.tax_rate, 2),
            LineAmountType::Inclusive | LineAmountType::NoTax => Decimal::ZERO,
        };
        normalize(lines + tax, 2)
    }
}

fn contact_field<'a>(contact: &'a Contact, field: &str) -> Option<&'a str> {
    match field {
        "Name" => Some(contact.name.as_str()),
        "FirstName" => contact.first_name.as_deref(),
        "LastName" => contact.last_name.as_deref(),
        "EmailAddress" => contact.email_address.as_deref(),
        _ => None,
    }
}

fn account_field<'a>(account: &'a Account, field: &str) -> Option<&'a str> {
    match field {
        "Code" => Some(account.code.as_str()),
        "Name" => Some(account.name.as_str()),
        _ => None,
    }
}

impl AccountingClient for InMemoryAccounting {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn find_contact(&self, filter: &Filter) -> RemoteResult<Option<Contact>> {
        let state = self.begin(Operation::FindContact)?;
        Ok(state
            .contacts
            .iter()
            .find(|c| filter.matches(&|field: &str| contact_field(c, field)))
            .cloned())
    }

    fn save_contact(&self, contact: &Contact) -> RemoteResult<Contact> {
        let mut state = self.begin(Operation::SaveContact)?;
        let mut saved = contact.clone();
        match saved.id {
            Some(id) => {
                let existing = state
                    .contacts
                    .iter_mut()
                    .find(|c| c.id == Some(id))
                    .ok_or_else(|| RemoteError::new(format!("contact {id} not found"), 404))?;
                *existing = saved.clone();
            }
            None => {
                saved.id = Some(ContactId::new());
                state.contacts.push(saved.clone());
            }
        }
        Ok(saved)
    }

    fn save_invoice(&self, invoice: &Invoice) -> RemoteResult<Invoice> {
        let mut state = self.begin(Operation::SaveInvoice)?;
        state.invoice_saves.push(invoice.clone());

        let mut saved = invoice.clone();
        saved.total = Some(match state.queued_totals.pop_front() {
            Some(total) => total,
            None => self.compute_total(invoice),
        });

        match saved.id {
            Some(id) => {
                let existing = state
                    .invoices
                    .iter_mut()
                    .find(|i| i.id == Some(id))
                    .ok_or_else(|| RemoteError::new(format!("invoice {id} not found"), 404))?;
                *existing = saved.clone();
            }
            None => {
                saved.id = Some(InvoiceId::new());
                state.invoices.push(saved.clone());
            }
        }
        Ok(saved)
    }

    fn find_account(&self, filter: &Filter) -> RemoteResult<Option<Account>> {
        let state = self.begin(Operation::FindAccount)?;
        Ok(state
            .accounts
            .iter()
            .find(|a| filter.matches(&|field: &str| account_field(a, field)))
            .cloned())
    }

    fn save_payment(&self, payment: &Payment) -> RemoteResult<Payment> {
        let mut state = self.begin(Operation::SavePayment)?;
        if !state.invoices.iter().any(|i| i.id == Some(payment.invoice_id)) {
            return Err(RemoteError::new(
                format!("invoice {} not found", payment.invoice_id),
                404,
            ));
        }
        if !state.accounts.iter().any(|a| a.id == payment.account_id) {
            return Err(RemoteError::new(
                format!("account {} not found", payment.account_id),
                400,
            ));
        }
        let mut saved = payment.clone();
        saved.id = Some(PaymentId::new());
        state.payments.push(saved.clone());
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InvoiceStatus, InvoiceType, LineItem};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn test_invoice(lines: Vec<LineItem>) -> Invoice {
        Invoice {
            id: None,
            invoice_type: InvoiceType::AccountsReceivable,
            status: InvoiceStatus::Authorised,
            contact: Contact::new("Jane Doe"),
            line_amount_type: LineAmountType::Exclusive,
            currency_code: "NZD".to_string(),
            invoice_number: "ABC123".to_string(),
            sent_to_contact: true,
            due_date: Utc::now(),
            line_items: lines,
            total: None,
        }
    }

    #[test]
    fn save_invoice_assigns_id_and_computes_total_with_tax() {
        let service = InMemoryAccounting::new().with_tax_rate(dec!(0.15));
        let invoice = test_invoice(vec![
            LineItem::new("200", "Mug", dec!(2), dec!(10)),
            LineItem::new("200", "Cup", dec!(1), dec!(5)),
        ]);

        let saved = service.save_invoice(&invoice).unwrap();
        assert!(saved.id.is_some());
        assert_eq!(saved.total, Some(dec!(28.75)));
        assert_eq!(service.invoices().len(), 1);
    }

    #[test]
    fn resaving_updates_in_place() {
        let service = InMemoryAccounting::new();
        let mut saved = service
            .save_invoice(&test_invoice(vec![LineItem::new("200", "Mug", dec!(1), dec!(10))]))
            .unwrap();
        saved.add_line_item(LineItem::new("860", "Rounding", dec!(1), dec!(-0.01)));

        let resaved = service.save_invoice(&saved).unwrap();
        assert_eq!(resaved.id, saved.id);
        assert_eq!(resaved.total, Some(dec!(9.99)));
        assert_eq!(service.invoices().len(), 1);
        assert_eq!(service.invoice_saves().len(), 2);
    }

    #[test]
    fn queued_totals_override_computation_in_order() {
        let service = InMemoryAccounting::new();
        service.queue_invoice_total(dec!(30.02));
        let invoice = test_invoice(vec![LineItem::new("200", "Mug", dec!(1), dec!(30))]);

        let first = service.save_invoice(&invoice).unwrap();
        assert_eq!(first.total, Some(dec!(30.02)));
        let second = service.save_invoice(&first).unwrap();
        assert_eq!(second.total, Some(dec!(30.00)));
    }

    #[test]
    fn injected_failures_are_returned_and_calls_recorded() {
        let service = InMemoryAccounting::new();
        service.fail_on(Operation::FindContact, RemoteError::new("unauthorised", 401));

        let err = service.find_contact(&Filter::eq("Name", "Jane")).unwrap_err();
        assert_eq!(err.code, 401);
        assert_eq!(service.call_count(Operation::FindContact), 1);

        service.clear_failure(Operation::FindContact);
        assert_eq!(service.find_contact(&Filter::eq("Name", "Jane")).unwrap(), None);
    }

    #[test]
    fn find_contact_evaluates_filter() {
        let service = InMemoryAccounting::new()
            .with_contact(Contact::new("Jane Doe").with_email("jane@example.com"));

        let hit = service
            .find_contact(&Filter::eq("Name", "nobody").or(Filter::eq("EmailAddress", "jane@example.com")))
            .unwrap();
        assert_eq!(hit.map(|c| c.name), Some("Jane Doe".to_string()));
    }

    #[test]
    fn payment_requires_known_invoice() {
        let account = Account::new("090", "Bank");
        let service = InMemoryAccounting::new().with_account(account.clone());
        let payment = Payment {
            id: None,
            invoice_id: InvoiceId::new(),
            account_id: account.id,
            reference: None,
            amount: dec!(10),
            date: Utc::now(),
        };
        let err = service.save_payment(&payment).unwrap_err();
        assert_eq!(err.code, 404);
        assert!(service.payments().is_empty());
    }
}
