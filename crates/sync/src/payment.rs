//! Payment recording for paid orders.

use chrono::{DateTime, Utc};

use orderbridge_accounting::{Account, AccountingClient, Invoice, Payment, RemoteError};
use orderbridge_commerce::Order;
use orderbridge_core::normalize;

use crate::error::{Stage, SyncError};

#[derive(Debug, Clone)]
pub struct PaymentRecorder<C> {
    client: C,
    enabled: bool,
    decimal_places: u32,
}

impl<C> PaymentRecorder<C>
where
    C: AccountingClient,
{
    pub fn new(client: C, enabled: bool, decimal_places: u32) -> Self {
        Self {
            client,
            enabled,
            decimal_places,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Payment recording is enabled and the order is paid.
    pub fn should_record(&self, order: &Order) -> bool {
        self.enabled && order.is_paid
    }

    /// Payment for the order's paid amount, dated when it was paid
    /// (`fallback_date` when the order carries no paid date).
    pub fn payment_for(
        &self,
        order: &Order,
        invoice: &Invoice,
        account: &Account,
        fallback_date: DateTime<Utc>,
    ) -> Result<Payment, SyncError> {
        let invoice_id = invoice.id.ok_or_else(|| {
            SyncError::remote(
                Stage::Payment,
                RemoteError::new("cannot pay an invoice that has not been saved", 0),
            )
        })?;

        Ok(Payment {
            id: None,
            invoice_id,
            account_id: account.id,
            reference: order.last_transaction_reference().map(str::to_string),
            amount: normalize(order.total_paid, self.decimal_places),
            date: order.date_paid.unwrap_or(fallback_date),
        })
    }

    pub fn record(
        &self,
        order: &Order,
        invoice: &Invoice,
        account: &Account,
        fallback_date: DateTime<Utc>,
    ) -> Result<Payment, SyncError> {
        let payment = self.payment_for(order, invoice, account, fallback_date)?;
        let saved = self.client.save_payment(&payment).map_err(|err| {
            tracing::error!(
                message = %err.message,
                code = err.code,
                order_id = %order.id,
                invoice_id = %payment.invoice_id,
                "payment save failed"
            );
            SyncError::remote(Stage::Payment, err)
        })?;

        tracing::info!(
            order_id = %order.id,
            invoice_id = %saved.invoice_id,
            amount = %saved.amount,
            "payment recorded"
        );
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::TimeZone;
    use orderbridge_accounting::{
        Contact, InMemoryAccounting, InvoiceId, InvoiceStatus, InvoiceType, LineAmountType, Operation,
    };
    use orderbridge_commerce::{OrderId, Purchaser};
    use rust_decimal_macros::dec;

    fn test_order() -> Order {
        Order::new(OrderId::new(3), "ORD-3", Purchaser::new("Jane Doe", "jane@example.com"), "NZD")
            .with_total_price(dec!(30))
    }

    fn test_invoice(id: Option<InvoiceId>) -> Invoice {
        Invoice {
            id,
            invoice_type: InvoiceType::AccountsReceivable,
            status: InvoiceStatus::Authorised,
            contact: Contact::new("Jane Doe"),
            line_amount_type: LineAmountType::Exclusive,
            currency_code: "NZD".to_string(),
            invoice_number: "ORD-3".to_string(),
            sent_to_contact: true,
            due_date: Utc::now(),
            line_items: Vec::new(),
            total: None,
        }
    }

    #[test]
    fn only_records_paid_orders_when_enabled() {
        let client = Arc::new(InMemoryAccounting::new());
        let paid = test_order().paid(dec!(30), Utc::now(), "txn-1");

        assert!(PaymentRecorder::new(Arc::clone(&client), true, 2).should_record(&paid));
        assert!(!PaymentRecorder::new(Arc::clone(&client), false, 2).should_record(&paid));
        assert!(!PaymentRecorder::new(client, true, 2).should_record(&test_order()));
    }

    #[test]
    fn payment_carries_order_payment_details() {
        let recorder = PaymentRecorder::new(Arc::new(InMemoryAccounting::new()), true, 2);
        let paid_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let order = test_order().paid(dec!(29.995), paid_at, "txn-1");
        let account = Account::new("090", "Bank");
        let invoice_id = InvoiceId::new();

        let payment = recorder
            .payment_for(&order, &test_invoice(Some(invoice_id)), &account, Utc::now())
            .unwrap();

        assert_eq!(payment.invoice_id, invoice_id);
        assert_eq!(payment.account_id, account.id);
        assert_eq!(payment.reference.as_deref(), Some("txn-1"));
        assert_eq!(payment.amount, dec!(30.00));
        assert_eq!(payment.date, paid_at);
    }

    #[test]
    fn missing_paid_date_uses_fallback() {
        let recorder = PaymentRecorder::new(Arc::new(InMemoryAccounting::new()), true, 2);
        let mut order = test_order().paid(dec!(30), Utc::now(), "txn-1");
        order.date_paid = None;
        let fallback = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();

        let payment = recorder
            .payment_for(&order, &test_invoice(Some(InvoiceId::new())), &Account::new("090", "Bank"), fallback)
            .unwrap();
        assert_eq!(payment.date, fallback);
    }

    #[test]
    fn unsaved_invoice_cannot_be_paid() {
        let client = Arc::new(InMemoryAccounting::new());
        let recorder = PaymentRecorder::new(Arc::clone(&client), true, 2);
        let order = test_order().paid(dec!(30), Utc::now(), "txn-1");

        let err = recorder
            .record(&order, &test_invoice(None), &Account::new("090", "Bank"), Utc::now())
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Payment));
        assert_eq!(client.call_count(Operation::SavePayment), 0);
    }

    #[test]
    fn remote_rejection_is_a_payment_stage_error() {
        let client = Arc::new(InMemoryAccounting::new());
        let recorder = PaymentRecorder::new(Arc::clone(&client), true, 2);
        let order = test_order().paid(dec!(30), Utc::now(), "txn-1");

        // Unknown invoice: the service answers 404.
        let err = recorder
            .record(&order, &test_invoice(Some(InvoiceId::new())), &Account::new("090", "Bank"), Utc::now())
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Payment));
        assert_eq!(err.remote_code(), Some(404));
    }
}
