//! Order → invoice translation.
//!
//! Pure: builds the invoice draft from an order and decides whether a
//! rounding line is needed once the remote service has computed its total.
//! Submission lives in [`crate::submitter`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use orderbridge_accounting::{
    Contact, Invoice, InvoiceStatus, InvoiceType, LineAmountType, LineItem,
};
use orderbridge_commerce::{AdjustmentKind, Order, OrderAdjustment, OrderLineItem};
use orderbridge_core::{DomainError, normalize};

use crate::settings::{AccountRole, RoundingPolicy, SyncSettings};

#[derive(Debug, Clone)]
pub struct InvoiceBuilder {
    settings: Arc<SyncSettings>,
}

impl InvoiceBuilder {
    pub fn new(settings: Arc<SyncSettings>) -> Self {
        Self { settings }
    }

    fn money(&self, value: Decimal) -> Decimal {
        normalize(value, self.settings.decimal_places)
    }

    fn code(&self, role: AccountRole) -> &str {
        self.settings.account_code(role)
    }

    /// Sales line for one purchased item.
    pub fn product_line(&self, item: &OrderLineItem) -> Result<LineItem, DomainError> {
        let unit_amount = if item.is_on_sale() {
            self.money(item.sale_price)
        } else {
            self.money(item.price)
        };

        let mut line = LineItem::new(
            self.code(AccountRole::Sales),
            item.description.clone(),
            Decimal::from(item.quantity),
            unit_amount,
        );

        if item.has_discount() {
            if item.subtotal.is_zero() {
                return Err(DomainError::validation(format!(
                    "line `{}` has a discount of {} but a zero subtotal",
                    item.description, item.discount
                )));
            }
            let rate = -Decimal::ONE_HUNDRED * item.discount / item.subtotal;
            line = line.with_discount_rate(self.money(rate));
        }

        if self.settings.update_inventory {
            if let Some(sku) = item.sku.as_deref() {
                line = line.with_item_code(sku);
            }
        }

        Ok(line)
    }

    /// Line for an order-level adjustment; tax adjustments produce none.
    pub fn adjustment_line(&self, order: &Order, adjustment: &OrderAdjustment) -> Option<LineItem> {
        let (role, amount) = match adjustment.kind {
            // The order's shipping total, not the individual adjuster amount.
            AdjustmentKind::Shipping => (AccountRole::Shipping, order.total_shipping_cost),
            AdjustmentKind::Discount => (AccountRole::Discount, adjustment.amount),
            AdjustmentKind::Tax => return None,
            AdjustmentKind::Other => (AccountRole::AdditionalFees, adjustment.amount),
        };
        Some(LineItem::new(
            self.code(role),
            adjustment.name.clone(),
            Decimal::ONE,
            self.money(amount),
        ))
    }

    /// Authorised, tax-exclusive receivable invoice for `order`.
    pub fn build(
        &self,
        contact: &Contact,
        order: &Order,
        due_date: DateTime<Utc>,
    ) -> Result<Invoice, DomainError> {
        let mut invoice = Invoice {
            id: None,
            invoice_type: InvoiceType::AccountsReceivable,
            status: InvoiceStatus::Authorised,
            contact: contact.clone(),
            line_amount_type: LineAmountType::Exclusive,
            currency_code: order.payment_currency.clone(),
            invoice_number: order.reference.clone(),
            sent_to_contact: true,
            due_date,
            line_items: Vec::with_capacity(order.line_items.len() + order.adjustments.len()),
            total: None,
        };

        for item in &order.line_items {
            invoice.add_line_item(self.product_line(item)?);
        }
        for adjustment in &order.adjustments {
            if let Some(line) = self.adjustment_line(order, adjustment) {
                invoice.add_line_item(line);
            }
        }
        Ok(invoice)
    }

    /// Order total at the configured precision.
    pub fn order_total(&self, order: &Order) -> Decimal {
        self.money(order.total_price)
    }

    /// Correction line bringing `invoice_total` back to the order total,
    /// when the rounding policy calls for one.
    pub fn rounding_line(&self, order: &Order, invoice_total: Decimal) -> Option<LineItem> {
        let order_total = self.order_total(order);
        let needed = match self.settings.rounding_policy {
            RoundingPolicy::OvershootOnly => invoice_total > order_total,
            RoundingPolicy::Symmetric => invoice_total != order_total,
        };
        if !needed {
            return None;
        }

        Some(LineItem::new(
            self.code(AccountRole::Rounding),
            format!("Rounding adjustment: Order Total: ${order_total}"),
            Decimal::ONE,
            self.money(order_total - invoice_total),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderbridge_commerce::{OrderId, Purchaser};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use crate::settings::AccountCodes;

    fn test_settings() -> SyncSettings {
        SyncSettings::default().with_account_codes(AccountCodes {
            sales: "200".to_string(),
            shipping: "210".to_string(),
            discount: "220".to_string(),
            additional_fees: "230".to_string(),
            rounding: "860".to_string(),
            accounts_receivable: "090".to_string(),
        })
    }

    fn test_builder() -> InvoiceBuilder {
        InvoiceBuilder::new(Arc::new(test_settings()))
    }

    fn test_order() -> Order {
        Order::new(
            OrderId::new(42),
            "ORD-42",
            Purchaser::new("Jane Doe", "jane@example.com"),
            "NZD",
        )
    }

    fn test_contact() -> Contact {
        Contact::new("Jane Doe")
    }

    #[test]
    fn product_line_without_discount_has_no_rate() {
        let line = test_builder()
            .product_line(&OrderLineItem::new("Mug", 2, dec!(10)))
            .unwrap();
        assert_eq!(line.account_code, "200");
        assert_eq!(line.description, "Mug");
        assert_eq!(line.quantity, dec!(2));
        assert_eq!(line.unit_amount, dec!(10.00));
        assert_eq!(line.discount_rate, None);
        assert_eq!(line.item_code, None);
    }

    #[test]
    fn product_line_prefers_sale_price() {
        let line = test_builder()
            .product_line(&OrderLineItem::new("Mug", 1, dec!(10)).with_sale_price(dec!(7.499)))
            .unwrap();
        assert_eq!(line.unit_amount, dec!(7.50));
    }

    #[test]
    fn product_line_discount_rate_is_scaled_by_subtotal() {
        let item = OrderLineItem::new("Mug", 2, dec!(10)).with_discount(dec!(5));
        let line = test_builder().product_line(&item).unwrap();
        assert_eq!(line.discount_rate, Some(dec!(-25.00)));
    }

    #[test]
    fn discount_on_zero_subtotal_is_rejected() {
        let item = OrderLineItem::new("Freebie", 1, dec!(0)).with_discount(dec!(1));
        let err = test_builder().product_line(&item).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn item_code_only_sent_when_tracking_inventory() {
        let item = OrderLineItem::new("Mug", 1, dec!(10)).with_sku("MUG-01");
        assert_eq!(test_builder().product_line(&item).unwrap().item_code, None);

        let tracking = InvoiceBuilder::new(Arc::new(test_settings().with_update_inventory(true)));
        assert_eq!(
            tracking.product_line(&item).unwrap().item_code.as_deref(),
            Some("MUG-01")
        );
    }

    #[test]
    fn shipping_line_uses_order_shipping_total() {
        let order = test_order()
            .with_adjustment(OrderAdjustment::new(AdjustmentKind::Shipping, "Courier", dec!(3)))
            .with_adjustment(OrderAdjustment::new(AdjustmentKind::Shipping, "Rural", dec!(2)));
        let line = test_builder()
            .adjustment_line(&order, &order.adjustments[0])
            .unwrap();
        assert_eq!(line.account_code, "210");
        assert_eq!(line.description, "Courier");
        assert_eq!(line.quantity, Decimal::ONE);
        assert_eq!(line.unit_amount, dec!(5.00));
    }

    #[test]
    fn adjustment_kinds_map_to_their_accounts() {
        let order = test_order();
        let builder = test_builder();

        let discount = OrderAdjustment::new(AdjustmentKind::Discount, "Coupon", dec!(-4.005));
        let line = builder.adjustment_line(&order, &discount).unwrap();
        assert_eq!(line.account_code, "220");
        assert_eq!(line.unit_amount, dec!(-4.01));

        let fee = OrderAdjustment::new(AdjustmentKind::Other, "Gift wrap", dec!(2.5));
        let line = builder.adjustment_line(&order, &fee).unwrap();
        assert_eq!(line.account_code, "230");
        assert_eq!(line.unit_amount, dec!(2.50));

        let tax = OrderAdjustment::new(AdjustmentKind::Tax, "GST", dec!(4.5));
        assert!(builder.adjustment_line(&order, &tax).is_none());
    }

    #[test]
    fn build_sets_invoice_header_from_order() {
        let order = test_order()
            .with_line_item(OrderLineItem::new("Mug", 2, dec!(10)))
            .with_adjustment(OrderAdjustment::new(AdjustmentKind::Tax, "GST", dec!(3)))
            .with_adjustment(OrderAdjustment::new(AdjustmentKind::Shipping, "Courier", dec!(5)));
        let due = Utc::now();
        let invoice = test_builder().build(&test_contact(), &order, due).unwrap();

        assert_eq!(invoice.status, InvoiceStatus::Authorised);
        assert_eq!(invoice.invoice_type, InvoiceType::AccountsReceivable);
        assert_eq!(invoice.line_amount_type, LineAmountType::Exclusive);
        assert_eq!(invoice.currency_code, "NZD");
        assert_eq!(invoice.invoice_number, "ORD-42");
        assert!(invoice.sent_to_contact);
        assert_eq!(invoice.due_date, due);
        assert_eq!(invoice.contact.name, "Jane Doe");
        assert_eq!(invoice.id, None);

        let codes: Vec<&str> = invoice.line_items().iter().map(|l| l.account_code.as_str()).collect();
        assert_eq!(codes, vec!["200", "210"]);
    }

    #[test]
    fn overshoot_produces_negative_rounding_line() {
        let order = test_order().with_total_price(dec!(30));
        let line = test_builder().rounding_line(&order, dec!(30.02)).unwrap();
        assert_eq!(line.account_code, "860");
        assert_eq!(line.description, "Rounding adjustment: Order Total: $30.00");
        assert_eq!(line.quantity, Decimal::ONE);
        assert_eq!(line.unit_amount, dec!(-0.02));
    }

    #[test]
    fn matching_total_needs_no_rounding() {
        let order = test_order().with_total_price(dec!(30));
        assert!(test_builder().rounding_line(&order, dec!(30.00)).is_none());
    }

    #[test]
    fn undershoot_depends_on_policy() {
        let order = test_order().with_total_price(dec!(30));
        assert!(test_builder().rounding_line(&order, dec!(29.99)).is_none());

        let symmetric = InvoiceBuilder::new(Arc::new(
            test_settings().with_rounding_policy(RoundingPolicy::Symmetric),
        ));
        let line = symmetric.rounding_line(&order, dec!(29.99)).unwrap();
        assert_eq!(line.unit_amount, dec!(0.01));
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

        #[test]
        fn rounding_line_closes_the_gap(total_cents in 0i64..10_000_000, drift_cents in -500i64..500) {
            let order_total = Decimal::new(total_cents, 2);
            let remote_total = Decimal::new(total_cents + drift_cents, 2);
            let order = test_order().with_total_price(order_total);
            let symmetric = InvoiceBuilder::new(Arc::new(
                test_settings().with_rounding_policy(RoundingPolicy::Symmetric),
            ));

            match symmetric.rounding_line(&order, remote_total) {
                Some(line) => prop_assert_eq!(remote_total + line.unit_amount, order_total),
                None => prop_assert_eq!(remote_total, order_total),
            }
        }

        #[test]
        fn overshoot_only_never_adds_positive_lines(total_cents in 0i64..10_000_000, drift_cents in -500i64..500) {
            let order = test_order().with_total_price(Decimal::new(total_cents, 2));
            let remote_total = Decimal::new(total_cents + drift_cents, 2);
            if let Some(line) = test_builder().rounding_line(&order, remote_total) {
                prop_assert!(line.unit_amount < Decimal::ZERO);
            }
        }
    }
}
