use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Storefront order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl OrderId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// The customer who placed the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchaser {
    /// Full name, or the username when no name is on file.
    pub display_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
}

impl Purchaser {
    pub fn new(display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            first_name: None,
            last_name: None,
            email: email.into(),
        }
    }

    pub fn with_names(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }
}

/// Purchasable line on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub description: String,
    pub quantity: u32,
    pub price: Decimal,
    /// Zero when the item is not on sale.
    #[serde(default)]
    pub sale_price: Decimal,
    /// Per-item discount amount; zero when none applies.
    #[serde(default)]
    pub discount: Decimal,
    pub subtotal: Decimal,
    #[serde(default)]
    pub sku: Option<String>,
}

impl OrderLineItem {
    /// Line at full `price`; subtotal is `price * quantity`.
    pub fn new(description: impl Into<String>, quantity: u32, price: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            price,
            sale_price: Decimal::ZERO,
            discount: Decimal::ZERO,
            subtotal: price * Decimal::from(quantity),
            sku: None,
        }
    }

    /// Put the line on sale; subtotal follows the sale price.
    pub fn with_sale_price(mut self, sale_price: Decimal) -> Self {
        self.sale_price = sale_price;
        self.subtotal = sale_price * Decimal::from(self.quantity);
        self
    }

    pub fn with_discount(mut self, discount: Decimal) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn is_on_sale(&self) -> bool {
        self.sale_price > Decimal::ZERO
    }

    pub fn has_discount(&self) -> bool {
        self.discount > Decimal::ZERO
    }
}

/// Kind of order-level adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    Shipping,
    Discount,
    Tax,
    /// Any other adjuster (fees, surcharges, plugin-defined types).
    #[serde(other)]
    Other,
}

/// Order-level modifier to the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAdjustment {
    #[serde(rename = "type")]
    pub kind: AdjustmentKind,
    pub name: String,
    pub amount: Decimal,
}

impl OrderAdjustment {
    pub fn new(kind: AdjustmentKind, name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            kind,
            name: name.into(),
            amount,
        }
    }
}

/// Payment gateway transaction attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub reference: String,
}

/// Completed storefront order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-readable order reference; becomes the invoice number.
    pub reference: String,
    pub purchaser: Purchaser,
    #[serde(default)]
    pub line_items: Vec<OrderLineItem>,
    #[serde(default)]
    pub adjustments: Vec<OrderAdjustment>,
    pub total_price: Decimal,
    #[serde(default)]
    pub total_paid: Decimal,
    #[serde(default)]
    pub total_shipping_cost: Decimal,
    pub payment_currency: String,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub date_paid: Option<DateTime<Utc>>,
    /// Most recent gateway transaction, if any.
    #[serde(default)]
    pub last_transaction: Option<Transaction>,
}

impl Order {
    /// Unpaid order with no lines; totals start at zero.
    pub fn new(
        id: OrderId,
        reference: impl Into<String>,
        purchaser: Purchaser,
        payment_currency: impl Into<String>,
    ) -> Self {
        Self {
            id,
            reference: reference.into(),
            purchaser,
            line_items: Vec::new(),
            adjustments: Vec::new(),
            total_price: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            total_shipping_cost: Decimal::ZERO,
            payment_currency: payment_currency.into(),
            is_paid: false,
            date_paid: None,
            last_transaction: None,
        }
    }

    pub fn with_line_item(mut self, item: OrderLineItem) -> Self {
        self.line_items.push(item);
        self
    }

    /// Add an adjustment; shipping adjustments also accumulate into the
    /// order's total shipping cost.
    pub fn with_adjustment(mut self, adjustment: OrderAdjustment) -> Self {
        if adjustment.kind == AdjustmentKind::Shipping {
            self.total_shipping_cost += adjustment.amount;
        }
        self.adjustments.push(adjustment);
        self
    }

    pub fn with_total_price(mut self, total_price: Decimal) -> Self {
        self.total_price = total_price;
        self
    }

    /// Mark the order paid in full by the given transaction.
    pub fn paid(
        mut self,
        total_paid: Decimal,
        date_paid: DateTime<Utc>,
        transaction_reference: impl Into<String>,
    ) -> Self {
        self.is_paid = true;
        self.total_paid = total_paid;
        self.date_paid = Some(date_paid);
        self.last_transaction = Some(Transaction {
            reference: transaction_reference.into(),
        });
        self
    }

    /// Sum of line subtotals (before order-level adjustments).
    pub fn item_subtotal(&self) -> Decimal {
        self.line_items.iter().map(|item| item.subtotal).sum()
    }

    pub fn last_transaction_reference(&self) -> Option<&str> {
        self.last_transaction.as_ref().map(|t| t.reference.as_str())
    }
}
