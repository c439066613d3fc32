//! Remote accounting entities.
//!
//! Field names serialize in the PascalCase shape the accounting API speaks.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderbridge_core::{normalize, uuid_newtype};

uuid_newtype! {
    /// Remote contact identifier.
    pub struct ContactId;
}

uuid_newtype! {
    /// Remote invoice identifier.
    pub struct InvoiceId;
}

uuid_newtype! {
    /// Remote ledger account identifier.
    pub struct AccountId;
}

uuid_newtype! {
    /// Remote payment identifier.
    pub struct PaymentId;
}

/// A payer known to the accounting service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Contact {
    /// Assigned by the remote service on first save.
    #[serde(rename = "ContactID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ContactId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
}

impl Contact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            first_name: None,
            last_name: None,
            email_address: None,
        }
    }

    pub fn with_first_name(mut self, first_name: Option<String>) -> Self {
        self.first_name = first_name;
        self
    }

    pub fn with_last_name(mut self, last_name: Option<String>) -> Self {
        self.last_name = last_name;
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email_address = Some(email.into());
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Submitted,
    Authorised,
    Paid,
    Voided,
}

/// Receivable (sales) or payable (bills) invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceType {
    #[serde(rename = "ACCREC")]
    AccountsReceivable,
    #[serde(rename = "ACCPAY")]
    AccountsPayable,
}

/// How line amounts relate to tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineAmountType {
    /// Amounts exclude tax; the service adds it.
    Exclusive,
    Inclusive,
    NoTax,
}

/// One billable row on an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LineItem {
    pub account_code: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_amount: Decimal,
    /// Percentage applied to `quantity * unit_amount`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub discount_rate: Option<Decimal>,
    /// Inventory item code; only sent when inventory tracking is on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_code: Option<String>,
}

impl LineItem {
    pub fn new(
        account_code: impl Into<String>,
        description: impl Into<String>,
        quantity: Decimal,
        unit_amount: Decimal,
    ) -> Self {
        Self {
            account_code: account_code.into(),
            description: description.into(),
            quantity,
            unit_amount,
            discount_rate: None,
            item_code: None,
        }
    }

    pub fn with_discount_rate(mut self, rate: Decimal) -> Self {
        self.discount_rate = Some(rate);
        self
    }

    pub fn with_item_code(mut self, code: impl Into<String>) -> Self {
        self.item_code = Some(code.into());
        self
    }

    /// Line amount after discount, rounded to cents.
    pub fn line_amount(&self) -> Decimal {
        let gross = self.quantity * self.unit_amount;
        let net = match self.discount_rate {
            Some(rate) => gross * (Decimal::ONE_HUNDRED - rate) / Decimal::ONE_HUNDRED,
            None => gross,
        };
        normalize(net, 2)
    }
}

/// Invoice document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Invoice {
    #[serde(rename = "InvoiceID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<InvoiceId>,
    #[serde(rename = "Type")]
    pub invoice_type: InvoiceType,
    pub status: InvoiceStatus,
    pub contact: Contact,
    #[serde(rename = "LineAmountTypes")]
    pub line_amount_type: LineAmountType,
    #[serde(default)]
    pub currency_code: String,
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default)]
    pub sent_to_contact: bool,
    #[serde(with = "crate::wire_date")]
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    /// Computed by the remote service on save.
    #[serde(
        default,
        skip_serializing,
        deserialize_with = "rust_decimal::serde::float_option::deserialize"
    )]
    pub total: Option<Decimal>,
}

impl Invoice {
    pub fn add_line_item(&mut self, item: LineItem) -> &mut Self {
        self.line_items.push(item);
        self
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Sum of line amounts, before any tax the service applies.
    pub fn line_total(&self) -> Decimal {
        self.line_items.iter().map(LineItem::line_amount).sum()
    }
}

/// Ledger account resolved by its configured code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Account {
    #[serde(rename = "AccountID")]
    pub id: AccountId,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
}

impl Account {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: AccountId::new(),
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Payment applied against an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Option<PaymentId>,
    pub invoice_id: InvoiceId,
    pub account_id: AccountId,
    pub reference: Option<String>,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn line_amount_applies_discount_rate() {
        let item = LineItem::new("200", "Mug", dec!(2), dec!(10)).with_discount_rate(dec!(10));
        assert_eq!(item.line_amount(), dec!(18.00));
    }

    #[test]
    fn line_amount_without_discount_is_quantity_times_unit() {
        let item = LineItem::new("200", "Mug", dec!(3), dec!(3.333));
        assert_eq!(item.line_amount(), dec!(10.00));
    }

    #[test]
    fn contact_serializes_in_remote_shape() {
        let contact = Contact::new("Jane Doe").with_email("jane@example.com");
        let json = serde_json::to_value(&contact).unwrap();
        assert_eq!(json["Name"], "Jane Doe");
        assert_eq!(json["EmailAddress"], "jane@example.com");
        assert!(json.get("ContactID").is_none());
        assert!(json.get("FirstName").is_none());
    }

    #[test]
    fn invoice_type_uses_remote_codes() {
        assert_eq!(
            serde_json::to_value(InvoiceType::AccountsReceivable).unwrap(),
            "ACCREC"
        );
        assert_eq!(
            serde_json::to_value(InvoiceStatus::Authorised).unwrap(),
            "AUTHORISED"
        );
    }
}
