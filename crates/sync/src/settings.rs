//! Sync configuration.
//!
//! Settings are passed explicitly into every pipeline component at
//! construction; nothing reads global state at sync time.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use orderbridge_core::{DEFAULT_DECIMAL_PLACES, DomainError};

/// Ledger role an account code is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountRole {
    Sales,
    Shipping,
    Discount,
    AdditionalFees,
    Rounding,
    AccountsReceivable,
}

impl AccountRole {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountRole::Sales => "sales",
            AccountRole::Shipping => "shipping",
            AccountRole::Discount => "discount",
            AccountRole::AdditionalFees => "additional_fees",
            AccountRole::Rounding => "rounding",
            AccountRole::AccountsReceivable => "accounts_receivable",
        }
    }
}

impl core::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account code per ledger role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCodes {
    pub sales: String,
    pub shipping: String,
    pub discount: String,
    pub additional_fees: String,
    pub rounding: String,
    /// Account payments are recorded against.
    pub accounts_receivable: String,
}

impl AccountCodes {
    pub fn code(&self, role: AccountRole) -> &str {
        match role {
            AccountRole::Sales => &self.sales,
            AccountRole::Shipping => &self.shipping,
            AccountRole::Discount => &self.discount,
            AccountRole::AdditionalFees => &self.additional_fees,
            AccountRole::Rounding => &self.rounding,
            AccountRole::AccountsReceivable => &self.accounts_receivable,
        }
    }
}

/// How an order's purchaser is matched to an existing remote contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactMatch {
    /// `Name == display name OR EmailAddress == display name`.
    ///
    /// Both fields are compared against the display name. Kept as the
    /// default so existing contact books resolve exactly as before.
    #[default]
    LegacyDisplayName,
    /// `Name == display name`.
    Name,
    /// `EmailAddress == email`.
    Email,
    /// `Name == display name OR EmailAddress == email`.
    NameOrEmail,
}

impl FromStr for ContactMatch {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" | "legacy_display_name" => Ok(Self::LegacyDisplayName),
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "name_or_email" => Ok(Self::NameOrEmail),
            other => Err(DomainError::configuration(format!(
                "unknown contact match strategy `{other}` (expected legacy_display_name, name, email or name_or_email)"
            ))),
        }
    }
}

/// When a rounding line is added after the first invoice save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// Only when the remote total exceeds the order total (negative line).
    #[default]
    OvershootOnly,
    /// Whenever the totals differ, in either direction.
    Symmetric,
}

impl FromStr for RoundingPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overshoot_only" => Ok(Self::OvershootOnly),
            "symmetric" => Ok(Self::Symmetric),
            other => Err(DomainError::configuration(format!(
                "unknown rounding policy `{other}` (expected overshoot_only or symmetric)"
            ))),
        }
    }
}

/// Everything the pipeline needs to know about the connected ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub account_codes: AccountCodes,
    /// Record a payment for orders that are already paid.
    pub create_payments: bool,
    /// Send SKUs as item codes so the ledger tracks inventory.
    pub update_inventory: bool,
    pub decimal_places: u32,
    pub contact_match: ContactMatch,
    pub rounding_policy: RoundingPolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            account_codes: AccountCodes::default(),
            create_payments: false,
            update_inventory: false,
            decimal_places: DEFAULT_DECIMAL_PLACES,
            contact_match: ContactMatch::default(),
            rounding_policy: RoundingPolicy::default(),
        }
    }
}

impl SyncSettings {
    pub fn with_account_codes(mut self, codes: AccountCodes) -> Self {
        self.account_codes = codes;
        self
    }

    pub fn with_create_payments(mut self, enabled: bool) -> Self {
        self.create_payments = enabled;
        self
    }

    pub fn with_update_inventory(mut self, enabled: bool) -> Self {
        self.update_inventory = enabled;
        self
    }

    pub fn with_decimal_places(mut self, places: u32) -> Self {
        self.decimal_places = places;
        self
    }

    pub fn with_contact_match(mut self, strategy: ContactMatch) -> Self {
        self.contact_match = strategy;
        self
    }

    pub fn with_rounding_policy(mut self, policy: RoundingPolicy) -> Self {
        self.rounding_policy = policy;
        self
    }

    pub fn account_code(&self, role: AccountRole) -> &str {
        self.account_codes.code(role)
    }

    /// Check that every account code the enabled features need is present.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut required = vec![
            AccountRole::Sales,
            AccountRole::Shipping,
            AccountRole::Discount,
            AccountRole::AdditionalFees,
            AccountRole::Rounding,
        ];
        if self.create_payments {
            required.push(AccountRole::AccountsReceivable);
        }

        let missing: Vec<&str> = required
            .into_iter()
            .filter(|role| self.account_code(*role).trim().is_empty())
            .map(AccountRole::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(DomainError::configuration(format!(
                "missing account codes: {}",
                missing.join(", ")
            )));
        }

        if self.decimal_places > 28 {
            return Err(DomainError::configuration(format!(
                "decimal_places must be at most 28, got {}",
                self.decimal_places
            )));
        }
        Ok(())
    }

    /// Load settings from `ORDERBRIDGE_*` environment variables.
    ///
    /// Unset variables keep their defaults; call [`validate`](Self::validate)
    /// before use.
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        let codes = &mut settings.account_codes;
        for (key, slot) in [
            ("ORDERBRIDGE_ACCOUNT_SALES", &mut codes.sales),
            ("ORDERBRIDGE_ACCOUNT_SHIPPING", &mut codes.shipping),
            ("ORDERBRIDGE_ACCOUNT_DISCOUNT", &mut codes.discount),
            ("ORDERBRIDGE_ACCOUNT_ADDITIONAL_FEES", &mut codes.additional_fees),
            ("ORDERBRIDGE_ACCOUNT_ROUNDING", &mut codes.rounding),
            ("ORDERBRIDGE_ACCOUNT_RECEIVABLE", &mut codes.accounts_receivable),
        ] {
            if let Some(value) = lookup(key) {
                *slot = value.trim().to_string();
            }
        }

        if let Some(v) = lookup("ORDERBRIDGE_CREATE_PAYMENTS") {
            settings.create_payments = parse_flag("ORDERBRIDGE_CREATE_PAYMENTS", &v)?;
        }
        if let Some(v) = lookup("ORDERBRIDGE_UPDATE_INVENTORY") {
            settings.update_inventory = parse_flag("ORDERBRIDGE_UPDATE_INVENTORY", &v)?;
        }
        if let Some(v) = lookup("ORDERBRIDGE_DECIMAL_PLACES") {
            settings.decimal_places = v.trim().parse::<u32>().map_err(|e| {
                DomainError::configuration(format!("ORDERBRIDGE_DECIMAL_PLACES: {e}"))
            })?;
        }
        if let Some(v) = lookup("ORDERBRIDGE_CONTACT_MATCH") {
            settings.contact_match = v.parse()?;
        }
        if let Some(v) = lookup("ORDERBRIDGE_ROUNDING_POLICY") {
            settings.rounding_policy = v.parse()?;
        }

        Ok(settings)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, DomainError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(DomainError::configuration(format!(
            "{key}: expected a boolean, got `{other}`"
        ))),
    }
}
