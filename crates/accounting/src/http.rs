//! Blocking HTTP client for a Xero-style accounting API.
//!
//! Entities travel in plural envelopes (`{"Invoices": [...]}`), queries use a
//! `where` parameter rendered from [`Filter`], and every request carries a
//! bearer token plus the `xero-tenant-id` header. The access token is
//! supplied by the caller; obtaining or refreshing it is out of scope here.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::ACCEPT;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use orderbridge_core::{DomainError, TenantId};

use crate::client::{AccountingClient, RemoteError, RemoteResult};
use crate::filter::Filter;
use crate::model::{Account, AccountId, Contact, Invoice, InvoiceId, Payment, PaymentId};

const TENANT_HEADER: &str = "xero-tenant-id";

/// Connection settings for [`HttpAccountingClient`].
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// API root, e.g. `https://api.xero.com/api.xro/2.0`.
    pub base_url: String,
    pub access_token: String,
    pub tenant_id: TenantId,
    pub timeout: Duration,
}

impl HttpClientConfig {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>, tenant_id: TenantId) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: access_token.into(),
            tenant_id,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `ORDERBRIDGE_API_URL`, `ORDERBRIDGE_ACCESS_TOKEN` and
    /// `ORDERBRIDGE_TENANT_ID` from the process environment.
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| DomainError::configuration(format!("{key} must be set")))
        };

        let base_url = require("ORDERBRIDGE_API_URL")?;
        let access_token = require("ORDERBRIDGE_ACCESS_TOKEN")?;
        let tenant_id = require("ORDERBRIDGE_TENANT_ID")?
            .parse::<TenantId>()
            .map_err(|e| DomainError::configuration(format!("ORDERBRIDGE_TENANT_ID: {e}")))?;

        let mut config = Self::new(base_url, access_token, tenant_id);
        if let Some(secs) = lookup("ORDERBRIDGE_HTTP_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|e| {
                DomainError::configuration(format!("ORDERBRIDGE_HTTP_TIMEOUT_SECS: {e}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

pub struct HttpAccountingClient {
    config: HttpClientConfig,
    http: Client,
}

impl HttpAccountingClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, DomainError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("http client: {e}")))?;
        Ok(Self { config, http })
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), resource)
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        let response = request
            .bearer_auth(&self.config.access_token)
            .header(TENANT_HEADER, self.config.tenant_id.to_string())
            .header(ACCEPT, "application/json")
            .send()
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RemoteError::new(error_message(status, &body), i32::from(status.as_u16())));
        }

        response.json::<T>().map_err(|e| {
            RemoteError::new(format!("malformed response: {e}"), i32::from(status.as_u16()))
        })
    }

    fn query<T: DeserializeOwned>(&self, resource: &str, filter: &Filter) -> RemoteResult<T> {
        let where_clause = filter.to_string();
        debug!(resource, filter = %where_clause, "accounting query");
        self.send(self.http.get(self.url(resource)).query(&[("where", where_clause)]))
    }
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    let code = err.status().map(|s| i32::from(s.as_u16())).unwrap_or(0);
    RemoteError::new(err.to_string(), code)
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "Message", alias = "Detail")]
    message: String,
}

/// Prefer the service's own error message; fall back to the raw body or the
/// status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        return parsed.message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        trimmed.to_string()
    }
}

fn first<T>(items: Vec<T>, resource: &str) -> RemoteResult<T> {
    items
        .into_iter()
        .next()
        .ok_or_else(|| RemoteError::new(format!("empty {resource} response"), 0))
}

#[derive(Serialize, Deserialize)]
struct Contacts {
    #[serde(rename = "Contacts", default)]
    items: Vec<Contact>,
}

#[derive(Serialize, Deserialize)]
struct Invoices {
    #[serde(rename = "Invoices", default)]
    items: Vec<Invoice>,
}

#[derive(Deserialize)]
struct Accounts {
    #[serde(rename = "Accounts", default)]
    items: Vec<Account>,
}

#[derive(Serialize, Deserialize)]
struct Payments {
    #[serde(rename = "Payments", default)]
    items: Vec<PaymentWire>,
}

#[derive(Serialize, Deserialize)]
struct InvoiceRef {
    #[serde(rename = "InvoiceID")]
    id: InvoiceId,
}

#[derive(Serialize, Deserialize)]
struct AccountRef {
    #[serde(rename = "AccountID")]
    id: AccountId,
}

/// Payments reference their invoice and account as nested objects.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PaymentWire {
    #[serde(rename = "PaymentID", default, skip_serializing_if = "Option::is_none")]
    id: Option<PaymentId>,
    invoice: InvoiceRef,
    account: AccountRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    #[serde(with = "crate::wire_date")]
    date: DateTime<Utc>,
}

impl From<&Payment> for PaymentWire {
    fn from(p: &Payment) -> Self {
        Self {
            id: p.id,
            invoice: InvoiceRef { id: p.invoice_id },
            account: AccountRef { id: p.account_id },
            reference: p.reference.clone(),
            amount: p.amount,
            date: p.date,
        }
    }
}

impl From<PaymentWire> for Payment {
    fn from(w: PaymentWire) -> Self {
        Self {
            id: w.id,
            invoice_id: w.invoice.id,
            account_id: w.account.id,
            reference: w.reference,
            amount: w.amount,
            date: w.date,
        }
    }
}

impl AccountingClient for HttpAccountingClient {
    fn tenant_id(&self) -> TenantId {
        self.config.tenant_id
    }

    fn find_contact(&self, filter: &Filter) -> RemoteResult<Option<Contact>> {
        let found: Contacts = self.query("Contacts", filter)?;
        Ok(found.items.into_iter().next())
    }

    fn save_contact(&self, contact: &Contact) -> RemoteResult<Contact> {
        let body = Contacts {
            items: vec![contact.clone()],
        };
        let saved: Contacts = self.send(self.http.post(self.url("Contacts")).json(&body))?;
        first(saved.items, "Contacts")
    }

    fn save_invoice(&self, invoice: &Invoice) -> RemoteResult<Invoice> {
        let body = Invoices {
            items: vec![invoice.clone()],
        };
        let saved: Invoices = self.send(self.http.post(self.url("Invoices")).json(&body))?;
        first(saved.items, "Invoices")
    }

    fn find_account(&self, filter: &Filter) -> RemoteResult<Option<Account>> {
        let found: Accounts = self.query("Accounts", filter)?;
        Ok(found.items.into_iter().next())
    }

    fn save_payment(&self, payment: &Payment) -> RemoteResult<Payment> {
        let body = Payments {
            items: vec![PaymentWire::from(payment)],
        };
        let saved: Payments = self.send(self.http.put(self.url("Payments")).json(&body))?;
        first(saved.items, "Payments").map(Payment::from)
    }
}
