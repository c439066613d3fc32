//! Order → accounting sync pipeline.
//!
//! Translates a storefront [`Order`](orderbridge_commerce::Order) into a
//! remote contact, invoice and (optionally) payment, and records the
//! order ↔ invoice link exactly once.
//!
//! ```text
//! OrderSync::sync_order
//!   ↓
//! 1. ContactResolver   find-or-create the purchaser's contact
//!   ↓
//! 2. InvoiceBuilder    order lines + adjustments → invoice draft
//!   ↓
//! 3. InvoiceSubmitter  save, correct rounding drift, save again, write link
//!   ↓
//! 4. PaymentRecorder   (paid orders, payments enabled) record payment
//! ```
//!
//! Every stage short-circuits the pipeline on failure; nothing is retried.

pub mod accounts;
pub mod contact;
pub mod error;
pub mod invoice_builder;
pub mod orchestrator;
pub mod payment;
pub mod settings;
pub mod submitter;

pub use accounts::AccountDirectory;
pub use contact::ContactResolver;
pub use error::{Stage, SyncError};
pub use invoice_builder::InvoiceBuilder;
pub use orchestrator::{OrderSync, PaymentOutcome, SkipReason, SyncReport};
pub use payment::PaymentRecorder;
pub use settings::{AccountCodes, AccountRole, ContactMatch, RoundingPolicy, SyncSettings};
pub use submitter::InvoiceSubmitter;
