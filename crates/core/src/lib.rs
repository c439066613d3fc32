//! `orderbridge-core`: shared building blocks for the order sync pipeline.
//!
//! This crate contains **pure** primitives (no IO): identifiers, the domain
//! error model, and money normalization.

pub mod error;
pub mod id;
pub mod money;

pub use error::DomainError;
pub use id::TenantId;
pub use money::{DEFAULT_DECIMAL_PLACES, normalize};

#[doc(hidden)]
pub use uuid as __uuid;
