//! Commerce order model (read-only view of a storefront order).
//!
//! The sync pipeline never mutates orders; this crate only describes the data
//! it reads: purchaser, line items, adjustments, totals and payment state.

pub mod order;

pub use order::{AdjustmentKind, Order, OrderAdjustment, OrderId, OrderLineItem, Purchaser, Transaction};
