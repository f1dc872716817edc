//! Domain layer for the warehouse order export worker.
//!
//! This crate contains:
//! - Export job models and `search_values` parsing
//! - The tabular row abstraction used when writing workbooks
//! - Pick timing analytics for order log exports

pub mod models;
pub mod services;
