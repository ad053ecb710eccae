//! Rebate
//!
//! Rebate is a promotion calculation engine: it takes an order, a catalog of promotions and
//! optional customer data, decides which promotions apply and how they combine, and produces an
//! auditable breakdown of per-line discounts, free items and order-level benefits.

pub mod applicator;
pub mod breakdown;
pub mod cli;
pub mod combinability;
pub mod conditions;
pub mod context;
pub mod customers;
pub mod discounts;
pub mod engine;
pub mod fixtures;
pub mod ids;
pub mod observability;
pub mod orders;
pub mod prelude;
pub mod promotions;
