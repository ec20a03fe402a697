//! The dataflow lattice: closed integer intervals and interval-union
//! domain elements with saturating arithmetic.

mod interval;
mod interval_domain;

#[cfg(test)]
mod domain_test;

pub use interval::{INT_INF, INT_NEG_INF, Interval};
pub use interval_domain::IntervalDomain;
