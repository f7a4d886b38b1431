//! Generic implementations of the LP and MILP algorithms.

mod milp;
mod simplex;

pub(crate) use milp::milp_impl;
pub(crate) use simplex::{LpStatus, simplex_impl};
