//! Computation engines
//!
//! Both engines are pure functions of their inputs: elements plus a
//! reference snapshot in, grouped result components out.

pub mod cost;
pub mod lca;
pub mod rounding;

pub use cost::compute_cost;
pub use lca::{compute_lca, LcaEvaluator};
pub use rounding::round_to;
