// src/scheduler/mod.rs

//! Dependency-ordered visitation of workspace units.
//!
//! - [`sequential`] walks units one at a time in dependency order, with a
//!   visitor-controlled early stop.
//! - [`parallel`] starts every unit at once and gates each visitor on the
//!   settlement of its in-workspace dependencies.
//! - [`settle`] is the write-once cell each unit uses to publish its outcome
//!   to the units waiting on it.

pub mod parallel;
pub mod sequential;
pub mod settle;

pub use parallel::{visit_in_order_parallel, visit_unordered};
pub use sequential::{Flow, topological_order, visit_dependents, visit_in_order, visit_in_reverse_order};
pub use settle::{Settled, Settlement};
