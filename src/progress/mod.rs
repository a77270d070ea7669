// src/progress/mod.rs

//! Observable progress tree.
//!
//! - [`tree`] is the plain data model: an arena of task nodes with status,
//!   timestamps, children and log lines.
//! - [`list`] wraps the tree for shared use: [`TaskList`] owns it behind a
//!   lock and notifies observers (the renderer) on every change, and
//!   [`TaskHandle`] is what scheduling code holds to report on one node.

pub mod list;
pub mod tree;

pub use list::{TaskHandle, TaskList, TreeEvent, TreeEventKind, TreeObserver};
pub use tree::{NodeId, StaleThresholds, TaskNode, TaskStatus, TaskTree};
