// src/render/mod.rs

//! Terminal rendering of the progress tree.
//!
//! - [`layout`] turns a [`TaskTree`](crate::progress::TaskTree) into frame
//!   lines under a row budget. It is pure and does no IO.
//! - [`truncate`] shortens styled lines to the terminal width.
//! - [`spinner`] is the animation shared by every running task.
//! - [`driver`] owns the terminal: a redraw timer for interactive terminals,
//!   an append-only event stream otherwise.

pub mod driver;
pub mod layout;
pub mod spinner;
pub mod truncate;

pub use driver::{RenderMode, RenderSettings, Renderer, TerminalSize};
pub use layout::{Layout, LayoutOptions};
pub use spinner::Spinner;
pub use truncate::{strip_styles, truncate_line, visible_width};
