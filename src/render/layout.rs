// src/render/layout.rs

//! Frame layout under a bounded number of terminal rows.
//!
//! A node renders as its summary line, then its children, then its own log
//! lines, each drawing from what is left of the row budget. Children are
//! chosen before any of them is drawn:
//!
//! 1. Sort by status: errors, then finished, then running.
//! 2. Under a finished parent keep only children whose subtree has logs or
//!    errors; otherwise drop finished children that have gone stale.
//! 3. While there are more children than rows, evict the oldest finished
//!    child, then the oldest error, and finally cut the remainder.
//!
//! Every selected child is guaranteed its summary line. Rows a child leaves
//! unused flow on to its later siblings.

use std::time::Instant;

use crossterm::style::Stylize;

use crate::progress::{NodeId, StaleThresholds, TaskStatus, TaskTree};
use crate::render::truncate::truncate_line;

/// Rows kept free: one at the top, one blank line under the frame so the
/// cursor does not sit on the last drawn row.
const RESERVED_ROWS: usize = 2;

const INDENT: &str = "  ";

#[derive(Debug, Clone, Copy)]
pub struct LayoutOptions {
    pub columns: usize,
    pub rows: usize,
    pub thresholds: StaleThresholds,
}

impl LayoutOptions {
    /// Rows available to the tree itself.
    pub fn row_budget(&self) -> usize {
        self.rows.saturating_sub(RESERVED_ROWS)
    }
}

/// One render pass over a tree snapshot.
pub struct Layout<'a> {
    tree: &'a TaskTree,
    now: Instant,
    spinner: &'a str,
    options: LayoutOptions,
}

impl<'a> Layout<'a> {
    pub fn new(tree: &'a TaskTree, now: Instant, spinner: &'a str, options: LayoutOptions) -> Self {
        Self {
            tree,
            now,
            spinner,
            options,
        }
    }

    /// Lines of a full frame: every top-level task within the row budget.
    pub fn frame(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.render_children(self.tree.root(), 0, self.options.row_budget(), &mut out);
        out
    }

    /// Lines for `id` and its subtree within `budget` rows.
    pub fn node_lines(&self, id: NodeId, budget: usize) -> Vec<String> {
        let mut out = Vec::new();
        self.render_node(id, 0, budget, &mut out);
        out
    }

    /// Children of `parent` that get drawn when `budget` rows are available,
    /// in display order.
    pub fn select_children(&self, parent: NodeId, budget: usize) -> Vec<NodeId> {
        let tree = self.tree;
        let Some(parent_node) = tree.get(parent) else {
            return Vec::new();
        };

        let mut children: Vec<(NodeId, TaskStatus, Option<Instant>)> = parent_node
            .children
            .iter()
            .filter_map(|&id| tree.get(id).map(|n| (id, n.status, n.finished_at)))
            .collect();
        children.sort_by_key(|&(_, status, _)| status.priority());

        if parent_node.status == TaskStatus::Finished {
            children.retain(|&(id, _, _)| tree.has_interesting(id));
        } else {
            children.retain(|&(id, _, _)| !tree.is_stale(id, self.now, &self.options.thresholds));
        }

        for evictable in [TaskStatus::Finished, TaskStatus::Error] {
            while children.len() > budget {
                let oldest = children
                    .iter()
                    .enumerate()
                    .filter(|(_, (_, status, _))| *status == evictable)
                    .min_by_key(|(_, (_, _, finished_at))| *finished_at)
                    .map(|(pos, _)| pos);
                match oldest {
                    Some(pos) => {
                        children.remove(pos);
                    }
                    None => break,
                }
            }
        }
        children.truncate(budget);

        children.into_iter().map(|(id, _, _)| id).collect()
    }

    /// Returns the number of lines written.
    fn render_node(&self, id: NodeId, depth: usize, budget: usize, out: &mut Vec<String>) -> usize {
        let Some(node) = self.tree.get(id) else {
            return 0;
        };
        if budget == 0 {
            return 0;
        }

        out.push(self.fit(self.summary_line(id, depth)));
        let mut remaining = budget - 1;

        remaining -= self.render_children(id, depth + 1, remaining, out);

        let shown = node.logs.len().min(remaining);
        let indent = INDENT.repeat(depth + 1);
        for line in &node.logs[node.logs.len() - shown..] {
            let styled = match node.status {
                TaskStatus::Error => line.as_str().red().to_string(),
                _ => line.as_str().dim().to_string(),
            };
            out.push(self.fit(format!("{indent}{styled}")));
        }
        remaining -= shown;

        budget - remaining
    }

    /// Returns the number of lines written.
    fn render_children(&self, parent: NodeId, depth: usize, budget: usize, out: &mut Vec<String>) -> usize {
        let children = self.select_children(parent, budget);
        let mut remaining = budget;

        for (i, &child) in children.iter().enumerate() {
            // Hold back one row for each later sibling's summary line.
            let later = children.len() - i - 1;
            let allowance = remaining.saturating_sub(later);
            remaining -= self.render_node(child, depth, allowance, out);
        }

        budget - remaining
    }

    fn summary_line(&self, id: NodeId, depth: usize) -> String {
        let Some(node) = self.tree.get(id) else {
            return String::new();
        };
        let indent = INDENT.repeat(depth);

        let (icon, title) = match node.status {
            TaskStatus::Running => (self.spinner.cyan().to_string(), node.title.clone()),
            TaskStatus::Finished => ("✔".green().to_string(), node.title.clone()),
            TaskStatus::Error => ("✖".red().to_string(), node.title.as_str().red().to_string()),
        };

        let mut line = format!("{indent}{icon} {title}");
        if let Some(detail) = &node.detail {
            line.push_str(&format!(" {}", detail.as_str().dim()));
        }
        if !node.is_running() {
            let secs = node.elapsed(self.now).as_secs_f64();
            line.push_str(&format!(" {}", format!("({secs:.1}s)").dim()));
        }
        line
    }

    fn fit(&self, line: String) -> String {
        truncate_line(&line, self.options.columns).into_owned()
    }
}
