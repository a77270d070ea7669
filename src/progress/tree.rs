// src/progress/tree.rs

use std::time::{Duration, Instant};

/// Index of a node inside its [`TaskTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Status of a task node. `Running` is initial; the other two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Finished,
    Error,
}

impl TaskStatus {
    /// Display priority among siblings: errors first, then finished work,
    /// then live progress.
    pub fn priority(self) -> u8 {
        match self {
            TaskStatus::Error => 0,
            TaskStatus::Finished => 1,
            TaskStatus::Running => 2,
        }
    }
}

/// How long finished tasks stay in the rendered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleThresholds {
    /// Finished task with no logs and no errors anywhere in its subtree.
    pub plain: Duration,
    /// Finished task whose subtree holds logs or an error.
    pub interesting: Duration,
}

impl Default for StaleThresholds {
    fn default() -> Self {
        Self {
            plain: Duration::from_millis(500),
            interesting: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskNode {
    pub title: String,
    pub status: TaskStatus,
    /// Secondary text shown after the title, e.g. "waiting for: a, b".
    pub detail: Option<String>,
    pub started_at: Instant,
    /// Set once, on the transition out of `Running`.
    pub finished_at: Option<Instant>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub logs: Vec<String>,
}

impl TaskNode {
    fn new(title: String, parent: Option<NodeId>) -> Self {
        Self {
            title,
            status: TaskStatus::Running,
            detail: None,
            started_at: Instant::now(),
            finished_at: None,
            parent,
            children: Vec::new(),
            logs: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TaskStatus::Running
    }

    /// Time spent running, up to `now` if still running.
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.finished_at
            .unwrap_or(now)
            .saturating_duration_since(self.started_at)
    }

    fn stamp_finished(&mut self, status: TaskStatus) {
        if self.finished_at.is_none() {
            self.finished_at = Some(Instant::now());
        }
        self.status = status;
    }
}

/// Arena-backed task tree with one implicit root.
///
/// A node is owned by exactly one parent, and `child.parent == Some(p)` holds
/// exactly when `p.children` contains `child`. Deleted nodes leave an empty
/// slot so ids are never reused.
#[derive(Debug, Clone)]
pub struct TaskTree {
    nodes: Vec<Option<TaskNode>>,
}

impl TaskTree {
    const ROOT: NodeId = NodeId(0);

    pub fn new(root_title: impl Into<String>) -> Self {
        Self {
            nodes: vec![Some(TaskNode::new(root_title.into(), None))],
        }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn get(&self, id: NodeId) -> Option<&TaskNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut TaskNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Children of `id` in insertion order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Top-level tasks, i.e. the root's children.
    pub fn top_level(&self) -> &[NodeId] {
        self.children(Self::ROOT)
    }

    /// Create a running child under `parent`. Returns `None` if `parent` no
    /// longer exists.
    pub fn add_child(&mut self, parent: NodeId, title: impl Into<String>) -> Option<NodeId> {
        if !self.contains(parent) {
            return None;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(TaskNode::new(title.into(), Some(parent))));
        self.get_mut(parent)?.children.push(id);
        Some(id)
    }

    /// Append `message` to the node's log, one entry per line. Returns the
    /// appended lines.
    ///
    /// `\r\n` ends a line like `\n`. A bare `\r` (progress-bar redraws) also
    /// starts a new entry; empty pieces around it are dropped.
    pub fn log(&mut self, id: NodeId, message: &str) -> Vec<String> {
        let Some(node) = self.get_mut(id) else {
            return Vec::new();
        };
        let mut lines = Vec::new();
        for line in message.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.contains('\r') {
                lines.extend(line.split('\r').filter(|p| !p.is_empty()).map(str::to_string));
            } else {
                lines.push(line.to_string());
            }
        }
        node.logs.extend(lines.iter().cloned());
        lines
    }

    /// Mark the node and every descendant finished.
    pub fn finish(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.get_mut(current) {
                node.stamp_finished(TaskStatus::Finished);
                stack.extend(node.children.iter().copied());
            }
        }
    }

    /// Mark the node failed and log `message`. Children are left untouched.
    /// Returns the logged lines.
    pub fn error(&mut self, id: NodeId, message: &str) -> Vec<String> {
        if let Some(node) = self.get_mut(id) {
            node.stamp_finished(TaskStatus::Error);
        }
        self.log(id, message)
    }

    pub fn set_detail(&mut self, id: NodeId, detail: Option<String>) {
        if let Some(node) = self.get_mut(id) {
            node.detail = detail;
        }
    }

    /// Detach the node from its parent and drop its whole subtree. The root
    /// cannot be deleted.
    pub fn delete(&mut self, id: NodeId) -> Option<TaskNode> {
        if id == Self::ROOT {
            return None;
        }
        let parent = self.get(id)?.parent;
        if let Some(parent) = parent.and_then(|p| self.get_mut(p)) {
            parent.children.retain(|&c| c != id);
        }

        let removed = self.nodes.get_mut(id.0)?.take()?;
        let mut stack = removed.children.clone();
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) {
                stack.extend(node.children);
            }
        }
        Some(removed)
    }

    /// Ancestors of `id` from the root down to its parent.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.get(id).and_then(|n| n.parent);
        while let Some(p) = current {
            chain.push(p);
            current = self.get(p).and_then(|n| n.parent);
        }
        chain.reverse();
        chain
    }

    /// Titles from the root down to `id`, e.g. `["monorun", "build", "app"]`.
    pub fn breadcrumb(&self, id: NodeId) -> Vec<&str> {
        self.ancestors(id)
            .into_iter()
            .chain(std::iter::once(id))
            .filter_map(|n| self.get(n).map(|node| node.title.as_str()))
            .collect()
    }

    /// Whether the node or any descendant holds log lines or an error.
    pub fn has_interesting(&self, id: NodeId) -> bool {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.get(current) else {
                continue;
            };
            if !node.logs.is_empty() || node.status == TaskStatus::Error {
                return true;
            }
            stack.extend(node.children.iter().copied());
        }
        false
    }

    /// A finished node is stale once `finished_at + threshold < now`, with the
    /// longer threshold applying to subtrees worth reading.
    pub fn is_stale(&self, id: NodeId, now: Instant, thresholds: &StaleThresholds) -> bool {
        let Some(node) = self.get(id) else {
            return false;
        };
        if node.status != TaskStatus::Finished {
            return false;
        }
        let Some(finished_at) = node.finished_at else {
            return false;
        };
        let threshold = if self.has_interesting(id) {
            thresholds.interesting
        } else {
            thresholds.plain
        };
        finished_at + threshold < now
    }

    /// True once every top-level task has left `Running`.
    pub fn all_top_level_done(&self) -> bool {
        self.top_level()
            .iter()
            .filter_map(|&id| self.get(id))
            .all(|n| !n.is_running())
    }
}
