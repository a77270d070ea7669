// src/progress/list.rs

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::progress::tree::{NodeId, TaskStatus, TaskTree};

/// What changed in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEventKind {
    Added,
    Log(Vec<String>),
    Finished,
    /// The node failed; carries the lines of the error message.
    Failed(Vec<String>),
    Detail(Option<String>),
    Deleted { title: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEvent {
    pub node: NodeId,
    pub kind: TreeEventKind,
}

/// Receives every change made through a [`TaskList`].
///
/// Called synchronously while the tree lock is held, with the tree already
/// updated. Implementations must not call back into the same `TaskList`.
pub trait TreeObserver: Send + Sync {
    fn on_event(&self, tree: &TaskTree, event: &TreeEvent);
}

struct Shared {
    tree: Mutex<TaskTree>,
    observers: Mutex<Vec<Arc<dyn TreeObserver>>>,
}

/// Shared, observable progress tree.
///
/// Cloning is cheap and every clone refers to the same tree.
#[derive(Clone)]
pub struct TaskList {
    shared: Arc<Shared>,
}

impl fmt::Debug for TaskList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskList").finish_non_exhaustive()
    }
}

impl TaskList {
    pub fn new(root_title: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                tree: Mutex::new(TaskTree::new(root_title)),
                observers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Start a top-level task.
    pub fn start_task(&self, title: impl Into<String>) -> TaskHandle {
        let root = self.with_tree(|tree| tree.root());
        self.add_child(root, title.into())
    }

    pub fn subscribe(&self, observer: Arc<dyn TreeObserver>) {
        self.shared
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Run `f` against the current tree.
    pub fn with_tree<R>(&self, f: impl FnOnce(&TaskTree) -> R) -> R {
        f(&self.lock_tree())
    }

    fn lock_tree(&self) -> MutexGuard<'_, TaskTree> {
        self.shared.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a mutation and bubble the resulting event up to the observers.
    fn mutate(&self, f: impl FnOnce(&mut TaskTree) -> Option<TreeEvent>) {
        let mut tree = self.lock_tree();
        let Some(event) = f(&mut tree) else {
            return;
        };
        let observers = self
            .shared
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            observer.on_event(&tree, &event);
        }
    }

    fn add_child(&self, parent: NodeId, title: String) -> TaskHandle {
        let mut created = None;
        self.mutate(|tree| {
            // A subtask of a deleted node lands under the root instead.
            let parent = if tree.contains(parent) { parent } else { tree.root() };
            let id = tree.add_child(parent, title)?;
            created = Some(id);
            Some(TreeEvent {
                node: id,
                kind: TreeEventKind::Added,
            })
        });

        let id = created.unwrap_or_else(|| self.with_tree(|tree| tree.root()));
        TaskHandle {
            list: self.clone(),
            id,
        }
    }
}

/// Reporting handle for one node of a [`TaskList`].
#[derive(Clone)]
pub struct TaskHandle {
    list: TaskList,
    id: NodeId,
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle").field("id", &self.id).finish()
    }
}

impl TaskHandle {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn list(&self) -> &TaskList {
        &self.list
    }

    pub fn subtask(&self, title: impl Into<String>) -> TaskHandle {
        self.list.add_child(self.id, title.into())
    }

    pub fn log(&self, message: &str) {
        let id = self.id;
        self.list.mutate(|tree| {
            if !tree.contains(id) {
                return None;
            }
            let lines = tree.log(id, message);
            Some(TreeEvent {
                node: id,
                kind: TreeEventKind::Log(lines),
            })
        });
    }

    /// Finish this task and, recursively, every subtask.
    pub fn finish(&self) {
        let id = self.id;
        self.list.mutate(|tree| {
            if !tree.contains(id) {
                return None;
            }
            tree.finish(id);
            Some(TreeEvent {
                node: id,
                kind: TreeEventKind::Finished,
            })
        });
    }

    /// Fail this task with `message`. Subtasks keep their status.
    pub fn error(&self, message: &str) {
        let id = self.id;
        self.list.mutate(|tree| {
            if !tree.contains(id) {
                return None;
            }
            let lines = tree.error(id, message);
            Some(TreeEvent {
                node: id,
                kind: TreeEventKind::Failed(lines),
            })
        });
    }

    pub fn set_detail(&self, detail: Option<String>) {
        let id = self.id;
        self.list.mutate(|tree| {
            if tree.get(id)?.detail == detail {
                return None;
            }
            tree.set_detail(id, detail.clone());
            Some(TreeEvent {
                node: id,
                kind: TreeEventKind::Detail(detail),
            })
        });
    }

    /// Detach this task (and its subtasks) from the tree.
    pub fn delete(self) {
        let id = self.id;
        self.list.mutate(|tree| {
            let removed = tree.delete(id)?;
            Some(TreeEvent {
                node: id,
                kind: TreeEventKind::Deleted {
                    title: removed.title,
                },
            })
        });
    }

    /// Current status, or `None` once deleted.
    pub fn status(&self) -> Option<TaskStatus> {
        self.list.with_tree(|tree| tree.get(self.id).map(|n| n.status))
    }

    pub fn title(&self) -> Option<String> {
        self.list
            .with_tree(|tree| tree.get(self.id).map(|n| n.title.clone()))
    }
}
