#![allow(dead_code)]

use std::sync::Arc;

use monorun::progress::{TaskList, TaskTree, TreeEvent, TreeEventKind, TreeObserver};
use std::sync::Mutex;

pub use monorun_test_utils::builders::{ManifestBuilder, WORKSPACE_ROOT, WorkspaceBuilder};
pub use monorun_test_utils::fake_runner::FakeRunner;
pub use monorun_test_utils::{init_tracing, with_timeout};

/// Observer that records a short description of every event.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn attach(list: &TaskList) -> Arc<Self> {
        let observer = Arc::new(Self::default());
        list.subscribe(observer.clone());
        observer
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl TreeObserver for RecordingObserver {
    fn on_event(&self, tree: &TaskTree, event: &TreeEvent) {
        let title = tree
            .get(event.node)
            .map(|n| n.title.clone())
            .unwrap_or_default();
        let line = match &event.kind {
            TreeEventKind::Added => format!("added:{title}"),
            TreeEventKind::Log(lines) => format!("log:{title}:{}", lines.join("|")),
            TreeEventKind::Finished => format!("finished:{title}"),
            TreeEventKind::Failed(lines) => format!("failed:{title}:{}", lines.join("|")),
            TreeEventKind::Detail(detail) => {
                format!("detail:{title}:{}", detail.as_deref().unwrap_or("-"))
            }
            TreeEventKind::Deleted { title } => format!("deleted:{title}"),
        };
        self.events.lock().unwrap().push(line);
    }
}
