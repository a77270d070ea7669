mod common;

use std::time::{Duration, Instant};

use common::RecordingObserver;
use monorun::progress::{StaleThresholds, TaskList, TaskStatus, TaskTree};

#[test]
fn finish_cascades_to_descendants() {
    let mut tree = TaskTree::new("root");
    let build = tree.add_child(tree.root(), "build").unwrap();
    let app = tree.add_child(build, "app").unwrap();
    let step = tree.add_child(app, "tsc").unwrap();

    tree.finish(build);

    for id in [build, app, step] {
        let node = tree.get(id).unwrap();
        assert_eq!(node.status, TaskStatus::Finished);
        assert!(node.finished_at.is_some());
    }
    assert!(tree.get(tree.root()).unwrap().is_running());
}

#[test]
fn error_does_not_cascade() {
    let mut tree = TaskTree::new("root");
    let build = tree.add_child(tree.root(), "build").unwrap();
    let app = tree.add_child(build, "app").unwrap();

    let lines = tree.error(build, "first\r\nsecond");

    assert_eq!(lines, vec!["first", "second"]);
    assert_eq!(tree.get(build).unwrap().status, TaskStatus::Error);
    assert_eq!(tree.get(build).unwrap().logs, vec!["first", "second"]);
    assert_eq!(tree.get(app).unwrap().status, TaskStatus::Running);
}

#[test]
fn finished_at_is_stamped_once() {
    let mut tree = TaskTree::new("root");
    let task = tree.add_child(tree.root(), "task").unwrap();
    tree.finish(task);
    let first = tree.get(task).unwrap().finished_at;

    std::thread::sleep(Duration::from_millis(2));
    tree.finish(task);
    assert_eq!(tree.get(task).unwrap().finished_at, first);
}

#[test]
fn delete_removes_the_whole_subtree() {
    let mut tree = TaskTree::new("root");
    let build = tree.add_child(tree.root(), "build").unwrap();
    let app = tree.add_child(build, "app").unwrap();
    let keep = tree.add_child(tree.root(), "keep").unwrap();

    let removed = tree.delete(build).unwrap();
    assert_eq!(removed.title, "build");
    assert!(!tree.contains(build));
    assert!(!tree.contains(app));
    assert_eq!(tree.top_level(), &[keep]);

    assert!(tree.delete(tree.root()).is_none());
    assert!(tree.add_child(build, "orphan").is_none());
}

#[test]
fn staleness_depends_on_interesting_subtrees() {
    let thresholds = StaleThresholds {
        plain: Duration::from_millis(100),
        interesting: Duration::from_secs(5),
    };
    let mut tree = TaskTree::new("root");
    let quiet = tree.add_child(tree.root(), "quiet").unwrap();
    let noisy = tree.add_child(tree.root(), "noisy").unwrap();
    let noisy_child = tree.add_child(noisy, "step").unwrap();
    let running = tree.add_child(tree.root(), "running").unwrap();

    tree.log(noisy_child, "warning: unused import");
    tree.finish(quiet);
    tree.finish(noisy);

    let later = Instant::now() + Duration::from_secs(1);
    assert!(tree.is_stale(quiet, later, &thresholds));
    assert!(!tree.is_stale(noisy, later, &thresholds));
    assert!(!tree.is_stale(running, later, &thresholds));

    let much_later = Instant::now() + Duration::from_secs(10);
    assert!(tree.is_stale(noisy, much_later, &thresholds));
}

#[test]
fn breadcrumb_runs_from_the_root() {
    let mut tree = TaskTree::new("monorun");
    let build = tree.add_child(tree.root(), "build").unwrap();
    let app = tree.add_child(build, "app").unwrap();

    assert_eq!(tree.breadcrumb(app), vec!["monorun", "build", "app"]);
    assert_eq!(tree.ancestors(app), vec![tree.root(), build]);
}

#[test]
fn all_top_level_done_ignores_nested_tasks() {
    let mut tree = TaskTree::new("root");
    assert!(tree.all_top_level_done());

    let a = tree.add_child(tree.root(), "a").unwrap();
    let b = tree.add_child(tree.root(), "b").unwrap();
    assert!(!tree.all_top_level_done());

    tree.finish(a);
    tree.error(b, "failed");
    assert!(tree.all_top_level_done());
}

#[test]
fn handles_notify_observers() {
    let list = TaskList::new("root");
    let recorder = RecordingObserver::attach(&list);

    let build = list.start_task("build");
    let app = build.subtask("app");
    app.log("compiling");
    app.set_detail(Some("waiting".to_string()));
    app.set_detail(Some("waiting".to_string()));
    app.finish();
    let lint = build.subtask("lint");
    lint.delete();
    build.error("lint crashed");

    assert_eq!(
        recorder.events(),
        vec![
            "added:build",
            "added:app",
            "log:app:compiling",
            "detail:app:waiting",
            "finished:app",
            "added:lint",
            "deleted:lint",
            "failed:build:lint crashed",
        ]
    );
    assert_eq!(build.status(), Some(TaskStatus::Error));
    assert_eq!(app.status(), Some(TaskStatus::Finished));
}

#[test]
fn handle_of_deleted_task_is_inert() {
    let list = TaskList::new("root");
    let recorder = RecordingObserver::attach(&list);

    let build = list.start_task("build");
    let stale = build.clone();
    build.delete();

    stale.log("ignored");
    stale.finish();
    assert_eq!(stale.status(), None);
    assert_eq!(stale.title(), None);

    // Subtasks of a deleted task are re-homed under the root.
    let child = stale.subtask("late");
    let parent = list.with_tree(|tree| tree.get(child.id()).and_then(|n| n.parent));
    assert_eq!(parent, Some(list.with_tree(|tree| tree.root())));

    assert_eq!(
        recorder.events(),
        vec!["added:build", "deleted:build", "added:late"]
    );
}

#[test]
fn carriage_returns_split_log_lines() {
    let mut tree = TaskTree::new("root");
    let task = tree.add_child(tree.root(), "install").unwrap();

    let lines = tree.log(task, "10%\r55%\r100%\r\ndone\r\n");

    assert_eq!(lines, vec!["10%", "55%", "100%", "done", ""]);
    let node = tree.get(task).unwrap();
    assert!(node.logs.iter().all(|l| !l.contains('\r')));
}
