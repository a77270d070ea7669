#![cfg(unix)]

mod common;

use std::sync::{Arc, Mutex};

use common::with_timeout;
use monorun::runner::{LineSink, ProcessRunner, ShellRunner};

fn collector() -> (LineSink, Arc<Mutex<Vec<String>>>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink_lines = Arc::clone(&lines);
    let sink: LineSink = Arc::new(move |line: &str| sink_lines.lock().unwrap().push(line.to_string()));
    (sink, lines)
}

#[tokio::test]
async fn invalid_utf8_output_does_not_cut_the_stream() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ShellRunner::new(dir.path());
    let (sink, lines) = collector();

    let script = "printf 'before\\n\\377\\nafter\\n'; \
                  i=0; while [ $i -lt 2000 ]; do echo \"line $i\"; i=$((i+1)); done; \
                  exit 0";
    let code = with_timeout(runner.run(script, dir.path(), sink)).await.unwrap();

    let lines = lines.lock().unwrap();
    assert_eq!(code, 0);
    assert_eq!(lines.len(), 2003);
    assert_eq!(lines[0], "before");
    assert_eq!(lines[1], "\u{FFFD}");
    assert_eq!(lines[2], "after");
    assert_eq!(lines.last().map(String::as_str), Some("line 1999"));
}

#[tokio::test]
async fn exit_code_and_stderr_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ShellRunner::new(dir.path());
    let (sink, lines) = collector();

    let code = with_timeout(runner.run("echo oops >&2; exit 3", dir.path(), sink))
        .await
        .unwrap();

    assert_eq!(code, 3);
    assert_eq!(*lines.lock().unwrap(), vec!["oops"]);
}

#[tokio::test]
async fn crlf_endings_are_trimmed() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ShellRunner::new(dir.path());
    let (sink, lines) = collector();

    with_timeout(runner.run("printf 'one\\r\\ntwo'", dir.path(), sink))
        .await
        .unwrap();

    assert_eq!(*lines.lock().unwrap(), vec!["one", "two"]);
}

#[tokio::test]
async fn local_bin_folders_are_on_path() {
    use std::os::unix::fs::PermissionsExt;

    let root = tempfile::tempdir().unwrap();
    let unit = root.path().join("packages").join("app");
    let bin = root.path().join("node_modules").join(".bin");
    std::fs::create_dir_all(&unit).unwrap();
    std::fs::create_dir_all(&bin).unwrap();
    let tool = bin.join("greet-tool");
    std::fs::write(&tool, "#!/bin/sh\necho hello from tool\n").unwrap();
    std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

    let runner = ShellRunner::new(root.path());
    let (sink, lines) = collector();
    let code = with_timeout(runner.run("greet-tool", &unit, sink)).await.unwrap();

    assert_eq!(code, 0);
    assert_eq!(*lines.lock().unwrap(), vec!["hello from tool"]);
}
