// src/runner/process.rs

//! Process execution seam.
//!
//! The runner only needs three things from a process: start it in a folder,
//! receive its output line by line, and learn its exit code. Production code
//! uses [`ShellRunner`]; tests substitute their own [`ProcessRunner`].

use std::env;
use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Consecutive read errors tolerated on one output stream.
const MAX_READ_FAILURES: u32 = 16;

/// Receives each output line of a running process, stdout and stderr alike.
pub type LineSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Trait abstracting how a unit's script is executed.
pub trait ProcessRunner: Send + Sync {
    /// Run `command` in `cwd`, feeding every output line to `output`, and
    /// resolve to the exit code once the process has exited and its output
    /// streams are closed.
    fn run<'a>(
        &'a self,
        command: &'a str,
        cwd: &'a Path,
        output: LineSink,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>>;
}

/// Runs commands through the platform shell.
///
/// `node_modules/.bin` of the unit folder and of the workspace root are put
/// in front of `PATH`, so scripts can call locally installed tools.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    root: PathBuf,
}

impl ShellRunner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn search_path(&self, cwd: &Path) -> Result<OsString> {
        let mut dirs = vec![
            cwd.join("node_modules").join(".bin"),
            self.root.join("node_modules").join(".bin"),
        ];
        if let Some(existing) = env::var_os("PATH") {
            dirs.extend(env::split_paths(&existing));
        }
        env::join_paths(dirs).context("building PATH for script")
    }
}

impl ProcessRunner for ShellRunner {
    fn run<'a>(
        &'a self,
        command: &'a str,
        cwd: &'a Path,
        output: LineSink,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>> {
        Box::pin(async move {
            info!(cwd = %cwd.display(), cmd = %command, "starting script process");

            let mut cmd = if cfg!(windows) {
                let mut c = Command::new("cmd");
                c.arg("/C").arg(command);
                c
            } else {
                let mut c = Command::new("sh");
                c.arg("-c").arg(command);
                c
            };

            cmd.current_dir(cwd)
                .env("PATH", self.search_path(cwd)?)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            let mut child = cmd
                .spawn()
                .with_context(|| format!("spawning `{command}` in {}", cwd.display()))?;

            let stdout = child.stdout.take().map(|s| forward_lines(s, Arc::clone(&output)));
            let stderr = child.stderr.take().map(|s| forward_lines(s, Arc::clone(&output)));

            let status = child
                .wait()
                .await
                .with_context(|| format!("waiting for `{command}`"))?;

            // Drain whatever is still buffered before reporting the exit.
            for reader in [stdout, stderr].into_iter().flatten() {
                if let Err(e) = reader.await {
                    warn!(error = %e, "output reader task failed");
                }
            }

            let code = status.code().unwrap_or(-1);
            debug!(cmd = %command, exit_code = code, "script process exited");
            Ok(code)
        })
    }
}

fn forward_lines<R>(stream: R, output: LineSink) -> tokio::task::JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        let mut failures = 0;
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    failures = 0;
                    let line = String::from_utf8_lossy(&buf);
                    output(line.trim_end_matches(['\n', '\r']));
                }
                // Keep draining so the child never writes into a closed pipe.
                Err(e) if failures < MAX_READ_FAILURES => {
                    failures += 1;
                    warn!(error = %e, "reading script output failed; continuing");
                }
                Err(e) => {
                    warn!(error = %e, "giving up on script output");
                    break;
                }
            }
        }
    })
}
