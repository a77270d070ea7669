use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use monorun::runner::{LineSink, ProcessRunner};

/// A fake process runner that:
/// - records every command it was asked to run, with its folder
/// - emits configured output lines
/// - resolves to a configured exit code (0 by default)
///
/// Commands are keyed by their exact text, so give each unit's script a
/// distinct command in tests.
#[derive(Debug, Clone, Default)]
pub struct FakeRunner {
    exit_codes: HashMap<String, i32>,
    output: HashMap<String, Vec<String>>,
    delays: HashMap<String, Duration>,
    events: Arc<Mutex<Vec<String>>>,
    executed: Arc<Mutex<Vec<(String, PathBuf)>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exit_code(mut self, command: &str, code: i32) -> Self {
        self.exit_codes.insert(command.to_string(), code);
        self
    }

    pub fn output(mut self, command: &str, lines: &[&str]) -> Self {
        self.output
            .insert(command.to_string(), lines.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Keep `command` "running" for `delay` before it exits.
    pub fn delay(mut self, command: &str, delay: Duration) -> Self {
        self.delays.insert(command.to_string(), delay);
        self
    }

    /// Commands in the order they started.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn executed_in(&self) -> Vec<(String, PathBuf)> {
        self.executed.lock().unwrap().clone()
    }

    /// `start:<command>` / `end:<command>` markers in the order they happened.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ProcessRunner for FakeRunner {
    fn run<'a>(
        &'a self,
        command: &'a str,
        cwd: &'a Path,
        output: LineSink,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>> {
        Box::pin(async move {
            self.executed
                .lock()
                .unwrap()
                .push((command.to_string(), cwd.to_path_buf()));
            self.events.lock().unwrap().push(format!("start:{command}"));

            if let Some(delay) = self.delays.get(command) {
                tokio::time::sleep(*delay).await;
            }
            for line in self.output.get(command).into_iter().flatten() {
                output(line);
            }

            self.events.lock().unwrap().push(format!("end:{command}"));
            Ok(self.exit_codes.get(command).copied().unwrap_or(0))
        })
    }
}
