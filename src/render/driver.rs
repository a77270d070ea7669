// src/render/driver.rs

//! Drives terminal output from a [`TaskList`].
//!
//! Interactive terminals get a redraw timer: each tick moves the cursor back
//! over the previous frame, draws the whole tree again and clears whatever is
//! left below. The timer pauses itself once every top-level task is done and
//! nothing has changed for a grace period, and wakes up when a task is added.
//!
//! Anything else (pipes, CI logs) gets one line per event and nothing is
//! ever erased.

use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::queue;
use crossterm::style::Stylize;
use crossterm::terminal::{self, Clear, ClearType};
use tokio::sync::{Notify, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use crate::config::RenderSection;
use crate::progress::{
    StaleThresholds, TaskList, TaskTree, TreeEvent, TreeEventKind, TreeObserver,
};
use crate::render::layout::{Layout, LayoutOptions};
use crate::render::spinner::Spinner;

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub columns: u16,
    pub rows: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Periodic full redraws.
    Interactive,
    /// Append-only, one line per event.
    Plain,
}

/// Everything the driver needs besides the tree and the output sink.
#[derive(Debug, Clone, Copy)]
pub struct RenderSettings {
    pub frame_interval: Duration,
    pub idle_grace: Duration,
    pub thresholds: StaleThresholds,
    /// Used when the terminal cannot report its size.
    pub fallback_size: TerminalSize,
    /// Skip size detection and always use `fallback_size`.
    pub fixed_size: bool,
}

impl From<&RenderSection> for RenderSettings {
    fn from(section: &RenderSection) -> Self {
        Self {
            frame_interval: section.frame_interval(),
            idle_grace: section.idle_grace(),
            thresholds: StaleThresholds {
                plain: Duration::from_millis(section.stale_after_ms),
                interesting: Duration::from_millis(section.stale_interesting_after_ms),
            },
            fallback_size: TerminalSize {
                columns: section.fallback_columns,
                rows: section.fallback_rows,
            },
            fixed_size: false,
        }
    }
}

impl RenderSettings {
    fn size(&self) -> TerminalSize {
        if self.fixed_size {
            return self.fallback_size;
        }
        match terminal::size() {
            Ok((columns, rows)) if columns > 0 && rows > 0 => TerminalSize { columns, rows },
            _ => self.fallback_size,
        }
    }
}

/// Interactive when stdout is a terminal that reports its dimensions.
pub fn detect_mode() -> RenderMode {
    if io::stdout().is_terminal() && terminal::size().is_ok() {
        RenderMode::Interactive
    } else {
        RenderMode::Plain
    }
}

/// Running renderer attached to one [`TaskList`].
pub struct Renderer {
    mode: RenderMode,
    writer: SharedWriter,
    driver: Option<(oneshot::Sender<()>, JoinHandle<()>)>,
}

impl Renderer {
    /// Attach to `list`, writing to stdout in the detected mode.
    ///
    /// Interactive mode spawns the redraw loop, so a Tokio runtime must be
    /// running.
    pub fn stdout(list: &TaskList, section: &RenderSection) -> Self {
        let mode = detect_mode();
        Self::start(list, RenderSettings::from(section), mode, Box::new(io::stdout()))
    }

    pub fn start(
        list: &TaskList,
        settings: RenderSettings,
        mode: RenderMode,
        writer: Box<dyn Write + Send>,
    ) -> Self {
        let writer: SharedWriter = Arc::new(Mutex::new(writer));
        debug!(?mode, "starting progress renderer");

        let driver = match mode {
            RenderMode::Plain => {
                list.subscribe(Arc::new(PlainObserver {
                    writer: Arc::clone(&writer),
                }));
                None
            }
            RenderMode::Interactive => {
                let wake = Arc::new(Notify::new());
                list.subscribe(Arc::new(WakeObserver {
                    wake: Arc::clone(&wake),
                }));
                let (stop_tx, stop_rx) = oneshot::channel();
                let frames = FrameWriter {
                    list: list.clone(),
                    writer: Arc::clone(&writer),
                    settings,
                    spinner: Spinner::new(),
                    previous_lines: 0,
                };
                let handle = tokio::spawn(drive_interactive(frames, wake, stop_rx));
                Some((stop_tx, handle))
            }
        };

        Self {
            mode,
            writer,
            driver,
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Draw the final frame (interactive) and stop.
    pub async fn finish(mut self) {
        if let Some((stop_tx, handle)) = self.driver.take() {
            let _ = stop_tx.send(());
            if let Err(e) = handle.await {
                warn!(error = %e, "renderer task ended abnormally");
            }
        }
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writer.flush();
    }
}

async fn drive_interactive(mut frames: FrameWriter, wake: Arc<Notify>, mut stop_rx: oneshot::Receiver<()>) {
    loop {
        let mut ticker = interval(frames.settings.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut idle_since: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut stop_rx => {
                    frames.draw();
                    return;
                }
            }

            let done = frames.draw();
            if !done {
                idle_since = None;
                continue;
            }
            let since = *idle_since.get_or_insert_with(Instant::now);
            if since.elapsed() >= frames.settings.idle_grace {
                break;
            }
        }

        // Register before re-checking the tree so an `Added` in between is not lost.
        let notified = wake.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if !frames.list.with_tree(TaskTree::all_top_level_done) {
            continue;
        }

        debug!("all top-level tasks done; pausing redraw timer");
        tokio::select! {
            _ = &mut notified => {
                debug!("new task added; resuming redraw timer");
            }
            _ = &mut stop_rx => {
                frames.draw();
                return;
            }
        }
    }
}

/// Interactive frame state carried between redraws.
struct FrameWriter {
    list: TaskList,
    writer: SharedWriter,
    settings: RenderSettings,
    spinner: Spinner,
    previous_lines: usize,
}

impl FrameWriter {
    /// Redraw the whole tree. Returns whether every top-level task is done.
    fn draw(&mut self) -> bool {
        let size = self.settings.size();
        let options = LayoutOptions {
            columns: usize::from(size.columns),
            rows: usize::from(size.rows),
            thresholds: self.settings.thresholds,
        };
        let now = Instant::now();
        let spinner = self.spinner.current();

        let (lines, done) = self.list.with_tree(|tree| {
            (
                Layout::new(tree, now, spinner, options).frame(),
                tree.all_top_level_done(),
            )
        });
        self.spinner.tick();

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = write_frame(&mut *writer, self.previous_lines, &lines) {
            warn!(error = %e, "failed to draw progress frame");
        }
        self.previous_lines = lines.len();
        done
    }
}

fn write_frame<W: Write>(out: &mut W, previous_lines: usize, lines: &[String]) -> io::Result<()> {
    if previous_lines > 0 {
        let up = u16::try_from(previous_lines).unwrap_or(u16::MAX);
        queue!(out, MoveUp(up), MoveToColumn(0))?;
    }
    for line in lines {
        out.write_all(line.as_bytes())?;
        queue!(out, Clear(ClearType::UntilNewLine))?;
        out.write_all(b"\n")?;
    }
    queue!(out, Clear(ClearType::FromCursorDown))?;
    out.flush()
}

/// Restarts the paused redraw timer when work is added.
struct WakeObserver {
    wake: Arc<Notify>,
}

impl TreeObserver for WakeObserver {
    fn on_event(&self, _tree: &TaskTree, event: &TreeEvent) {
        // Only a paused driver listens; nothing is stored for later.
        if event.kind == TreeEventKind::Added {
            self.wake.notify_waiters();
        }
    }
}

/// Non-interactive output: a breadcrumb line per status change, raw lines
/// for logs.
struct PlainObserver {
    writer: SharedWriter,
}

impl PlainObserver {
    fn status_line(tree: &TaskTree, event: &TreeEvent) -> Option<String> {
        let crumbs = tree.breadcrumb(event.node).join(" » ");
        let line = match &event.kind {
            TreeEventKind::Added => format!("{} {crumbs}", "▶".cyan()),
            TreeEventKind::Finished => {
                let secs = tree
                    .get(event.node)
                    .map(|n| n.elapsed(Instant::now()).as_secs_f64())
                    .unwrap_or_default();
                format!("{} {crumbs} {}", "✔".green(), format!("({secs:.1}s)").dim())
            }
            TreeEventKind::Failed(lines) => {
                let mut line = format!("{} {crumbs}", "✖".red());
                for message in lines {
                    line.push('\n');
                    line.push_str(&message.as_str().red().to_string());
                }
                line
            }
            TreeEventKind::Detail(Some(detail)) => format!("{} {crumbs} {}", "…".dim(), detail.as_str().dim()),
            TreeEventKind::Detail(None)
            | TreeEventKind::Log(_)
            | TreeEventKind::Deleted { .. } => return None,
        };
        Some(line)
    }
}

impl TreeObserver for PlainObserver {
    fn on_event(&self, tree: &TaskTree, event: &TreeEvent) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let result = match &event.kind {
            TreeEventKind::Log(lines) => lines
                .iter()
                .try_for_each(|line| writeln!(writer, "{line}")),
            _ => match Self::status_line(tree, event) {
                Some(line) => writeln!(writer, "{line}"),
                None => Ok(()),
            },
        };
        if let Err(e) = result.and_then(|_| writer.flush()) {
            warn!(error = %e, "failed to write progress line");
        }
    }
}
