// src/scheduler/settle.rs

use std::sync::Arc;

use tokio::sync::watch;

/// Final outcome of one unit in a parallel walk.
#[derive(Debug, Clone)]
pub enum Settled {
    Success,
    /// The unit's own visitor failed.
    Failed(Arc<anyhow::Error>),
    /// The visitor never ran because this dependency did not succeed.
    Skipped { dependency: String },
}

impl Settled {
    pub fn is_success(&self) -> bool {
        matches!(self, Settled::Success)
    }
}

/// Single-assignment result cell with any number of async readers.
///
/// The first [`resolve`](Settlement::resolve) wins; later calls are ignored.
#[derive(Debug)]
pub struct Settlement {
    tx: watch::Sender<Option<Settled>>,
}

impl Default for Settlement {
    fn default() -> Self {
        Self::new()
    }
}

impl Settlement {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Store the outcome. Returns `false` if the cell was already settled.
    pub fn resolve(&self, value: Settled) -> bool {
        let mut value = Some(value);
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = value.take();
            true
        })
    }

    /// Current outcome without waiting.
    pub fn peek(&self) -> Option<Settled> {
        self.tx.borrow().clone()
    }

    /// Wait until the cell is settled.
    pub async fn settled(&self) -> Settled {
        let mut rx = self.tx.subscribe();
        loop {
            if let Some(value) = rx.borrow_and_update().clone() {
                return value;
            }
            // The sender lives in `self`, so the channel cannot close here.
            if rx.changed().await.is_err() {
                return Settled::Failed(Arc::new(anyhow::anyhow!("settlement dropped")));
            }
        }
    }
}
