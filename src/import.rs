//! Definition import pipeline.
//!
//! # Flow
//!
//! 1. The path picked by the user goes through a [`FileFilter`] that accepts
//!    exactly one extension
//! 2. [`Importer::start`] spawns a tokio task that reads and decodes the file,
//!    bounded by a timeout
//! 3. Outcomes come back over a channel and are drained by the event loop,
//!    which feeds each definition into the list in file order
//!
//! # Overlapping imports
//!
//! Starting a second import before the first finished is allowed. What
//! happens then is decided by [`ImportPolicy`] rather than by whichever task
//! wins the race.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::listbox::{Listbox, VisualHost};

/// One imported record. Only `name` is required; everything else is kept
/// as-is for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Decode a JSON array of named records
pub fn decode(bytes: &[u8]) -> Result<Vec<Definition>, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Single-extension file filter used by the picker
#[derive(Debug, Clone)]
pub struct FileFilter {
    extension: String,
}

impl FileFilter {
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_lowercase(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }

    pub fn check(&self, path: &Path) -> Result<(), ImportError> {
        if self.accepts(path) {
            Ok(())
        } else {
            Err(ImportError::UnsupportedExtension {
                path: path.to_path_buf(),
                expected: self.extension.clone(),
            })
        }
    }
}

/// Read and decode a definitions file
pub async fn read_definitions(path: &Path) -> Result<Vec<Definition>, ImportError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    decode(&bytes).map_err(|source| ImportError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Bound an import future by `timeout`
async fn with_timeout<F>(path: &Path, timeout: Duration, read: F) -> Result<Vec<Definition>, ImportError>
where
    F: Future<Output = Result<Vec<Definition>, ImportError>>,
{
    match tokio::time::timeout(timeout, read).await {
        Ok(result) => result,
        Err(_) => Err(ImportError::TimedOut {
            path: path.to_path_buf(),
            timeout,
        }),
    }
}

/// How overlapping imports are resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ImportPolicy {
    /// Apply every import as it completes; order across imports follows
    /// completion, not start
    Interleave,
    /// A new import cancels the pending ones and their results are dropped
    #[default]
    LatestWins,
}

/// Identifies one started import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImportTicket(u64);

/// Result of a finished import
#[derive(Debug)]
pub struct ImportOutcome {
    pub ticket: ImportTicket,
    pub path: PathBuf,
    pub result: Result<Vec<Definition>, ImportError>,
}

/// Runs imports in the background and hands their outcomes back in order
/// of completion
pub struct Importer {
    filter: FileFilter,
    policy: ImportPolicy,
    timeout: Duration,
    next_ticket: u64,
    pending: HashMap<ImportTicket, JoinHandle<()>>,
    tx: mpsc::UnboundedSender<ImportOutcome>,
    rx: mpsc::UnboundedReceiver<ImportOutcome>,
}

impl Importer {
    pub fn new(filter: FileFilter, policy: ImportPolicy, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            filter,
            policy,
            timeout,
            next_ticket: 0,
            pending: HashMap::new(),
            tx,
            rx,
        }
    }

    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(
            FileFilter::new(&config.extension),
            config.policy,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn filter(&self) -> &FileFilter {
        &self.filter
    }

    /// Start importing `path`. Must be called from within a tokio runtime.
    pub fn start(&mut self, path: impl Into<PathBuf>) -> Result<ImportTicket, ImportError> {
        let path = path.into();
        self.filter.check(&path)?;

        if self.policy == ImportPolicy::LatestWins {
            self.cancel_all();
        }

        Ok(self.spawn(path, None, None))
    }

    /// Start importing several files as one batch.
    ///
    /// The files are read concurrently but their outcomes are delivered in
    /// the given order, and under [`ImportPolicy::LatestWins`] they do not
    /// supersede each other. A rejected path does not stop the others.
    pub fn start_all<I>(&mut self, paths: I) -> Vec<Result<ImportTicket, ImportError>>
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        if self.policy == ImportPolicy::LatestWins {
            self.cancel_all();
        }

        let mut previous = None;
        let mut tickets = Vec::new();
        for path in paths {
            let path = path.into();
            if let Err(e) = self.filter.check(&path) {
                tickets.push(Err(e));
                continue;
            }
            let (done_tx, done_rx) = oneshot::channel();
            let ticket = self.spawn(path, previous.replace(done_rx), Some(done_tx));
            tickets.push(Ok(ticket));
        }
        tickets
    }

    /// Spawn the read task. With `after`, the outcome is held back until the
    /// previous task in the batch delivered or went away; `done` is signalled
    /// once this one delivered.
    fn spawn(
        &mut self,
        path: PathBuf,
        after: Option<oneshot::Receiver<()>>,
        done: Option<oneshot::Sender<()>>,
    ) -> ImportTicket {
        let ticket = ImportTicket(self.next_ticket);
        self.next_ticket += 1;

        let tx = self.tx.clone();
        let timeout = self.timeout;
        let task_path = path.clone();
        let handle = tokio::spawn(async move {
            let result = with_timeout(&task_path, timeout, read_definitions(&task_path)).await;
            if let Some(after) = after {
                // Err means the previous import was cancelled
                let _ = after.await;
            }
            // Fails only when the importer is gone
            let _ = tx.send(ImportOutcome {
                ticket,
                path: task_path,
                result,
            });
            if let Some(done) = done {
                let _ = done.send(());
            }
        });
        self.pending.insert(ticket, handle);

        tracing::info!("Importing {} ({:?})", path.display(), ticket);
        ticket
    }

    /// Cancel one pending import. Returns false if it already finished or
    /// was never started.
    #[allow(dead_code)] // Tickets are only tracked by callers embedding the importer
    pub fn cancel(&mut self, ticket: ImportTicket) -> bool {
        match self.pending.remove(&ticket) {
            Some(handle) => {
                handle.abort();
                tracing::debug!("Cancelled import {:?}", ticket);
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (ticket, handle) in self.pending.drain() {
            handle.abort();
            tracing::debug!("Cancelled import {:?}", ticket);
        }
    }

    /// Number of imports started but not yet delivered
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Next finished import, without waiting
    pub fn try_next(&mut self) -> Option<ImportOutcome> {
        while let Ok(outcome) = self.rx.try_recv() {
            if let Some(outcome) = self.accept(outcome) {
                return Some(outcome);
            }
        }
        None
    }

    /// Wait for the next finished import. Returns `None` once nothing is
    /// pending.
    #[cfg(test)]
    pub async fn next(&mut self) -> Option<ImportOutcome> {
        while !self.pending.is_empty() {
            let outcome = self.rx.recv().await?;
            if let Some(outcome) = self.accept(outcome) {
                return Some(outcome);
            }
        }
        None
    }

    /// Drop outcomes of cancelled or superseded imports
    fn accept(&mut self, outcome: ImportOutcome) -> Option<ImportOutcome> {
        if self.pending.remove(&outcome.ticket).is_some() {
            Some(outcome)
        } else {
            tracing::debug!("Dropping outcome of cancelled import {:?}", outcome.ticket);
            None
        }
    }
}

impl Drop for Importer {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Add each definition to the list in order, returning the assigned indices
pub fn apply_definitions<H: VisualHost>(
    list: &mut Listbox<H, Definition>,
    definitions: Vec<Definition>,
) -> Vec<usize> {
    definitions
        .into_iter()
        .map(|definition| {
            let name = definition.name.clone();
            list.add(&name, definition)
        })
        .collect()
}
