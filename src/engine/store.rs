// src/engine/store.rs — Authoritative per-run state

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use super::types::{IterationRecord, RunOutcome, RunParams, RunSnapshot, RunStatus};
use crate::infra::errors::EngineError;

/// Everything the engine remembers about one run.
#[derive(Debug)]
struct RunState {
    params: RunParams,
    created_at: DateTime<Utc>,
    history: Vec<IterationRecord>,
    last: Option<IterationRecord>,
    status: RunStatus,
    error: Option<String>,
    cancel: CancellationToken,
}

/// In-memory run registry shared between HTTP handlers and run tasks.
///
/// A single coarse lock guards the whole map. Every write is tiny (push one
/// record, flip a status) and readers clone data out, so contention stays
/// negligible next to expression evaluation.
#[derive(Debug, Default)]
pub struct RunStore {
    runs: Mutex<HashMap<String, RunState>>,
}

impl RunStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RunState>> {
        // A poisoned lock still holds a consistent map; every mutation is a
        // single lock hold.
        self.runs.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a new run in `Running` state.
    pub fn create(
        &self,
        id: &str,
        params: RunParams,
        cancel: CancellationToken,
    ) -> Result<(), EngineError> {
        let mut runs = self.lock();
        if runs.contains_key(id) {
            return Err(EngineError::DuplicateRun(id.to_string()));
        }
        runs.insert(
            id.to_string(),
            RunState {
                params,
                created_at: Utc::now(),
                history: Vec::new(),
                last: None,
                status: RunStatus::Running,
                error: None,
                cancel,
            },
        );
        Ok(())
    }

    pub fn snapshot(&self, id: &str) -> Option<RunSnapshot> {
        let runs = self.lock();
        runs.get(id).map(|run| RunSnapshot {
            id: id.to_string(),
            params: run.params.clone(),
            status: run.status,
            done: run.status.is_terminal(),
            error: run.error.clone(),
            iterations: run.history.len(),
            last: run.last,
            created_at: run.created_at,
        })
    }

    pub fn history(&self, id: &str) -> Option<Vec<IterationRecord>> {
        self.lock().get(id).map(|run| run.history.clone())
    }

    pub fn status(&self, id: &str) -> Option<RunStatus> {
        self.lock().get(id).map(|run| run.status)
    }

    /// Append one iteration. Appends after the terminal transition are
    /// dropped, so a racing run task cannot grow a frozen history.
    pub fn append_iteration(
        &self,
        id: &str,
        record: IterationRecord,
    ) -> Result<(), EngineError> {
        let mut runs = self.lock();
        let run = runs
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownRun(id.to_string()))?;
        if run.status.is_terminal() {
            return Ok(());
        }
        run.history.push(record);
        run.last = Some(record);
        Ok(())
    }

    /// Transition a run out of `Running`. Returns false when the run was
    /// already terminal, in which case nothing changes.
    pub fn mark_terminal(&self, id: &str, outcome: RunOutcome) -> Result<bool, EngineError> {
        let mut runs = self.lock();
        let run = runs
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownRun(id.to_string()))?;
        if run.status.is_terminal() {
            return Ok(false);
        }
        run.status = outcome.status();
        if let RunOutcome::Failed { message } = outcome {
            run.error = Some(message);
        }
        Ok(true)
    }

    /// Flag the run's cancellation token. Idempotent; a terminal run accepts
    /// the request and nothing further happens.
    pub fn request_cancel(&self, id: &str) -> Result<(), EngineError> {
        let runs = self.lock();
        let run = runs
            .get(id)
            .ok_or_else(|| EngineError::UnknownRun(id.to_string()))?;
        run.cancel.cancel();
        Ok(())
    }

    pub fn run_count(&self) -> usize {
        self.lock().len()
    }
}
