// src/engine/runner.rs — Run orchestration
//
// One background task per run drives the search; HTTP handlers talk to the
// store and hub only through [`Engine`]. Runs are fire-and-forget: nothing
// joins the task, the store carries its result.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::hub::{EventHub, Subscription};
use super::sample::{sample_curve, SampleCurve};
use super::search::{minimize, SearchOutcome, StepSignal};
use super::store::RunStore;
use super::types::{IterationRecord, RunEvent, RunInput, RunOutcome, RunParams, RunSnapshot};
use crate::expr::{CompiledExpr, Evaluable};
use crate::infra::config::RunDefaults;
use crate::infra::errors::EngineError;

/// Handle returned to the caller of [`Engine::start_run`].
#[derive(Debug, Clone)]
pub struct StartedRun {
    pub id: String,
    pub curve: SampleCurve,
}

/// Front door of the engine: creates runs, wires their collaborators and
/// answers queries about them.
pub struct Engine {
    store: Arc<RunStore>,
    hub: Arc<EventHub>,
    defaults: RunDefaults,
}

impl Engine {
    pub fn new(store: Arc<RunStore>, hub: Arc<EventHub>, defaults: RunDefaults) -> Self {
        Self {
            store,
            hub,
            defaults,
        }
    }

    /// Validate, compile and launch a run.
    ///
    /// All rejections happen here, synchronously; once an id is returned the
    /// run exists, is observable and executes to a terminal state.
    pub fn start_run(&self, input: RunInput) -> Result<StartedRun, EngineError> {
        let params = input.validate(&self.defaults)?;
        let f = CompiledExpr::compile(&params.expr)
            .map_err(|e| EngineError::InvalidExpression(e.to_string()))?;
        self.start_run_with(params, Arc::new(f))
    }

    /// Launch a run over an already-built function. Embedders and tests use
    /// this to supply functions that are not Rhai expressions.
    pub fn start_run_with(
        &self,
        params: RunParams,
        f: Arc<dyn Evaluable>,
    ) -> Result<StartedRun, EngineError> {
        let id = uuid::Uuid::new_v4().to_string();
        let curve = sample_curve(f.as_ref(), params.a, params.b, self.defaults.sample_points);

        let token = CancellationToken::new();
        self.store.create(&id, params.clone(), token.clone())?;
        self.hub.open(&id);
        // Start goes out before the task exists, so no task event can precede it.
        self.hub.publish(&id, &RunEvent::Start { run_id: id.clone() });
        tracing::info!(run_id = %id, expr = %params.expr, a = params.a, b = params.b, "run started");

        let store = Arc::clone(&self.store);
        let hub = Arc::clone(&self.hub);
        let run_id = id.clone();
        tokio::task::spawn_blocking(move || execute_run(store, hub, run_id, params, f, token));

        Ok(StartedRun { id, curve })
    }

    /// Ask a run to stop after the iteration in flight. Idempotent; stopping
    /// a finished run changes nothing.
    pub fn request_stop(&self, id: &str) -> Result<(), EngineError> {
        self.store.request_cancel(id)?;
        tracing::info!(run_id = %id, "stop requested");
        Ok(())
    }

    pub fn snapshot(&self, id: &str) -> Result<RunSnapshot, EngineError> {
        self.store
            .snapshot(id)
            .ok_or_else(|| EngineError::UnknownRun(id.to_string()))
    }

    pub fn history(&self, id: &str) -> Result<Vec<IterationRecord>, EngineError> {
        self.store
            .history(id)
            .ok_or_else(|| EngineError::UnknownRun(id.to_string()))
    }

    /// Attach to a run's live event feed.
    pub fn subscribe(&self, id: &str) -> Result<Subscription, EngineError> {
        self.hub
            .subscribe(id)
            .ok_or_else(|| EngineError::UnknownRun(id.to_string()))
    }

    pub fn run_count(&self) -> usize {
        self.store.run_count()
    }
}

/// Body of the per-run background task. Runs on the blocking pool since the
/// search loop is pure CPU.
fn execute_run(
    store: Arc<RunStore>,
    hub: Arc<EventHub>,
    id: String,
    params: RunParams,
    f: Arc<dyn Evaluable>,
    token: CancellationToken,
) {
    // Cancellation is observed between iterations: the step that sees the
    // flag is neither recorded nor published.
    let sink = |record: &IterationRecord| {
        if token.is_cancelled() {
            return StepSignal::StopRequested;
        }
        if let Err(e) = store.append_iteration(&id, *record) {
            tracing::warn!(run_id = %id, error = %e, "append failed, stopping run");
            return StepSignal::StopRequested;
        }
        hub.publish(&id, &RunEvent::Iteration { iter: *record });
        tracing::debug!(run_id = %id, k = record.k, len = record.len, "iteration");
        StepSignal::Continue
    };

    let (last, outcome) = minimize(
        f.as_ref(),
        params.a,
        params.b,
        params.eps,
        params.delta,
        params.max_iter,
        sink,
    );

    let (outcome, event) = conclude(&params, f.as_ref(), last, outcome);

    match store.mark_terminal(&id, outcome.clone()) {
        Ok(true) => {
            let iterations = iterations_kept(last, &outcome);
            tracing::info!(run_id = %id, status = ?outcome.status(), iterations, "run finished");
            hub.publish(&id, &event);
        }
        Ok(false) => {
            tracing::warn!(run_id = %id, "run already terminal, result discarded");
        }
        Err(e) => {
            tracing::warn!(run_id = %id, error = %e, "run vanished before completion");
        }
    }
    hub.close(&id);
}

/// Map a finished search onto the run's terminal outcome and event.
fn conclude(
    params: &RunParams,
    f: &dyn Evaluable,
    last: Option<IterationRecord>,
    outcome: SearchOutcome,
) -> (RunOutcome, RunEvent) {
    match outcome {
        SearchOutcome::Stopped => (RunOutcome::Stopped, RunEvent::Stopped),
        SearchOutcome::EvalFailed(e) => failed(e.to_string()),
        SearchOutcome::Converged => match last {
            Some(rec) => (
                RunOutcome::Converged,
                RunEvent::Done {
                    x: rec.x_mid,
                    fx: rec.fx_mid,
                },
            ),
            // Zero iterations: the interval started narrow enough. One
            // evaluation supplies the result payload.
            None => {
                let x = (params.a + params.b) / 2.0;
                match f.eval(x) {
                    Ok(fx) => (RunOutcome::Converged, RunEvent::Done { x, fx }),
                    Err(e) => failed(e.to_string()),
                }
            }
        },
    }
}

fn failed(message: String) -> (RunOutcome, RunEvent) {
    (
        RunOutcome::Failed {
            message: message.clone(),
        },
        RunEvent::Error { message },
    )
}

/// Number of iterations the store kept. A stop is observed by the sink
/// before the append, so the record that saw it is never stored.
fn iterations_kept(last: Option<IterationRecord>, outcome: &RunOutcome) -> u32 {
    match (last, outcome) {
        (None, _) => 0,
        (Some(rec), RunOutcome::Stopped) => rec.k - 1,
        (Some(rec), _) => rec.k,
    }
}
