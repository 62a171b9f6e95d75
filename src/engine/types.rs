// src/engine/types.rs — Run domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::infra::config::RunDefaults;
use crate::infra::errors::EngineError;

/// Unvalidated run input as supplied by clients. Unset knobs fall back to
/// the configured defaults during [`RunInput::validate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunInput {
    #[serde(alias = "func")]
    pub expr: String,
    pub a: f64,
    pub b: f64,
    pub eps: Option<f64>,
    pub delta: Option<f64>,
    pub max_iter: Option<u32>,
}

impl RunInput {
    /// Check the interval and knobs, filling gaps from `defaults`.
    ///
    /// Explicitly supplied garbage is rejected rather than silently replaced.
    pub fn validate(self, defaults: &RunDefaults) -> Result<RunParams, EngineError> {
        if !self.a.is_finite() || !self.b.is_finite() || self.a >= self.b {
            return Err(EngineError::InvalidParams(format!(
                "interval requires finite a < b, got [{}, {}]",
                self.a, self.b
            )));
        }
        let width = self.b - self.a;

        let eps = self.eps.unwrap_or(defaults.eps);
        if !eps.is_finite() || eps <= 0.0 {
            return Err(EngineError::InvalidParams(format!(
                "eps must be positive, got {eps}"
            )));
        }

        let delta = match self.delta {
            Some(d) => {
                if !d.is_finite() || d <= 0.0 || d >= width {
                    return Err(EngineError::InvalidParams(format!(
                        "delta must satisfy 0 < delta < b - a, got {d}"
                    )));
                }
                d
            }
            // eps/2, clamped so degenerate intervals stay inside 0 < delta < b - a
            None => (eps / 2.0).min(width / 2.0),
        };

        let max_iter = self.max_iter.unwrap_or(defaults.max_iter);
        if max_iter == 0 {
            return Err(EngineError::InvalidParams(
                "maxIter must be positive".into(),
            ));
        }

        Ok(RunParams {
            expr: self.expr,
            a: self.a,
            b: self.b,
            eps,
            delta,
            max_iter,
        })
    }
}

/// Fully validated parameters a run executes with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunParams {
    pub expr: String,
    pub a: f64,
    pub b: f64,
    pub eps: f64,
    pub delta: f64,
    pub max_iter: u32,
}

/// One accepted step of the narrowing loop. `a` and `b` are the interval
/// after the step, `x_mid`/`fx_mid` the current best estimate, `len` the
/// remaining width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationRecord {
    pub k: u32,
    pub a: f64,
    pub b: f64,
    pub x_mid: f64,
    pub fx_mid: f64,
    pub len: f64,
}

/// Lifecycle state of a run. Exactly one transition out of `Running`
/// happens per run, after which the state is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Converged,
    Stopped,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

/// Why a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Converged,
    Stopped,
    Failed { message: String },
}

impl RunOutcome {
    pub fn status(&self) -> RunStatus {
        match self {
            RunOutcome::Converged => RunStatus::Converged,
            RunOutcome::Stopped => RunStatus::Stopped,
            RunOutcome::Failed { .. } => RunStatus::Failed,
        }
    }
}

/// Progress event fanned out to live subscribers. Every stream ends with
/// exactly one of `Stopped`, `Error` or `Done`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    Start { run_id: String },
    Iteration { iter: IterationRecord },
    Stopped,
    Error { message: String },
    Done { x: f64, fx: f64 },
}

impl RunEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunEvent::Stopped | RunEvent::Error { .. } | RunEvent::Done { .. }
        )
    }
}

/// Immutable view of a run's current state, cheap enough to hand to HTTP
/// pollers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    pub id: String,
    pub params: RunParams,
    pub status: RunStatus,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub iterations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<IterationRecord>,
    pub created_at: DateTime<Utc>,
}
