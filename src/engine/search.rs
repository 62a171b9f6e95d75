// src/engine/search.rs — Bisection-with-offset line search
//
// Classic dichotomy minimization: two probes straddle the interval center
// by delta/2; the half that cannot contain the minimum of a unimodal f is
// discarded. Each step multiplies the width w by (w + delta)/(2w), so
// delta < b - a is preserved throughout and the width shrinks toward delta.

use super::types::IterationRecord;
use crate::expr::{EvalError, Evaluable};

/// Sink verdict after each produced iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepSignal {
    Continue,
    StopRequested,
}

/// How a search ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Width target reached, or the iteration bound was exhausted.
    Converged,
    /// The sink asked to stop; iterations before the signal stand.
    Stopped,
    /// An evaluation failed; iterations before the failure stand.
    EvalFailed(EvalError),
}

/// Minimize `f` on `[a, b]`, reporting each accepted step to `sink`.
///
/// Returns the last accepted record (None when the interval was already
/// narrow enough) together with the outcome. The sink is called exactly
/// once per record, in order, before the next step begins.
pub fn minimize(
    f: &dyn Evaluable,
    a0: f64,
    b0: f64,
    eps: f64,
    delta: f64,
    max_iter: u32,
    mut sink: impl FnMut(&IterationRecord) -> StepSignal,
) -> (Option<IterationRecord>, SearchOutcome) {
    let mut a = a0;
    let mut b = b0;
    let mut last: Option<IterationRecord> = None;

    for k in 1..=max_iter {
        if (b - a) / 2.0 <= eps {
            break;
        }

        let x1 = (a + b - delta) / 2.0;
        let x2 = (a + b + delta) / 2.0;

        let fx1 = match f.eval(x1) {
            Ok(v) => v,
            Err(e) => return (last, SearchOutcome::EvalFailed(e)),
        };
        let fx2 = match f.eval(x2) {
            Ok(v) => v,
            Err(e) => return (last, SearchOutcome::EvalFailed(e)),
        };

        // Ties keep the left half.
        if fx1 <= fx2 {
            b = x2;
        } else {
            a = x1;
        }

        let x_mid = (a + b) / 2.0;
        let fx_mid = match f.eval(x_mid) {
            Ok(v) => v,
            Err(e) => return (last, SearchOutcome::EvalFailed(e)),
        };

        let record = IterationRecord {
            k,
            a,
            b,
            x_mid,
            fx_mid,
            len: b - a,
        };
        last = Some(record);

        if sink(&record) == StepSignal::StopRequested {
            return (last, SearchOutcome::Stopped);
        }
    }

    (last, SearchOutcome::Converged)
}
