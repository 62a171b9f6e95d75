// src/api/handlers.rs

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse};
use axum::Json;
use futures::Stream;

use crate::api::{index, types::*, ApiState};
use crate::engine::types::{IterationRecord, RunInput, RunSnapshot};
use crate::infra::errors::EngineError;

fn error_response(err: EngineError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        EngineError::InvalidParams(_) | EngineError::InvalidExpression(_) => {
            StatusCode::BAD_REQUEST
        }
        EngineError::UnknownRun(_) => StatusCode::NOT_FOUND,
        EngineError::DuplicateRun(_) => StatusCode::CONFLICT,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// GET / — Embedded single-page UI.
pub async fn index_page() -> Html<&'static str> {
    Html(index::INDEX_HTML)
}

/// POST /api/v1/runs — Validate and start a run; returns its id and a
/// preview curve of f over [a, b].
pub async fn start_run(
    State(state): State<ApiState>,
    Json(body): Json<RunInput>,
) -> Result<(StatusCode, Json<RunCreatedResponse>), (StatusCode, Json<ErrorResponse>)> {
    let started = state.engine.start_run(body).map_err(error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(RunCreatedResponse {
            id: started.id,
            curve: started.curve,
        }),
    ))
}

/// GET /api/v1/runs/{id} — Poll a run's current state.
pub async fn get_run(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<RunSnapshot>, (StatusCode, Json<ErrorResponse>)> {
    let snapshot = state.engine.snapshot(&id).map_err(error_response)?;
    Ok(Json(snapshot))
}

/// POST /api/v1/runs/{id}/stop — Request cooperative cancellation. The run
/// stops at the next iteration boundary.
pub async fn stop_run(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<StopResponse>, (StatusCode, Json<ErrorResponse>)> {
    state.engine.request_stop(&id).map_err(error_response)?;

    Ok(Json(StopResponse {
        id,
        status: "stop_requested".into(),
    }))
}

/// GET /api/v1/runs/{id}/history — All accepted iterations so far.
pub async fn get_history(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<IterationRecord>>, (StatusCode, Json<ErrorResponse>)> {
    let history = state.engine.history(&id).map_err(error_response)?;
    Ok(Json(history))
}

/// GET /api/v1/runs/{id}/export — Iteration history as a CSV download.
pub async fn export_csv(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let history = state.engine.history(&id).map_err(error_response)?;

    let mut csv = String::from("k,a,b,mid,f(mid),b-a\n");
    for rec in &history {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            rec.k, rec.a, rec.b, rec.x_mid, rec.fx_mid, rec.len
        ));
    }

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"run_{id}.csv\""),
        ),
    ];
    Ok((headers, csv))
}

/// GET /api/v1/runs/{id}/events — Live run progress as SSE. The stream ends
/// after the terminal event.
pub async fn stream_events(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, Json<ErrorResponse>)>
{
    let mut subscription = state.engine.subscribe(&id).map_err(error_response)?;

    let stream = async_stream::stream! {
        while let Some(event) = subscription.recv().await {
            yield Ok(Event::default().data(serde_json::to_string(&event).unwrap_or_default()));
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// GET /api/v1/health — Liveness probe.
pub async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "runs": state.engine.run_count(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_map_to_bad_request() {
        let (status, _) = error_response(EngineError::InvalidParams("a >= b".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = error_response(EngineError::InvalidExpression("x +".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_lookup_errors_map_to_their_statuses() {
        let (status, Json(body)) = error_response(EngineError::UnknownRun("r1".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.error.contains("r1"));

        let (status, _) = error_response(EngineError::DuplicateRun("r1".into()));
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
