use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::Instrument;

use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::quoting::{Outcome, PipelineError};
use crate::resilience::RequestContext;

/// `GET /cotacao`: fetch, store and return the current bid.
pub async fn get_quotation(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let started = Instant::now();
    let request_id = request_id(&headers);

    // Held until this handler returns. If hyper drops the handler because the
    // client disconnected, or the outer timeout fires, the handle drops with
    // it and the pipeline sees the cancellation.
    let (ctx, _cancel) = RequestContext::new();

    let engine = state.engine.clone();
    let span = tracing::info_span!("quotation", request_id = %request_id);
    let pipeline = tokio::spawn(async move { engine.handle(&ctx).await }.instrument(span));

    let outcome = match pipeline.await {
        Ok(outcome) => outcome,
        Err(e) => Outcome::InternalError(PipelineError::Task(e.to_string())),
    };

    let elapsed_ms = millis_since(started);
    match &outcome {
        Outcome::Success { stored_id, .. } => {
            tracing::info!(request_id = %request_id, stored_id, elapsed_ms, "Quotation served");
        }
        Outcome::UpstreamTimeout | Outcome::StorageTimeout => {
            tracing::warn!(request_id = %request_id, outcome = outcome.label(), elapsed_ms, "Quotation timed out");
        }
        Outcome::ClientCancelled => {
            tracing::info!(request_id = %request_id, elapsed_ms, "Request cancelled by the client");
        }
        Outcome::InternalError(err) => escalate(&state, &request_id, err),
    }

    outcome.into_response()
}

fn millis_since(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Report an internal error. Stops the server when the fault policy asks for it.
fn escalate(state: &AppState, request_id: &str, err: &PipelineError) {
    tracing::error!(
        request_id = %request_id,
        stage = err.stage(),
        error = %err,
        "Quotation pipeline failed"
    );
    metrics::record_internal_error(err.stage());

    if state.fault_policy.shutdown_on_internal_error {
        tracing::error!(request_id = %request_id, "Fault policy requires shutdown");
        state.shutdown.trigger_fatal(err.to_string());
    }
}
