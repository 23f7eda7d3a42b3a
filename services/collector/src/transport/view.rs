use auth::{AuthDecision, authorize_bearer_header};
use store::{StoreError, StoredFingerprint};

use crate::api::{INTERNAL_ERROR_MESSAGE, UNAUTHORIZED_MESSAGE};

use super::{CollectorRuntime, HttpRequest, HttpResponse};

#[derive(Debug)]
pub(crate) enum ViewOutcome {
    Records(Vec<StoredFingerprint>),
    Unauthorized(&'static str),
    StorageFailed(StoreError),
}

impl ViewOutcome {
    fn into_response(self) -> HttpResponse {
        match self {
            Self::Records(rows) => match serde_json::to_string(&rows) {
                Ok(body) => HttpResponse::ok_json(body),
                Err(err) => {
                    tracing::error!(error = %err, "rendering fingerprint rows failed");
                    HttpResponse::internal_server_error(INTERNAL_ERROR_MESSAGE)
                }
            },
            Self::Unauthorized(_) => HttpResponse::unauthorized(UNAUTHORIZED_MESSAGE),
            Self::StorageFailed(_) => HttpResponse::internal_server_error(INTERNAL_ERROR_MESSAGE),
        }
    }
}

/// Authorization runs first; the store is only scanned for an exact
/// `Bearer <secret>` match.
pub(crate) fn view_fingerprints(runtime: &CollectorRuntime, request: &HttpRequest) -> ViewOutcome {
    if let AuthDecision::Unauthorized(reason) =
        authorize_bearer_header(request.header("authorization"), runtime.secret())
    {
        return ViewOutcome::Unauthorized(reason);
    }
    match runtime.store().select_all() {
        Ok(rows) => ViewOutcome::Records(rows),
        Err(err) => ViewOutcome::StorageFailed(err),
    }
}

pub(super) fn handle_view(runtime: &CollectorRuntime, request: &HttpRequest) -> HttpResponse {
    let outcome = view_fingerprints(runtime, request);
    match &outcome {
        ViewOutcome::Records(rows) => {
            tracing::info!(rows = rows.len(), "fingerprints listed");
        }
        ViewOutcome::Unauthorized(reason) => {
            tracing::warn!(reason, "view request rejected");
        }
        ViewOutcome::StorageFailed(err) => {
            tracing::error!(error = %err, "reading fingerprints failed");
        }
    }
    outcome.into_response()
}
