use store::{FingerprintStore, InsertAck, StoreError};

use crate::api::{
    COLLECT_ACK_MESSAGE, INTERNAL_ERROR_MESSAGE, MALFORMED_PAYLOAD_MESSAGE,
    METHOD_NOT_ALLOWED_MESSAGE,
};

use super::{CollectorRuntime, HttpRequest, HttpResponse};

#[derive(Debug)]
pub(crate) enum CollectOutcome {
    Stored(InsertAck),
    MethodNotAllowed,
    MalformedPayload(serde_json::Error),
    StorageFailed(StoreError),
}

impl CollectOutcome {
    fn into_response(self) -> HttpResponse {
        match self {
            Self::Stored(_) => HttpResponse::ok_text(COLLECT_ACK_MESSAGE),
            Self::MethodNotAllowed => HttpResponse::method_not_allowed(METHOD_NOT_ALLOWED_MESSAGE),
            Self::MalformedPayload(_) => HttpResponse::bad_request(MALFORMED_PAYLOAD_MESSAGE),
            Self::StorageFailed(_) => HttpResponse::internal_server_error(INTERNAL_ERROR_MESSAGE),
        }
    }
}

/// Stores the request body verbatim-as-JSON. The method check comes before
/// any body parsing, and nothing is written unless the body is valid JSON.
pub(crate) fn collect_fingerprint(
    store: &dyn FingerprintStore,
    request: &HttpRequest,
) -> CollectOutcome {
    if request.method != "POST" {
        return CollectOutcome::MethodNotAllowed;
    }
    let payload = match serde_json::from_slice::<serde_json::Value>(&request.body) {
        Ok(payload) => payload,
        Err(err) => return CollectOutcome::MalformedPayload(err),
    };
    match store.insert(&payload.to_string()) {
        Ok(ack) => CollectOutcome::Stored(ack),
        Err(err) => CollectOutcome::StorageFailed(err),
    }
}

pub(super) fn handle_collect(runtime: &CollectorRuntime, request: &HttpRequest) -> HttpResponse {
    let outcome = collect_fingerprint(runtime.store(), request);
    match &outcome {
        CollectOutcome::Stored(ack) => {
            tracing::info!(id = ack.id, bytes = request.body.len(), "fingerprint stored");
        }
        CollectOutcome::MethodNotAllowed => {
            tracing::debug!(method = %request.method, "collect called with non-POST method");
        }
        CollectOutcome::MalformedPayload(err) => {
            tracing::warn!(error = %err, "collect body is not valid JSON");
        }
        CollectOutcome::StorageFailed(err) => {
            tracing::error!(error = %err, "storing fingerprint failed");
        }
    }
    outcome.into_response()
}
