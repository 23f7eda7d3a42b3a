use std::{collections::HashMap, sync::Arc};

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::State,
    http::{HeaderName, HeaderValue, Request, Response, StatusCode, header::CONTENT_TYPE},
    response::IntoResponse,
    routing::any,
};

use crate::transport::{CollectorRuntime, HttpRequest, HttpResponse, SharedRuntime, handle_request};

const MAX_HTTP_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
struct AppState {
    runtime: SharedRuntime,
}

pub fn serve_http_with_axum(
    runtime: CollectorRuntime,
    bind_addr: &str,
    worker_threads: usize,
) -> Result<(), String> {
    let worker_threads = worker_threads.max(1);
    let tokio_runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build tokio runtime: {e}"))?;

    let bind_addr = bind_addr.to_string();
    tokio_runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| format!("failed to bind {bind_addr}: {e}"))?;
        tracing::info!(%bind_addr, worker_threads, "axum transport accepting connections");

        axum::serve(listener, router(Arc::new(runtime)))
            .await
            .map_err(|e| format!("axum server failed: {e}"))
    })
}

/// Single fallback route; path matching stays in the transport-neutral router.
fn router(runtime: SharedRuntime) -> Router {
    Router::new()
        .fallback(any(dispatch))
        .with_state(AppState { runtime })
        .layer(axum::extract::DefaultBodyLimit::max(MAX_HTTP_BODY_BYTES))
}

async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> impl IntoResponse {
    let method = request.method().to_string();
    let target = request
        .uri()
        .path_and_query()
        .map(|value| value.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    // UTF-8 decode so non-ASCII credentials compare the same as on the std transport.
    let mut headers = HashMap::new();
    for (name, value) in request.headers() {
        headers.insert(
            name.as_str().to_ascii_lowercase(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        );
    }

    let body = match to_bytes(request.into_body(), MAX_HTTP_BODY_BYTES).await {
        Ok(bytes) => bytes.to_vec(),
        Err(err) => {
            tracing::debug!(error = %err, "rejecting unreadable request body");
            return response_from_transport(HttpResponse::bad_request("request body error"));
        }
    };

    let request = HttpRequest {
        method,
        target,
        headers,
        body,
    };

    let runtime = Arc::clone(&state.runtime);
    let response =
        match tokio::task::spawn_blocking(move || handle_request(&runtime, &request)).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(error = %err, "request handler task failed");
                HttpResponse::internal_server_error(crate::api::INTERNAL_ERROR_MESSAGE)
            }
        };
    response_from_transport(response)
}

fn response_from_transport(response: HttpResponse) -> Response<Body> {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut out = Response::new(Body::from(response.body));
    *out.status_mut() = status;
    if status != StatusCode::NO_CONTENT {
        out.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(response.content_type));
    }
    for (name, value) in response.headers {
        out.headers_mut()
            .insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::BearerSecret;
    use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION};
    use store::{FingerprintStore, InMemoryStore};

    fn sample_state() -> (AppState, Arc<InMemoryStore>) {
        state_with_secret("s3cr3t")
    }

    fn state_with_secret(secret: &str) -> (AppState, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let runtime = CollectorRuntime::new(
            BearerSecret::new(secret).unwrap(),
            Arc::clone(&store) as Arc<dyn FingerprintStore>,
        );
        (
            AppState {
                runtime: Arc::new(runtime),
            },
            store,
        )
    }

    async fn body_text(response: Response<Body>) -> String {
        let bytes = to_bytes(response.into_body(), MAX_HTTP_BODY_BYTES)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn dispatch_serves_fingerprint_script_with_cors_header() {
        let (state, _) = sample_state();
        let request = Request::builder()
            .method("GET")
            .uri("/fingerprint.js")
            .body(Body::empty())
            .unwrap();
        let response = dispatch(State(state), request).await.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/javascript"
        );
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
        let body = body_text(response).await;
        assert!(body.contains("fetch('/collect'"));
    }

    #[tokio::test]
    async fn dispatch_collect_then_view_round_trips_payload() {
        let (state, store) = sample_state();

        let collect = Request::builder()
            .method("POST")
            .uri("/collect")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"userAgent":"x"}"#))
            .unwrap();
        let response = dispatch(State(state.clone()), collect)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Fingerprint salvo");
        assert_eq!(store.len().unwrap(), 1);

        let view = Request::builder()
            .method("GET")
            .uri("/view")
            .header(AUTHORIZATION, "Bearer s3cr3t")
            .body(Body::empty())
            .unwrap();
        let response = dispatch(State(state), view).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let rows: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        let data: serde_json::Value =
            serde_json::from_str(rows[0]["data"].as_str().unwrap()).unwrap();
        assert_eq!(data, serde_json::json!({"userAgent": "x"}));
    }

    #[tokio::test]
    async fn dispatch_view_with_wrong_token_is_unauthorized() {
        let (state, _) = sample_state();
        let request = Request::builder()
            .method("GET")
            .uri("/view")
            .header(AUTHORIZATION, "Bearer wrong")
            .body(Body::empty())
            .unwrap();
        let response = dispatch(State(state), request).await.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_text(response).await, "Não autorizado");
    }

    #[tokio::test]
    async fn dispatch_options_returns_preflight_without_content_type() {
        let (state, _) = sample_state();
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/anything")
            .body(Body::empty())
            .unwrap();
        let response = dispatch(State(state), request).await.into_response();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(
            response.headers().get("access-control-allow-methods").unwrap(),
            "GET, POST, OPTIONS"
        );
    }

    #[tokio::test]
    async fn dispatch_view_authorizes_non_ascii_secret() {
        let (state, _) = state_with_secret("senha-ç");
        let request = Request::builder()
            .method("GET")
            .uri("/view")
            .header(
                AUTHORIZATION,
                HeaderValue::from_bytes("Bearer senha-ç".as_bytes()).unwrap(),
            )
            .body(Body::empty())
            .unwrap();
        let response = dispatch(State(state.clone()), request)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "[]");

        let request = Request::builder()
            .method("GET")
            .uri("/view")
            .header(
                AUTHORIZATION,
                HeaderValue::from_bytes("Bearer senha-c".as_bytes()).unwrap(),
            )
            .body(Body::empty())
            .unwrap();
        let response = dispatch(State(state), request).await.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
