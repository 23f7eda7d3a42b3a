use crate::api::{
    COLLECT_PATH, FINGERPRINT_SCRIPT, FINGERPRINT_SCRIPT_PATH, ROUTE_NOT_FOUND_MESSAGE, VIEW_PATH,
};

use super::{
    CollectorRuntime, HttpRequest, HttpResponse, collect::handle_collect, request::request_path,
    view::handle_view,
};

const PREFLIGHT_METHOD: &str = "OPTIONS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Route {
    Preflight,
    FingerprintScript,
    Collect,
    View,
    NotFound,
}

impl Route {
    /// Pre-flight wins over every path; otherwise the path alone picks the
    /// handler and each handler owns its own method rules.
    pub(crate) fn resolve(method: &str, path: &str) -> Self {
        if method == PREFLIGHT_METHOD {
            return Self::Preflight;
        }
        match path {
            FINGERPRINT_SCRIPT_PATH => Self::FingerprintScript,
            COLLECT_PATH => Self::Collect,
            VIEW_PATH => Self::View,
            _ => Self::NotFound,
        }
    }
}

pub(crate) fn handle_request(runtime: &CollectorRuntime, request: &HttpRequest) -> HttpResponse {
    let path = request_path(&request.target);
    let route = Route::resolve(&request.method, path);
    tracing::debug!(method = %request.method, path, ?route, "dispatching request");
    match route {
        Route::Preflight => HttpResponse::preflight(),
        Route::FingerprintScript => HttpResponse::ok_javascript(FINGERPRINT_SCRIPT),
        Route::Collect => handle_collect(runtime, request),
        Route::View => handle_view(runtime, request),
        Route::NotFound => HttpResponse::not_found(ROUTE_NOT_FOUND_MESSAGE),
    }
}
