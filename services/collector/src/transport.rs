use std::{collections::HashMap, net::TcpStream, sync::Arc, time::Duration};

use auth::BearerSecret;
use store::{FingerprintStore, StoreError};

use crate::config::CollectorConfig;

mod collect;
mod http;
mod request;
mod routes;
mod server_runtime;
mod view;

pub(crate) use http::{HttpRequest, HttpResponse};
pub(crate) use routes::handle_request;

use http::{render_response, write_response};
use request::{content_length, parse_header_line, parse_request_line, read_http_request};

const MAX_HTTP_BODY_BYTES: usize = 1024 * 1024;
const SOCKET_TIMEOUT_SECS: u64 = 5;

/// Read-only state every request sees: the bearer secret and the storage
/// handle. Built once at startup; handlers never mutate it.
pub struct CollectorRuntime {
    secret: BearerSecret,
    store: Arc<dyn FingerprintStore>,
}

pub type SharedRuntime = Arc<CollectorRuntime>;

impl CollectorRuntime {
    pub fn new(secret: BearerSecret, store: Arc<dyn FingerprintStore>) -> Self {
        Self { secret, store }
    }

    pub fn from_config(config: &CollectorConfig) -> Result<Self, StoreError> {
        Ok(Self::new(config.secret.clone(), config.open_store()?))
    }

    pub fn store(&self) -> &dyn FingerprintStore {
        self.store.as_ref()
    }

    pub(crate) fn secret(&self) -> &BearerSecret {
        &self.secret
    }
}

pub fn serve_http_with_workers(
    runtime: CollectorRuntime,
    bind_addr: &str,
    worker_count: usize,
    queue_capacity: usize,
) -> std::io::Result<()> {
    server_runtime::serve_http_with_workers(
        Arc::new(runtime),
        bind_addr,
        worker_count,
        queue_capacity,
    )
}

/// Runs one complete raw HTTP/1.1 request through the router and returns the
/// rendered response bytes.
pub fn handle_http_request_bytes(
    runtime: &CollectorRuntime,
    raw_request: &[u8],
) -> Result<Vec<u8>, String> {
    let split_at = raw_request
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .ok_or_else(|| "missing HTTP header terminator".to_string())?;
    let (header_block, body) = (&raw_request[..split_at], &raw_request[split_at + 4..]);
    let header_block = std::str::from_utf8(header_block)
        .map_err(|_| "request headers must be valid UTF-8".to_string())?;

    let mut lines = header_block.split("\r\n");
    let request_line = lines
        .next()
        .ok_or_else(|| "missing request line".to_string())?;
    let (method, target) = parse_request_line(request_line)?;

    let mut headers = HashMap::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let (name, value) = parse_header_line(line)?;
        headers.insert(name, value);
    }

    if content_length(&headers)? != body.len() {
        return Err("content-length does not match body size".to_string());
    }

    let request = HttpRequest {
        method,
        target,
        headers,
        body: body.to_vec(),
    };
    let response = handle_request(runtime, &request);
    Ok(render_response(&response))
}

fn handle_connection(runtime: &CollectorRuntime, mut stream: TcpStream) -> std::io::Result<()> {
    stream.set_read_timeout(Some(Duration::from_secs(SOCKET_TIMEOUT_SECS)))?;
    stream.set_write_timeout(Some(Duration::from_secs(SOCKET_TIMEOUT_SECS)))?;

    let request = match read_http_request(&mut stream) {
        Ok(Some(request)) => request,
        Ok(None) => return Ok(()),
        Err(err) => {
            tracing::debug!(error = %err, "rejecting unparseable request");
            return write_response(&mut stream, &HttpResponse::bad_request(&err));
        }
    };

    let response = handle_request(runtime, &request);
    write_response(&mut stream, &response)
}
