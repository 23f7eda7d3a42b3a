use std::{collections::HashMap, io::Write, net::TcpStream, time::Duration};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HttpRequest {
    pub(crate) method: String,
    pub(crate) target: String,
    /// Header names are stored lower-cased.
    pub(crate) headers: HashMap<String, String>,
    pub(crate) body: Vec<u8>,
}

impl HttpRequest {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HttpResponse {
    pub(crate) status: u16,
    pub(crate) content_type: &'static str,
    /// Extra headers; names must be lower-case.
    pub(crate) headers: Vec<(&'static str, &'static str)>,
    pub(crate) body: String,
}

impl HttpResponse {
    fn text(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: TEXT_PLAIN,
            headers: Vec::new(),
            body: message.to_string(),
        }
    }

    pub(crate) fn ok_text(message: &str) -> Self {
        Self::text(200, message)
    }

    pub(crate) fn ok_json(body: String) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            headers: Vec::new(),
            body,
        }
    }

    pub(crate) fn ok_javascript(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "application/javascript",
            headers: vec![("access-control-allow-origin", "*")],
            body: body.to_string(),
        }
    }

    pub(crate) fn preflight() -> Self {
        Self {
            status: 204,
            content_type: TEXT_PLAIN,
            headers: vec![
                ("access-control-allow-origin", "*"),
                ("access-control-allow-methods", "GET, POST, OPTIONS"),
                ("access-control-allow-headers", "Content-Type, Authorization"),
                ("access-control-max-age", "86400"),
            ],
            body: String::new(),
        }
    }

    pub(crate) fn bad_request(message: &str) -> Self {
        Self::text(400, message)
    }

    pub(crate) fn unauthorized(message: &str) -> Self {
        Self::text(401, message)
    }

    pub(crate) fn not_found(message: &str) -> Self {
        Self::text(404, message)
    }

    pub(crate) fn method_not_allowed(message: &str) -> Self {
        Self::text(405, message)
    }

    pub(crate) fn internal_server_error(message: &str) -> Self {
        Self::text(500, message)
    }

    pub(crate) fn service_unavailable(message: &str) -> Self {
        Self::text(503, message)
    }

    #[cfg(test)]
    pub(crate) fn header(&self, name: &str) -> Option<&'static str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }
}

pub(crate) fn write_response(
    stream: &mut TcpStream,
    response: &HttpResponse,
) -> std::io::Result<()> {
    stream.write_all(&render_response(response))?;
    stream.flush()
}

/// Answers a connection the worker queue had no room for.
pub(crate) fn write_backpressure_response(
    mut stream: TcpStream,
    socket_timeout_secs: u64,
) -> std::io::Result<()> {
    stream.set_write_timeout(Some(Duration::from_secs(socket_timeout_secs)))?;
    write_response(
        &mut stream,
        &HttpResponse::service_unavailable(crate::api::QUEUE_FULL_MESSAGE),
    )
}

pub(crate) fn render_response(response: &HttpResponse) -> Vec<u8> {
    let status_text = match response.status {
        200 => "200 OK",
        204 => "204 No Content",
        400 => "400 Bad Request",
        401 => "401 Unauthorized",
        404 => "404 Not Found",
        405 => "405 Method Not Allowed",
        503 => "503 Service Unavailable",
        _ => "500 Internal Server Error",
    };
    let mut head = format!("HTTP/1.1 {status_text}\r\n");
    if response.status != 204 {
        head.push_str(&format!("Content-Type: {}\r\n", response.content_type));
    }
    for (name, value) in &response.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        response.body.len()
    ));
    let mut out = head.into_bytes();
    out.extend_from_slice(response.body.as_bytes());
    out
}
