use std::{
    collections::HashMap,
    io::{BufRead, BufReader, Read},
    net::TcpStream,
};

use super::{HttpRequest, MAX_HTTP_BODY_BYTES};

pub(super) fn read_http_request(stream: &mut TcpStream) -> Result<Option<HttpRequest>, String> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    let bytes = reader
        .read_line(&mut request_line)
        .map_err(|e| e.to_string())?;
    if bytes == 0 {
        return Ok(None);
    }

    let (method, target) = parse_request_line(&request_line)?;

    let mut headers = HashMap::new();
    loop {
        let mut header_line = String::new();
        let bytes = reader
            .read_line(&mut header_line)
            .map_err(|e| e.to_string())?;
        if bytes == 0 || header_line == "\r\n" || header_line == "\n" {
            break;
        }
        let (name, value) = parse_header_line(&header_line)?;
        headers.insert(name, value);
    }

    let content_length = content_length(&headers)?;
    let mut body = vec![0u8; content_length];
    if content_length > 0 {
        reader.read_exact(&mut body).map_err(|e| e.to_string())?;
    }

    Ok(Some(HttpRequest {
        method,
        target,
        headers,
        body,
    }))
}

pub(super) fn parse_request_line(line: &str) -> Result<(String, String), String> {
    let line = line.trim();
    let mut parts = line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| "missing HTTP method".to_string())?;
    let target = parts
        .next()
        .ok_or_else(|| "missing HTTP target".to_string())?;
    let version = parts
        .next()
        .ok_or_else(|| "missing HTTP version".to_string())?;
    if !version.starts_with("HTTP/1.") {
        return Err("unsupported HTTP version".to_string());
    }
    Ok((method.to_string(), target.to_string()))
}

/// Splits one `Name: value` line; the name comes back lower-cased.
pub(super) fn parse_header_line(line: &str) -> Result<(String, String), String> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| "invalid HTTP header".to_string())?;
    Ok((name.trim().to_ascii_lowercase(), value.trim().to_string()))
}

/// Declared body size, bounded by [`MAX_HTTP_BODY_BYTES`]. Absent means 0.
pub(super) fn content_length(headers: &HashMap<String, String>) -> Result<usize, String> {
    let content_length = match headers.get("content-length") {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| "invalid content-length header".to_string())?,
        None => 0,
    };
    if content_length > MAX_HTTP_BODY_BYTES {
        return Err(format!(
            "content-length exceeds max body size ({MAX_HTTP_BODY_BYTES} bytes)"
        ));
    }
    Ok(content_length)
}

/// Path component of an origin-form (`/view?x=1`) or absolute-form
/// (`https://host/view`) request target, without query or fragment.
pub(super) fn request_path(target: &str) -> &str {
    let without_authority = match target.split_once("://") {
        Some((scheme, rest)) if !scheme.contains('/') => match rest.find(['/', '?', '#']) {
            Some(index) => &rest[index..],
            None => "/",
        },
        _ => target,
    };
    let end = without_authority
        .find(['?', '#'])
        .unwrap_or(without_authority.len());
    match &without_authority[..end] {
        "" => "/",
        path => path,
    }
}
