//! Just enough HTTP/1.1 for two JSON endpoints: parse a request head, write
//! a response, close the connection.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, Take};

const MAX_HEAD_BYTES: usize = 8 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
}

impl Request {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status: 200,
                content_type: "application/json",
                body,
            },
            Err(err) => Self::text(500, format!("failed to encode response: {err}")),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.into().into_bytes(),
        }
    }

    pub fn empty(status: u16, content_type: &'static str) -> Self {
        Self {
            status,
            content_type,
            body: Vec::new(),
        }
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Reads the request line and headers. Bodies are ignored; neither endpoint
/// takes one. At most `MAX_HEAD_BYTES` are ever pulled from `reader`.
pub async fn read_request<R>(reader: &mut R) -> Result<Request>
where
    R: AsyncBufRead + Unpin,
{
    let mut head = reader.take(MAX_HEAD_BYTES as u64);

    let mut request_line = String::new();
    let consumed = head
        .read_line(&mut request_line)
        .await
        .context("failed to read request line")?;
    if consumed == 0 {
        bail!("connection closed before request line");
    }
    check_head_limit(&head, &request_line)?;

    loop {
        let mut header = String::new();
        let n = head
            .read_line(&mut header)
            .await
            .context("failed to read request header")?;
        check_head_limit(&head, &header)?;
        if n == 0 || header.trim_end().is_empty() {
            break;
        }
    }

    parse_request_line(request_line.trim_end())
}

/// A line cut short by the byte budget means the head did not fit.
fn check_head_limit<R: tokio::io::AsyncRead>(head: &Take<R>, line: &str) -> Result<()> {
    if head.limit() == 0 && !line.ends_with('\n') {
        bail!("request head exceeds {MAX_HEAD_BYTES} bytes");
    }
    Ok(())
}

pub fn parse_request_line(line: &str) -> Result<Request> {
    let mut parts = line.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        bail!("malformed request line {line:?}");
    };

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, parse_query(query)),
        None => (target, HashMap::new()),
    };

    Ok(Request {
        method: method.to_string(),
        path: percent_decode(path),
        query,
    })
}

/// First occurrence of a key wins.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params
            .entry(percent_decode(key))
            .or_insert_with(|| percent_decode(value));
    }
    params
}

/// `%XX` escapes and `+` as space. Invalid escapes are kept literally.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 3;
                        continue;
                    }
                    _ => out.push(b'%'),
                }
            }
            other => out.push(other),
        }
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

pub async fn write_response<W>(writer: &mut W, response: &Response) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        reason_phrase(response.status),
        response.content_type,
        response.body.len()
    );

    writer
        .write_all(head.as_bytes())
        .await
        .context("failed to write response head")?;
    writer
        .write_all(&response.body)
        .await
        .context("failed to write response body")?;
    writer.flush().await.context("failed to flush response")?;
    Ok(())
}
