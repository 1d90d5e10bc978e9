//! Response helpers.
//!
//! Two families: raw senders used while a request is still being parsed
//! (no sink exists yet, the error goes straight to the socket) and
//! sink-based helpers used by handlers once a request was accepted.

use http::{StatusCode, header};
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::sink::{ClientStream, ResponseSink};

/// Raw sender for a full HTTP response with a binary body.
pub async fn send_response(
    stream: &mut dyn ClientStream,
    status: &str,
    content_type: &str,
    body: &[u8],
) -> anyhow::Result<()> {
    let response = format!(
        "HTTP/1.1 {status}\r\n\
         Server: restux/0.1.0\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n",
        body.len()
    );

    stream.write_all(response.as_bytes()).await?;
    stream.write_all(body).await?;
    stream.flush().await?;
    Ok(())
}

async fn send_text_response(
    stream: &mut dyn ClientStream,
    status: &str,
    body: &str,
) -> anyhow::Result<()> {
    send_response(stream, status, "text/plain; charset=utf-8", body.as_bytes()).await
}

pub async fn send_400(stream: &mut dyn ClientStream) -> anyhow::Result<()> {
    send_text_response(stream, "400 Bad Request", "400 Bad Request\n").await
}

pub async fn send_408(stream: &mut dyn ClientStream) -> anyhow::Result<()> {
    send_text_response(stream, "408 Request Timeout", "408 Request Timeout\n").await
}

pub async fn send_411(stream: &mut dyn ClientStream) -> anyhow::Result<()> {
    send_text_response(stream, "411 Length Required", "411 Length Required\n").await
}

pub async fn send_413(stream: &mut dyn ClientStream) -> anyhow::Result<()> {
    send_text_response(stream, "413 Payload Too Large", "413 Payload Too Large\n").await
}

pub async fn send_431(stream: &mut dyn ClientStream) -> anyhow::Result<()> {
    send_text_response(
        stream,
        "431 Request Header Fields Too Large",
        "431 Request Header Fields Too Large\n",
    )
    .await
}

fn set_content_headers<S: ResponseSink + ?Sized>(sink: &mut S, content_type: &str, len: usize) {
    let headers = sink.headers();
    headers.insert(
        header::CONTENT_TYPE,
        content_type.parse().expect("static content type"),
    );
    headers.insert(header::CONTENT_LENGTH, header::HeaderValue::from(len));
}

/// JSON response through a sink.
pub async fn send_json<S: ResponseSink + ?Sized>(
    sink: &mut S,
    status: StatusCode,
    value: &Value,
) -> anyhow::Result<()> {
    let body = serde_json::to_vec(value)?;
    set_content_headers(sink, "application/json; charset=UTF-8", body.len());
    sink.write_status(status).await?;
    sink.write_body(&body).await?;
    Ok(())
}

/// Plain-text response through a sink.
pub async fn send_text<S: ResponseSink + ?Sized>(
    sink: &mut S,
    status: StatusCode,
    body: &str,
) -> anyhow::Result<()> {
    set_content_headers(sink, "text/plain; charset=utf-8", body.len());
    sink.write_status(status).await?;
    sink.write_body(body.as_bytes()).await?;
    Ok(())
}

/// Status + headers only, no body bytes.
pub async fn send_no_content<S: ResponseSink + ?Sized>(
    sink: &mut S,
    status: StatusCode,
) -> anyhow::Result<()> {
    sink.headers()
        .insert(header::CONTENT_LENGTH, header::HeaderValue::from(0usize));
    sink.write_status(status).await
}

/// Canonical error body for a status code.
pub async fn send_error<S: ResponseSink + ?Sized>(
    sink: &mut S,
    status: StatusCode,
) -> anyhow::Result<()> {
    let reason = status.canonical_reason().unwrap_or("Error");
    let body = format!("{} {}\n", status.as_u16(), reason);
    send_text(sink, status, &body).await
}

pub async fn send_405_with_allow<S: ResponseSink + ?Sized>(
    sink: &mut S,
    allow: &str,
) -> anyhow::Result<()> {
    sink.headers()
        .insert(header::ALLOW, allow.parse().expect("static allow list"));
    send_error(sink, StatusCode::METHOD_NOT_ALLOWED).await
}
