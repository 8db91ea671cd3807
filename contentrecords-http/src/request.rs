//! Request buffering.
//!
//! The engine reads requests synchronously and more than once, so the whole
//! request is read into a [`HostRequest`] before any instance renders.

use axum::body::Bytes;
use axum::extract::{Form, FromRequest, Multipart, Query, Request};
use axum::http::header::CONTENT_TYPE;
use contentrecords_engine::{HostRequest, UploadedFile};
use tracing::debug;

use crate::error::HostResult;

type Pairs = Vec<(String, String)>;

/// Buffers an HTTP request.
///
/// Urlencoded and multipart bodies become form values (and files); any
/// other body is kept raw for JSON decoding. Malformed query strings are
/// treated as empty.
pub async fn buffer_request(request: Request) -> HostResult<HostRequest> {
    let query = Query::<Pairs>::try_from_uri(request.uri())
        .map(|Query(pairs)| pairs)
        .unwrap_or_default();
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let mime = content_type.trim_start().to_ascii_lowercase();

    let mut host = query.into_iter().fold(
        HostRequest::new(request.method().as_str()).with_content_type(content_type),
        |req, (key, value)| req.with_query(key, value),
    );

    if mime.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &()).await?;
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await?;
            host = if filename.is_empty() {
                host.with_form(name, String::from_utf8_lossy(&data))
            } else {
                debug!(field = %name, filename = %filename, bytes = data.len(), "buffered upload");
                host.with_file(UploadedFile {
                    field: name,
                    filename,
                    data: data.to_vec(),
                })
            };
        }
    } else if mime.starts_with("application/x-www-form-urlencoded") {
        let Form(pairs) = Form::<Pairs>::from_request(request, &()).await?;
        host = pairs
            .into_iter()
            .fold(host, |req, (key, value)| req.with_form(key, value));
    } else {
        let body = Bytes::from_request(request, &()).await?;
        host = host.with_body(body.to_vec());
    }
    Ok(host)
}
