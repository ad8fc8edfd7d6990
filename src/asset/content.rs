//! Generic conditional content serving
//!
//! Turns a seekable reader into a response: content type from the name's
//! extension, `Last-Modified` and the date/tag preconditions, single byte
//! ranges, and a streamed body. Dropping the body stops reading.

use std::io::{self, SeekFrom};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::Response;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use super::error::plain_status;

/// A resolved `Range` request, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// How a `Range` header applies to an entity of known size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// Send the whole entity
    Full,
    /// Send one part
    Partial(ByteRange),
    /// No requested byte exists
    Unsatisfiable,
}

/// Interpret a `Range` header value against an entity size
///
/// Only single `bytes=` ranges are honored. Multiple ranges and malformed
/// values are ignored, which sends the full entity.
pub fn parse_range(value: &str, size: u64) -> RangeOutcome {
    let Some(spec) = value.trim().strip_prefix("bytes=") else {
        return RangeOutcome::Full;
    };
    if spec.contains(',') {
        return RangeOutcome::Full;
    }
    let Some((first, last)) = spec.trim().split_once('-') else {
        return RangeOutcome::Full;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        // Suffix range: the final `n` bytes
        let Ok(suffix) = last.parse::<u64>() else {
            return RangeOutcome::Full;
        };
        if suffix == 0 || size == 0 {
            return RangeOutcome::Unsatisfiable;
        }
        let start = size.saturating_sub(suffix);
        return RangeOutcome::Partial(ByteRange { start, end: size - 1 });
    }

    let Ok(start) = first.parse::<u64>() else {
        return RangeOutcome::Full;
    };
    let end = if last.is_empty() {
        None
    } else {
        match last.parse::<u64>() {
            Ok(end) if end >= start => Some(end),
            _ => return RangeOutcome::Full,
        }
    };

    if start >= size {
        return RangeOutcome::Unsatisfiable;
    }
    let end = end.map_or(size - 1, |end| end.min(size - 1));
    RangeOutcome::Partial(ByteRange { start, end })
}

/// Serve a seekable stream with conditional and range handling
///
/// `name` picks the content type, `modified` drives `Last-Modified` and the
/// date preconditions (`UNIX_EPOCH` means unknown), and `etag`, when given,
/// is sent and used by `If-Match`, `If-None-Match` and `If-Range`.
pub async fn serve_content<R>(
    method: &Method,
    headers: &HeaderMap,
    name: &str,
    modified: SystemTime,
    etag: Option<&str>,
    mut reader: R,
) -> io::Result<Response>
where
    R: AsyncRead + AsyncSeek + Send + Unpin + 'static,
{
    let modified = truncate_to_seconds(modified);

    match check_preconditions(method, headers, modified, etag) {
        Precondition::Proceed => {}
        Precondition::NotModified => {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::NOT_MODIFIED;
            set_validators(response.headers_mut(), modified, etag);
            return Ok(response);
        }
        Precondition::Failed => return Ok(plain_status(StatusCode::PRECONDITION_FAILED)),
    }

    let size = reader.seek(SeekFrom::End(0)).await?;

    let mut range = RangeOutcome::Full;
    if let Some(value) = header_str(headers, &header::RANGE) {
        let safe = method == Method::GET || method == Method::HEAD;
        if safe && if_range_allows(headers, modified, etag) {
            range = parse_range(value, size);
        }
    }

    let (status, start, length) = match range {
        RangeOutcome::Full => (StatusCode::OK, 0, size),
        RangeOutcome::Partial(part) => (StatusCode::PARTIAL_CONTENT, part.start, part.length()),
        RangeOutcome::Unsatisfiable => {
            let mut response = plain_status(StatusCode::RANGE_NOT_SATISFIABLE);
            insert(response.headers_mut(), header::CONTENT_RANGE, &format!("bytes */{}", size));
            return Ok(response);
        }
    };

    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        reader.seek(SeekFrom::Start(start)).await?;
        Body::from_stream(ReaderStream::new(reader.take(length)))
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    let response_headers = response.headers_mut();
    insert(response_headers, header::CONTENT_TYPE, &content_type_for(name));
    insert(response_headers, header::ACCEPT_RANGES, "bytes");
    response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    if status == StatusCode::PARTIAL_CONTENT {
        let content_range = format!("bytes {}-{}/{}", start, start + length - 1, size);
        insert(response_headers, header::CONTENT_RANGE, &content_range);
    }
    set_validators(response_headers, modified, etag);

    Ok(response)
}

/// Content type for a file name, with a UTF-8 charset on text types
pub fn content_type_for(name: &str) -> String {
    let mime = mime_guess::from_path(name).first_or_octet_stream();
    let has_charset = mime.get_param(mime_guess::mime::CHARSET).is_some();
    if mime.type_() == mime_guess::mime::TEXT && !has_charset {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.to_string()
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Precondition {
    Proceed,
    NotModified,
    Failed,
}

fn check_preconditions(
    method: &Method,
    headers: &HeaderMap,
    modified: SystemTime,
    etag: Option<&str>,
) -> Precondition {
    if let Some(if_match) = header_str(headers, &header::IF_MATCH) {
        if !etag_list_matches(if_match, etag, true) {
            return Precondition::Failed;
        }
    } else if let Some(since) = header_date(headers, &header::IF_UNMODIFIED_SINCE) {
        if is_known(modified) && modified > since {
            return Precondition::Failed;
        }
    }

    let safe = method == Method::GET || method == Method::HEAD;
    if let Some(if_none_match) = header_str(headers, &header::IF_NONE_MATCH) {
        if etag_list_matches(if_none_match, etag, false) {
            return if safe {
                Precondition::NotModified
            } else {
                Precondition::Failed
            };
        }
    } else if safe {
        if let Some(since) = header_date(headers, &header::IF_MODIFIED_SINCE) {
            if is_known(modified) && modified <= since {
                return Precondition::NotModified;
            }
        }
    }

    Precondition::Proceed
}

fn if_range_allows(headers: &HeaderMap, modified: SystemTime, etag: Option<&str>) -> bool {
    let Some(value) = header_str(headers, &header::IF_RANGE) else {
        return true;
    };
    let value = value.trim();
    if value.starts_with('"') || value.starts_with("W/") {
        return etag.map_or(false, |etag| strong_match(value, etag));
    }
    match httpdate::parse_http_date(value) {
        Ok(date) => is_known(modified) && date == modified,
        Err(_) => false,
    }
}

/// Match a comma-separated tag list (or `*`) against the current tag
fn etag_list_matches(list: &str, etag: Option<&str>, strong: bool) -> bool {
    let list = list.trim();
    if list == "*" {
        return true;
    }
    let Some(etag) = etag else {
        return false;
    };
    list.split(',')
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .any(|candidate| {
            if strong {
                strong_match(candidate, etag)
            } else {
                weak_match(candidate, etag)
            }
        })
}

fn strong_match(a: &str, b: &str) -> bool {
    a == b && !a.starts_with("W/")
}

fn weak_match(a: &str, b: &str) -> bool {
    a.trim_start_matches("W/") == b.trim_start_matches("W/")
}

fn set_validators(headers: &mut HeaderMap, modified: SystemTime, etag: Option<&str>) {
    if is_known(modified) {
        insert(headers, header::LAST_MODIFIED, &httpdate::fmt_http_date(modified));
    }
    if let Some(etag) = etag {
        insert(headers, header::ETAG, etag);
    }
}

/// Header value as text; an empty value counts as absent
fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
}

fn header_date(headers: &HeaderMap, name: &HeaderName) -> Option<SystemTime> {
    header_str(headers, name).and_then(|value| httpdate::parse_http_date(value.trim()).ok())
}

fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

fn is_known(time: SystemTime) -> bool {
    time > UNIX_EPOCH
}

/// HTTP dates carry whole seconds only
fn truncate_to_seconds(time: SystemTime) -> SystemTime {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => UNIX_EPOCH + Duration::from_secs(elapsed.as_secs()),
        Err(_) => UNIX_EPOCH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn modified() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    fn headers(pairs: &[(HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    async fn body(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn serve(method: Method, headers: &HeaderMap, etag: Option<&str>) -> Response {
        let reader = Cursor::new(b"0123456789".to_vec());
        serve_content(&method, headers, "/digits.txt", modified(), etag, reader)
            .await
            .unwrap()
    }

    #[test]
    fn test_parse_range_forms() {
        let partial = |start, end| RangeOutcome::Partial(ByteRange { start, end });
        assert_eq!(parse_range("bytes=0-4", 10), partial(0, 4));
        assert_eq!(parse_range("bytes=6-", 10), partial(6, 9));
        assert_eq!(parse_range("bytes=-3", 10), partial(7, 9));
        assert_eq!(parse_range("bytes=-30", 10), partial(0, 9));
        assert_eq!(parse_range("bytes=5-100", 10), partial(5, 9));
    }

    #[test]
    fn test_parse_range_unsatisfiable() {
        assert_eq!(parse_range("bytes=10-", 10), RangeOutcome::Unsatisfiable);
        assert_eq!(parse_range("bytes=-0", 10), RangeOutcome::Unsatisfiable);
        assert_eq!(parse_range("bytes=0-", 0), RangeOutcome::Unsatisfiable);
    }

    #[test]
    fn test_parse_range_ignored() {
        assert_eq!(parse_range("items=0-4", 10), RangeOutcome::Full);
        assert_eq!(parse_range("bytes=0-1,4-5", 10), RangeOutcome::Full);
        assert_eq!(parse_range("bytes=5-2", 10), RangeOutcome::Full);
        assert_eq!(parse_range("bytes=a-b", 10), RangeOutcome::Full);
        assert_eq!(parse_range("bytes=", 10), RangeOutcome::Full);
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("/css/site.css"), "text/css; charset=utf-8");
        assert_eq!(content_type_for("/hello.txt"), "text/plain; charset=utf-8");
        assert_eq!(content_type_for("/logo.png"), "image/png");
        assert_eq!(content_type_for("/blob"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_full_response() {
        let response = serve(Method::GET, &HeaderMap::new(), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::CONTENT_LENGTH).unwrap(), "10");
        assert_eq!(response.headers().get(header::ACCEPT_RANGES).unwrap(), "bytes");
        assert_eq!(
            response.headers().get(header::LAST_MODIFIED).unwrap(),
            httpdate::fmt_http_date(modified()).as_str()
        );
        assert!(response.headers().get(header::ETAG).is_none());
        assert_eq!(body(response).await, b"0123456789");
    }

    #[tokio::test]
    async fn test_head_has_headers_without_body() {
        let response = serve(Method::HEAD, &HeaderMap::new(), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::CONTENT_LENGTH).unwrap(), "10");
        assert!(body(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_if_modified_since() {
        let since = httpdate::fmt_http_date(modified());
        let request_headers = headers(&[(header::IF_MODIFIED_SINCE, since.as_str())]);
        let response = serve(Method::GET, &request_headers, None).await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(body(response).await.is_empty());

        let earlier = httpdate::fmt_http_date(modified() - Duration::from_secs(60));
        let request_headers = headers(&[(header::IF_MODIFIED_SINCE, earlier.as_str())]);
        let response = serve(Method::GET, &request_headers, None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_if_none_match_disables_date_check() {
        let since = httpdate::fmt_http_date(modified());
        let request_headers = headers(&[
            (header::IF_MODIFIED_SINCE, since.as_str()),
            (header::IF_NONE_MATCH, "\"stale\""),
        ]);
        let response = serve(Method::GET, &request_headers, None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_empty_conditional_headers_count_as_absent() {
        let since = httpdate::fmt_http_date(modified());
        let request_headers = headers(&[
            (header::IF_MODIFIED_SINCE, since.as_str()),
            (header::IF_NONE_MATCH, ""),
        ]);
        let response = serve(Method::GET, &request_headers, None).await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

        let request_headers = headers(&[(header::IF_MATCH, " ")]);
        let response = serve(Method::GET, &request_headers, Some("\"abc\"")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let request_headers = headers(&[(header::RANGE, "bytes=2-5"), (header::IF_RANGE, "")]);
        let response = serve(Method::GET, &request_headers, None).await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(body(response).await, b"2345");
    }

    #[tokio::test]
    async fn test_if_none_match_with_etag() {
        let request_headers = headers(&[(header::IF_NONE_MATCH, "W/\"abc\", \"def\"")]);
        let response = serve(Method::GET, &request_headers, Some("\"abc\"")).await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(response.headers().get(header::ETAG).unwrap(), "\"abc\"");
    }

    #[tokio::test]
    async fn test_if_match_failure() {
        let request_headers = headers(&[(header::IF_MATCH, "\"other\"")]);
        let response = serve(Method::GET, &request_headers, Some("\"abc\"")).await;
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);

        let request_headers = headers(&[(header::IF_MATCH, "*")]);
        let response = serve(Method::GET, &request_headers, Some("\"abc\"")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_if_unmodified_since_failure() {
        let earlier = httpdate::fmt_http_date(modified() - Duration::from_secs(60));
        let request_headers = headers(&[(header::IF_UNMODIFIED_SINCE, earlier.as_str())]);
        let response = serve(Method::GET, &request_headers, None).await;
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    }

    #[tokio::test]
    async fn test_partial_content() {
        let response = serve(Method::GET, &headers(&[(header::RANGE, "bytes=2-5")]), None).await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers().get(header::CONTENT_RANGE).unwrap(), "bytes 2-5/10");
        assert_eq!(response.headers().get(header::CONTENT_LENGTH).unwrap(), "4");
        assert_eq!(body(response).await, b"2345");
    }

    #[tokio::test]
    async fn test_range_not_satisfiable() {
        let response = serve(Method::GET, &headers(&[(header::RANGE, "bytes=20-")]), None).await;
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers().get(header::CONTENT_RANGE).unwrap(), "bytes */10");
    }

    #[tokio::test]
    async fn test_if_range_mismatch_sends_full_body() {
        let stale = httpdate::fmt_http_date(modified() - Duration::from_secs(60));
        let request_headers =
            headers(&[(header::RANGE, "bytes=2-5"), (header::IF_RANGE, stale.as_str())]);
        let response = serve(Method::GET, &request_headers, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, b"0123456789");

        let current = httpdate::fmt_http_date(modified());
        let request_headers =
            headers(&[(header::RANGE, "bytes=2-5"), (header::IF_RANGE, current.as_str())]);
        let response = serve(Method::GET, &request_headers, None).await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    }

    #[tokio::test]
    async fn test_unknown_modification_time() {
        let reader = Cursor::new(b"abc".to_vec());
        let response =
            serve_content(&Method::GET, &HeaderMap::new(), "/a.txt", UNIX_EPOCH, None, reader)
                .await
                .unwrap();
        assert!(response.headers().get(header::LAST_MODIFIED).is_none());
    }
}
