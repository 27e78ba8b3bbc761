//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation and dispatch to
//! the static file server.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{IF_MODIFIED_SINCE, IF_NONE_MATCH};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// Raw (still percent-encoded) URI path
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_modified_since: Option<String>,
    pub has_if_none_match: bool,
}

impl<'a> RequestContext<'a> {
    pub fn from_parts(parts: &'a Parts) -> Self {
        let headers = &parts.headers;
        Self {
            path: parts.uri.path(),
            query: parts.uri.query(),
            is_head: parts.method == Method::HEAD,
            if_modified_since: headers
                .get(IF_MODIFIED_SINCE)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string),
            has_if_none_match: headers.contains_key(IF_NONE_MATCH),
        }
    }
}

/// Main entry point for HTTP request handling
///
/// Generic over the request body since the file server never reads it.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    // 1. Check HTTP method
    if let Some(resp) = check_http_method(req.method()) {
        return Ok(resp);
    }

    // 2. Resolve under the served root, the body is never read
    let (parts, _) = req.into_parts();
    let ctx = RequestContext::from_parts(&parts);
    Ok(static_files::serve(&ctx, &state.root, &state.config.files).await)
}

/// Return a response for methods other than GET/HEAD
///
/// OPTIONS only arrives here when the handler runs without the CORS layer.
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        _ => {
            logger::log_warning(&format!("Unsupported method: {method}"));
            Some(http::build_501_response(method.as_str()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::{BodyExt, Empty};

    fn state_for(root: &std::path::Path) -> Arc<AppState> {
        let mut config = Config::default();
        config.files.root = root.to_string_lossy().into_owned();
        Arc::new(AppState::new(config).unwrap())
    }

    fn request(method: Method, uri: &str) -> Request<Empty<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Empty::new())
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>hi</h1>").unwrap();
        let state = state_for(dir.path());

        let response = handle_request(request(Method::GET, "/index.html"), state)
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.headers().get("content-type").unwrap(), "text/html");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from_static(b"<h1>hi</h1>"));
    }

    #[tokio::test]
    async fn test_get_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path());

        let response = handle_request(request(Method::GET, "/missing.html"), state)
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_unsupported_methods_get_501() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>hi</h1>").unwrap();
        let state = state_for(dir.path());

        for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
            let response = handle_request(request(method, "/index.html"), Arc::clone(&state))
                .await
                .unwrap();
            assert_eq!(response.status(), 501);
        }
    }

    #[tokio::test]
    async fn test_head_returns_headers_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log(1);").unwrap();
        let state = state_for(dir.path());

        let response = handle_request(request(Method::HEAD, "/app.js?v=2"), state)
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.headers().get("content-length").unwrap(), "15");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }
}
