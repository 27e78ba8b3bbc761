//! CORS decoration
//!
//! `Cors<S>` wraps any hyper service and adds the configured
//! `Access-Control-Allow-*` headers to every response it produces, whatever
//! the status. Preflight (`OPTIONS`) requests are answered here with an empty
//! `200` and never reach the inner service.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use hyper::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};

use crate::config::CorsConfig;
use crate::error::{Result, ServerError};

/// The three header values attached to every response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    allow_origin: HeaderValue,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allow_origin: HeaderValue::from_static("*"),
            allow_methods: HeaderValue::from_static("GET, POST, OPTIONS"),
            allow_headers: HeaderValue::from_static("Content-Type"),
        }
    }
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Result<Self> {
        Ok(Self {
            allow_origin: header_value("access-control-allow-origin", &config.allow_origin)?,
            allow_methods: header_value("access-control-allow-methods", &config.allow_methods)?,
            allow_headers: header_value("access-control-allow-headers", &config.allow_headers)?,
        })
    }

    /// Insert the policy headers, replacing any value already present
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
    }

    /// Empty `200 OK` answer to a preflight request, headers applied
    pub fn preflight_response<B: Default>(&self) -> Response<B> {
        let mut response = Response::new(B::default());
        *response.status_mut() = StatusCode::OK;
        self.apply(response.headers_mut());
        response
    }
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| ServerError::InvalidHeader {
        name,
        value: value.to_string(),
    })
}

/// Service decorator applying a [`CorsPolicy`] to every response
#[derive(Debug, Clone)]
pub struct Cors<S> {
    inner: S,
    policy: Arc<CorsPolicy>,
}

impl<S> Cors<S> {
    pub const fn new(inner: S, policy: Arc<CorsPolicy>) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &CorsPolicy {
        &self.policy
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for Cors<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: Default + Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future =
        Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<ReqBody>) -> Self::Future {
        if req.method() == Method::OPTIONS {
            let response = self.policy.preflight_response();
            return Box::pin(async move { Ok(response) });
        }

        let policy = Arc::clone(&self.policy);
        let future = self.inner.call(req);
        Box::pin(async move {
            let mut response = future.await?;
            policy.apply(response.headers_mut());
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::{BodyExt, Empty, Full};
    use hyper::body::Bytes;
    use hyper::service::service_fn;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn assert_cors_headers(headers: &HeaderMap) {
        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
        assert_eq!(
            headers.get("access-control-allow-methods").unwrap(),
            "GET, POST, OPTIONS"
        );
        assert_eq!(
            headers.get("access-control-allow-headers").unwrap(),
            "Content-Type"
        );
    }

    fn request(method: Method, path: &str) -> Request<Empty<Bytes>> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Empty::new())
            .unwrap()
    }

    #[test]
    fn test_default_policy_from_default_config() {
        let policy = CorsPolicy::from_config(&CorsConfig::default()).unwrap();
        assert_eq!(policy, CorsPolicy::default());
    }

    #[test]
    fn test_invalid_header_value_rejected() {
        let config = CorsConfig {
            allow_origin: "bad\nvalue".to_string(),
            ..CorsConfig::default()
        };
        assert!(matches!(
            CorsPolicy::from_config(&config),
            Err(ServerError::InvalidHeader {
                name: "access-control-allow-origin",
                ..
            })
        ));
    }

    #[test]
    fn test_apply_replaces_existing_values() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("https://a.test"));
        headers.insert("content-type", HeaderValue::from_static("text/plain"));

        CorsPolicy::default().apply(&mut headers);

        assert_cors_headers(&headers);
        assert_eq!(headers.get_all(ACCESS_CONTROL_ALLOW_ORIGIN).iter().count(), 1);
        assert_eq!(headers.get("content-type").unwrap(), "text/plain");
    }

    #[tokio::test]
    async fn test_error_responses_are_decorated() {
        let inner = service_fn(|_req: Request<Empty<Bytes>>| async {
            Ok::<_, Infallible>(
                Response::builder()
                    .status(404)
                    .body(Full::new(Bytes::from("404 Not Found")))
                    .unwrap(),
            )
        });
        let cors = Cors::new(inner, Arc::new(CorsPolicy::default()));

        for method in [Method::GET, Method::POST, Method::DELETE, Method::HEAD] {
            let response = cors.call(request(method, "/missing.html")).await.unwrap();
            assert_eq!(response.status(), 404);
            assert_cors_headers(response.headers());
        }
    }

    #[tokio::test]
    async fn test_preflight_short_circuits_inner_service() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let inner = service_fn(move |_req: Request<Empty<Bytes>>| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, Infallible>(Response::new(Full::new(Bytes::from("file")))) }
        });
        let cors = Cors::new(inner, Arc::new(CorsPolicy::default()));

        let response = cors
            .call(request(Method::OPTIONS, "/index.html"))
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.headers().len(), 3);
        assert_cors_headers(response.headers());
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        cors.call(request(Method::GET, "/index.html")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_configured_policy_is_used() {
        let config = CorsConfig {
            allow_origin: "http://localhost:3000".to_string(),
            ..CorsConfig::default()
        };
        let policy = Arc::new(CorsPolicy::from_config(&config).unwrap());
        let inner = service_fn(|_req: Request<Empty<Bytes>>| async {
            Ok::<_, Infallible>(Response::new(Full::new(Bytes::new())))
        });
        let cors = Cors::new(inner, policy);

        let response = cors.call(request(Method::GET, "/")).await.unwrap();
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(cors.policy().allow_methods, "GET, POST, OPTIONS");
    }
}
