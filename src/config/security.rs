use axum::http::{HeaderName, HeaderValue, Request, Response};
use std::{
    env,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};

/// Headers on every API response. The station answers the camera page, which
/// needs the camera itself, so same-origin camera access stays allowed.
const BASE_HEADERS: [(&str, &str); 6] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("content-security-policy", "default-src 'none'; frame-ancestors 'none'"),
    ("referrer-policy", "no-referrer"),
    ("permissions-policy", "camera=(self), geolocation=(), microphone=()"),
    ("cache-control", "no-store"),
];

const HSTS: (&str, &str) = (
    "strict-transport-security",
    "max-age=31536000; includeSubDomains",
);

type HeaderSet = Arc<[(HeaderName, HeaderValue)]>;

#[derive(Clone)]
pub struct SecurityHeadersLayer {
    headers: HeaderSet,
}

impl SecurityHeadersLayer {
    pub fn new(include_hsts: bool) -> Self {
        let headers = BASE_HEADERS
            .iter()
            .chain(include_hsts.then_some(&HSTS))
            .map(|&(name, value)| {
                (
                    HeaderName::from_static(name),
                    HeaderValue::from_static(value),
                )
            })
            .collect();

        Self { headers }
    }

    pub fn from_env() -> Self {
        let is_production = env::var("RUST_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        tracing::info!(hsts = is_production, "Security: response headers configured");
        Self::new(is_production)
    }

    #[cfg(test)]
    fn includes(&self, name: &str) -> bool {
        self.headers.iter().any(|(header, _)| header == name)
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeadersService {
            inner,
            headers: Arc::clone(&self.headers),
        }
    }
}

#[derive(Clone)]
pub struct SecurityHeadersService<S> {
    inner: S,
    headers: HeaderSet,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for SecurityHeadersService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = SecurityHeadersFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        SecurityHeadersFuture {
            future: self.inner.call(request),
            headers: Arc::clone(&self.headers),
        }
    }
}

#[pin_project::pin_project]
pub struct SecurityHeadersFuture<F> {
    #[pin]
    future: F,
    headers: HeaderSet,
}

impl<F, ResBody, E> Future for SecurityHeadersFuture<F>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
{
    type Output = Result<Response<ResBody>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let mut response = match this.future.poll(cx) {
            Poll::Ready(Ok(response)) => response,
            other => return other,
        };

        let target = response.headers_mut();
        for (name, value) in this.headers.iter() {
            target.insert(name.clone(), value.clone());
        }

        Poll::Ready(Ok(response))
    }
}

pub fn create_security_headers_layer() -> SecurityHeadersLayer {
    SecurityHeadersLayer::from_env()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsts_only_when_requested() {
        assert!(!SecurityHeadersLayer::new(false).includes("strict-transport-security"));
        assert!(SecurityHeadersLayer::new(true).includes("strict-transport-security"));
    }

    #[test]
    fn test_camera_stays_allowed_for_scanner_page() {
        let layer = SecurityHeadersLayer::new(false);
        let policy = layer
            .headers
            .iter()
            .find(|(name, _)| name == "permissions-policy")
            .map(|(_, value)| value.to_str().unwrap().to_string());
        assert_eq!(
            policy.as_deref(),
            Some("camera=(self), geolocation=(), microphone=()")
        );
    }
}
