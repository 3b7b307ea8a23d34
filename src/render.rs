//! Render engine seam
//!
//! The framework's route table and page renderer live outside this crate.
//! The dispatcher only needs to ask whether a request belongs to a dynamic
//! route, render it, map a URL path to the static tree, and collect any
//! cookies the render deferred.

use async_trait::async_trait;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, SET_COOKIE};
use std::net::IpAddr;

use crate::error::Result;
use crate::http::{self, HttpResponse};
use crate::logger;

/// A request with its body already collected
pub type RenderRequest = hyper::Request<Bytes>;

/// Peer address of the connection a request arrived on, attached as a
/// request extension for rendered requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddress(pub IpAddr);

/// `Set-Cookie` values a render produced but did not write as headers.
///
/// Engines may attach this as a response extension; the default
/// [`RenderEngine::set_cookie_headers`] reads it back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeferredCookies(pub Vec<String>);

#[async_trait]
pub trait RenderEngine: Send + Sync {
    /// Whether the request hits a known dynamic route
    fn matches(&self, request: &RenderRequest) -> bool;

    async fn render(&self, request: RenderRequest) -> Result<HttpResponse>;

    /// Strip the site's base path from a URL pathname
    fn remove_base(&self, pathname: &str) -> String {
        pathname.to_string()
    }

    fn set_cookie_headers(&self, response: &HttpResponse) -> Vec<String> {
        response
            .extensions()
            .get::<DeferredCookies>()
            .map(|cookies| cookies.0.clone())
            .unwrap_or_default()
    }
}

/// Append each cookie as its own `Set-Cookie` header line.
pub fn append_set_cookies(response: &mut HttpResponse, cookies: Vec<String>) {
    let headers = response.headers_mut();
    for cookie in cookies {
        match HeaderValue::try_from(cookie) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => logger::log_warning(&format!("Dropping invalid Set-Cookie value: {e}")),
        }
    }
}

/// Engine for a fully prerendered site: no dynamic routes, 404 for anything
/// the static tree cannot answer.
#[derive(Debug, Clone, Default)]
pub struct StaticSiteEngine {
    base: String,
}

impl StaticSiteEngine {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RenderEngine for StaticSiteEngine {
    fn matches(&self, _request: &RenderRequest) -> bool {
        false
    }

    async fn render(&self, _request: RenderRequest) -> Result<HttpResponse> {
        Ok(http::build_404_response())
    }

    fn remove_base(&self, pathname: &str) -> String {
        if self.base.is_empty() {
            return pathname.to_string();
        }
        match pathname.strip_prefix(&self.base) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.to_string(),
            _ => pathname.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookies_fan_out() {
        let mut response = http::build_404_response();
        append_set_cookies(
            &mut response,
            vec!["a=1; Path=/".to_string(), "b=2; HttpOnly".to_string()],
        );
        let values: Vec<_> = response.headers().get_all(SET_COOKIE).iter().collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], "a=1; Path=/");
        assert_eq!(values[1], "b=2; HttpOnly");
    }

    #[test]
    fn test_invalid_cookie_skipped() {
        let mut response = http::build_404_response();
        append_set_cookies(&mut response, vec!["bad\nvalue".to_string(), "ok=1".to_string()]);
        assert_eq!(response.headers().get_all(SET_COOKIE).iter().count(), 1);
    }

    #[test]
    fn test_default_cookie_source_reads_extension() {
        let engine = StaticSiteEngine::default();
        let mut response = http::build_404_response();
        assert!(engine.set_cookie_headers(&response).is_empty());

        response
            .extensions_mut()
            .insert(DeferredCookies(vec!["session=xyz".to_string()]));
        assert_eq!(engine.set_cookie_headers(&response), vec!["session=xyz"]);
    }

    #[test]
    fn test_remove_base() {
        let engine = StaticSiteEngine::new("/docs/");
        assert_eq!(engine.remove_base("/docs/guide/"), "/guide/");
        assert_eq!(engine.remove_base("/docs"), "");
        assert_eq!(engine.remove_base("/docsearch"), "/docsearch");
        assert_eq!(StaticSiteEngine::default().remove_base("/a"), "/a");
    }
}
