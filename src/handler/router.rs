//! Request dispatch module
//!
//! Every request is classified exactly once:
//! 1. the render engine claims it (dynamic route) → render
//! 2. a file exists at the exact path under the client root → serve it
//! 3. a prerendered page matches the route → serve that page
//! 4. otherwise → render anyway, so the engine produces its not-found page

use http_body_util::BodyExt;
use hyper::body::{Body, Incoming};
use hyper::{Method, Request};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use super::{fallback, static_files};
use crate::config::LoggingConfig;
use crate::error::Result;
use crate::http::HttpResponse;
use crate::logger::{self, AccessLogEntry};
use crate::render::{self, ClientAddress, RenderEngine, RenderRequest};

/// Which of the three paths answers a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Rendered,
    StaticExact(PathBuf),
    StaticFallback(PathBuf),
}

impl Resolution {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Rendered => "rendered",
            Self::StaticExact(_) => "static",
            Self::StaticFallback(_) => "fallback",
        }
    }
}

pub struct Dispatcher {
    engine: Arc<dyn RenderEngine>,
    client_root: PathBuf,
    logging: LoggingConfig,
}

impl Dispatcher {
    pub fn new(engine: Arc<dyn RenderEngine>, client_root: PathBuf, logging: LoggingConfig) -> Self {
        Self {
            engine,
            client_root,
            logging,
        }
    }

    pub fn client_root(&self) -> &std::path::Path {
        &self.client_root
    }

    pub async fn classify(&self, request: &RenderRequest) -> Resolution {
        if self.engine.matches(request) {
            return Resolution::Rendered;
        }

        let pathname = self.engine.remove_base(request.uri().path());
        let Some(local) = static_files::local_path(&self.client_root, &pathname) else {
            return Resolution::Rendered;
        };

        if static_files::is_file(&local).await {
            return Resolution::StaticExact(local);
        }

        match fallback::find_fallback(&self.client_root, &local).await {
            Ok(Some(page)) => Resolution::StaticFallback(page),
            Ok(None) => Resolution::Rendered,
            Err(e) => {
                logger::log_warning(&format!(
                    "Prerendered page lookup under {} failed: {e}",
                    self.client_root.display()
                ));
                Resolution::Rendered
            }
        }
    }

    /// Classify and answer a request whose body is already collected
    pub async fn dispatch(
        &self,
        request: RenderRequest,
        peer: Option<SocketAddr>,
    ) -> Result<(Resolution, HttpResponse)> {
        let resolution = self.classify(&request).await;
        let response = match &resolution {
            Resolution::Rendered => self.render(request, peer).await?,
            Resolution::StaticExact(path) | Resolution::StaticFallback(path) => {
                let if_none_match = request
                    .headers()
                    .get("if-none-match")
                    .and_then(|v| v.to_str().ok());
                let is_head = request.method() == Method::HEAD;
                static_files::serve_file(path, if_none_match, is_head).await?
            }
        };
        Ok((resolution, response))
    }

    /// Render through the engine, then fan out any deferred cookies
    pub async fn render(
        &self,
        mut request: RenderRequest,
        peer: Option<SocketAddr>,
    ) -> Result<HttpResponse> {
        if let Some(addr) = peer {
            request.extensions_mut().insert(ClientAddress(addr.ip()));
        }

        let mut response = self.engine.render(request).await?;
        let cookies = self.engine.set_cookie_headers(&response);
        render::append_set_cookies(&mut response, cookies);
        Ok(response)
    }

    /// Transport entry point: collect the body, dispatch, write the access log
    pub async fn handle_request(
        &self,
        request: Request<Incoming>,
        peer: Option<SocketAddr>,
    ) -> Result<HttpResponse> {
        let started = Instant::now();
        let (parts, body) = request.into_parts();
        let body = body.collect().await?.to_bytes();
        let request = Request::from_parts(parts, body);

        let mut entry = self.logging.access_log.then(|| access_entry(&request, peer));

        let (resolution, response) = self.dispatch(request, peer).await?;

        if let Some(entry) = entry.as_mut() {
            entry.status = response.status().as_u16();
            entry.body_bytes = usize::try_from(response.body().size_hint().lower()).unwrap_or(0);
            entry.resolution = resolution.label();
            entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
            logger::log_access(entry, &self.logging.access_log_format);
        }
        Ok(response)
    }
}

fn access_entry(request: &RenderRequest, peer: Option<SocketAddr>) -> AccessLogEntry {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer.map_or_else(|| "-".to_string(), |a| a.ip().to_string()),
        request.method().to_string(),
        request.uri().path().to_string(),
    );
    entry.query = request.uri().query().map(ToString::to_string);
    entry.http_version = format!("{:?}", request.version())
        .trim_start_matches("HTTP/")
        .to_string();
    entry.referer = header("referer");
    entry.user_agent = header("user-agent");
    entry
}
