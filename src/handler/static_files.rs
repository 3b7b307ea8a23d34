//! Static file serving module
//!
//! Maps request paths onto the client output tree and builds file responses.

use hyper::body::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::Result;
use crate::http::{self, cache, mime, HttpResponse};

/// Map a URL pathname (base already removed) onto the client root.
///
/// The pathname is percent-decoded and one trailing `/` is dropped. Returns
/// `None` for paths that cannot name a file inside the root (`..` segments,
/// invalid UTF-8 escapes, embedded NULs or backslashes).
pub fn local_path(client_root: &Path, pathname: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(pathname).ok()?;
    let trimmed = decoded.strip_suffix('/').unwrap_or(&decoded);

    let mut path = client_root.to_path_buf();
    for segment in trimmed.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains(['\\', '\0']) => return None,
            s => path.push(s),
        }
    }
    Some(path)
}

/// Whether a regular file exists at `path`. Directories do not count.
pub async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

/// Read a file and build a 200 (or 304) response for it
pub async fn serve_file(
    path: &Path,
    if_none_match: Option<&str>,
    is_head: bool,
) -> Result<HttpResponse> {
    let metadata = fs::metadata(path).await?;
    let etag = cache::generate_etag(metadata.len(), metadata.modified().ok());
    let content_type = mime::content_type_for(path);

    if cache::check_etag_match(if_none_match, &etag) {
        return Ok(http::build_304_response(
            &etag,
            cache::CachePolicy::for_content_type(content_type),
        ));
    }

    let data = if is_head {
        Bytes::new()
    } else {
        Bytes::from(fs::read(path).await?)
    };
    let mut response = http::build_file_response(data, content_type, &etag, is_head);
    if is_head {
        // Report the real length for HEAD even though no body is sent
        if let Ok(len) = hyper::header::HeaderValue::try_from(metadata.len().to_string()) {
            response
                .headers_mut()
                .insert(hyper::header::CONTENT_LENGTH, len);
        }
    }
    Ok(response)
}
