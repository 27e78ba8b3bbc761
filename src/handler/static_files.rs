//! Static file serving module
//!
//! Maps request paths onto the served root, then answers with the file, an
//! index file, a directory listing, a redirect, or 404.

use crate::config::FilesConfig;
use crate::handler::listing;
use crate::handler::router::RequestContext;
use crate::http::{self, cache};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Outcome of mapping a request path onto the served root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    File(PathBuf),
    Directory(PathBuf),
    NotFound,
}

/// Resolve a raw request path under `root`
///
/// `root` must already be canonical. The path is percent-decoded, empty and
/// `.` segments are dropped, `..` removes the previous segment (a leading one
/// is dropped), and the canonical target must stay inside `root`. A trailing
/// slash on a regular file is a miss.
pub fn resolve(root: &Path, request_path: &str) -> Resolved {
    let Ok(decoded) = urlencoding::decode(request_path) else {
        return Resolved::NotFound;
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            // Collapses against earlier segments, never above the root
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    let mut file_path = root.to_path_buf();
    for segment in segments {
        file_path.push(segment);
    }

    // File not found is common (404), no need to log at warning level
    let Ok(canonical) = file_path.canonicalize() else {
        return Resolved::NotFound;
    };
    if !canonical.starts_with(root) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            request_path,
            canonical.display()
        ));
        return Resolved::NotFound;
    }

    if canonical.is_dir() {
        Resolved::Directory(canonical)
    } else if decoded.ends_with('/') || !canonical.is_file() {
        Resolved::NotFound
    } else {
        Resolved::File(canonical)
    }
}

/// Serve a request path from the served root
pub async fn serve(
    ctx: &RequestContext<'_>,
    root: &Path,
    files: &FilesConfig,
) -> Response<Full<Bytes>> {
    match resolve(root, ctx.path) {
        Resolved::File(path) => serve_file(ctx, &path).await,
        Resolved::Directory(dir) => serve_directory(ctx, &dir, files).await,
        Resolved::NotFound => http::build_404_response(),
    }
}

/// Serve a directory: redirect, index file, or listing
async fn serve_directory(
    ctx: &RequestContext<'_>,
    dir: &Path,
    files: &FilesConfig,
) -> Response<Full<Bytes>> {
    if !ctx.path.ends_with('/') {
        let location = match ctx.query {
            Some(q) => format!("{}/?{q}", ctx.path),
            None => format!("{}/", ctx.path),
        };
        return http::build_redirect_response(&location);
    }

    for index_file in &files.index_files {
        let index_path = dir.join(index_file);
        if index_path.is_file() {
            return serve_file(ctx, &index_path).await;
        }
    }

    if !files.directory_listing {
        return http::build_404_response();
    }

    let display_path = urlencoding::decode(ctx.path)
        .map_or_else(|_| ctx.path.to_string(), |p| p.into_owned());
    match listing::render(dir, &display_path).await {
        Ok(html) => http::build_html_response(html, ctx.is_head),
        Err(e) => {
            logger::log_warning(&format!(
                "Failed to list directory '{}': {e}",
                dir.display()
            ));
            http::build_404_response()
        }
    }
}

/// Serve a single file, honoring `If-Modified-Since`
async fn serve_file(ctx: &RequestContext<'_>, path: &Path) -> Response<Full<Bytes>> {
    let modified = match fs::metadata(path).await.and_then(|m| m.modified()) {
        Ok(t) => t,
        Err(e) => {
            logger::log_error(&format!("Failed to stat file '{}': {e}", path.display()));
            return http::build_404_response();
        }
    };
    let last_modified = cache::format_http_date(modified);

    if cache::is_not_modified(
        ctx.if_modified_since.as_deref(),
        ctx.has_if_none_match,
        modified,
    ) {
        return http::build_304_response(&last_modified);
    }

    let content = match fs::read(path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", path.display()));
            return http::build_404_response();
        }
    };

    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    http::build_file_response(
        Bytes::from(content),
        content_type.as_ref(),
        &last_modified,
        ctx.is_head,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use std::fs as stdfs;

    fn ctx(path: &str) -> RequestContext<'_> {
        RequestContext {
            path,
            query: None,
            is_head: false,
            if_modified_since: None,
            has_if_none_match: false,
        }
    }

    fn served_root() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        stdfs::write(root.join("index.html"), "<h1>hi</h1>").unwrap();
        stdfs::create_dir(root.join("docs")).unwrap();
        stdfs::write(root.join("docs").join("guide.txt"), "guide").unwrap();
        stdfs::create_dir(root.join("assets")).unwrap();
        stdfs::write(root.join("assets").join("index.htm"), "assets index").unwrap();
        stdfs::write(root.join("hello world.txt"), "spaced").unwrap();
        (dir, root)
    }

    async fn body_string(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_resolve_file_and_directory() {
        let (_dir, root) = served_root();
        assert_eq!(
            resolve(&root, "/index.html"),
            Resolved::File(root.join("index.html"))
        );
        assert_eq!(resolve(&root, "/"), Resolved::Directory(root.clone()));
        assert_eq!(resolve(&root, "/docs"), Resolved::Directory(root.join("docs")));
        assert_eq!(resolve(&root, "/missing.html"), Resolved::NotFound);
    }

    #[test]
    fn test_resolve_percent_decoding() {
        let (_dir, root) = served_root();
        assert_eq!(
            resolve(&root, "/hello%20world.txt"),
            Resolved::File(root.join("hello world.txt"))
        );
        assert_eq!(resolve(&root, "/%FF%FE"), Resolved::NotFound);
    }

    #[test]
    fn test_resolve_trailing_slash_on_file() {
        let (_dir, root) = served_root();
        assert_eq!(resolve(&root, "/index.html/"), Resolved::NotFound);
    }

    #[test]
    fn test_resolve_never_escapes_root() {
        let (_dir, root) = served_root();
        let docs = root.join("docs");

        assert_eq!(resolve(&docs, "/../index.html"), Resolved::NotFound);
        assert_eq!(resolve(&docs, "/%2e%2e/index.html"), Resolved::NotFound);
        assert_eq!(resolve(&docs, "/..%2Findex.html"), Resolved::NotFound);
        assert_eq!(
            resolve(&root, "/../index.html"),
            Resolved::File(root.join("index.html"))
        );
        assert_eq!(
            resolve(&root, "/../../docs/../../index.html"),
            Resolved::File(root.join("index.html"))
        );
    }

    #[test]
    fn test_resolve_collapses_parent_segments() {
        let (_dir, root) = served_root();
        assert_eq!(
            resolve(&root, "/docs/../index.html"),
            Resolved::File(root.join("index.html"))
        );
        assert_eq!(
            resolve(&root, "/docs/./../assets/%2e%2e/docs/guide.txt"),
            Resolved::File(root.join("docs").join("guide.txt"))
        );
        assert_eq!(resolve(&root, "/docs/.."), Resolved::Directory(root.clone()));
        // `guide.txt` does not exist at the top level
        assert_eq!(resolve(&root, "/docs/../guide.txt"), Resolved::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_symlink_out_of_root() {
        let (_dir, root) = served_root();
        let outside = tempfile::tempdir().unwrap();
        stdfs::write(outside.path().join("secret.txt"), "secret").unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), root.join("link.txt"))
            .unwrap();

        assert_eq!(resolve(&root, "/link.txt"), Resolved::NotFound);
    }

    #[tokio::test]
    async fn test_directory_without_slash_redirects() {
        let (_dir, root) = served_root();
        let mut request = ctx("/docs");
        request.query = Some("a=1");

        let response = serve(&request, &root, &FilesConfig::default()).await;
        assert_eq!(response.status(), 301);
        assert_eq!(response.headers().get("location").unwrap(), "/docs/?a=1");
    }

    #[tokio::test]
    async fn test_directory_serves_index_file() {
        let (_dir, root) = served_root();

        let response = serve(&ctx("/"), &root, &FilesConfig::default()).await;
        assert_eq!(response.status(), 200);
        assert_eq!(body_string(response).await, "<h1>hi</h1>");

        let response = serve(&ctx("/assets/"), &root, &FilesConfig::default()).await;
        assert_eq!(body_string(response).await, "assets index");
    }

    #[tokio::test]
    async fn test_directory_listing() {
        let (_dir, root) = served_root();

        let response = serve(&ctx("/docs/"), &root, &FilesConfig::default()).await;
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/html; charset=utf-8"
        );
        let html = body_string(response).await;
        assert!(html.contains("Directory listing for /docs/"));
        assert!(html.contains(r#"<a href="guide.txt">guide.txt</a>"#));
    }

    #[tokio::test]
    async fn test_directory_listing_disabled() {
        let (_dir, root) = served_root();
        let files = FilesConfig {
            directory_listing: false,
            ..FilesConfig::default()
        };

        let response = serve(&ctx("/docs/"), &root, &files).await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_file_not_modified() {
        let (_dir, root) = served_root();
        let mut request = ctx("/index.html");
        request.if_modified_since = Some("Fri, 01 Jan 2100 00:00:00 GMT".to_string());

        let response = serve(&request, &root, &FilesConfig::default()).await;
        assert_eq!(response.status(), 304);
        assert!(response.headers().contains_key("last-modified"));
        assert!(body_string(response).await.is_empty());

        request.has_if_none_match = true;
        let response = serve(&request, &root, &FilesConfig::default()).await;
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_file_content_type() {
        let (_dir, root) = served_root();
        stdfs::write(root.join("data.bin.unknownext"), [0u8, 1, 2]).unwrap();

        let response = serve(&ctx("/docs/guide.txt"), &root, &FilesConfig::default()).await;
        assert_eq!(response.headers().get("content-type").unwrap(), "text/plain");

        let response = serve(&ctx("/data.bin.unknownext"), &root, &FilesConfig::default()).await;
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/octet-stream"
        );
    }
}
