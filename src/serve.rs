//! HTTP preview server: renders markdown under a root directory as
//! enhanced pages.

use std::io;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use thiserror::Error;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{debug, info, warn};

use crate::config::EnhanceConfig;
use crate::shell::{fallback_title, render_page, sibling_pages, ShellContext};
use crate::web_assets::{self, SCRIPT_PATH, STYLESHEET_PATH};

/// Maximum number of consecutive ports to try before giving up.
const MAX_PORT_ATTEMPTS: u16 = 100;

/// Largest file that will be read and served (16 MiB).
pub const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

pub struct AppState {
    /// Directory holding the entry file; every served path resolves under it.
    pub serve_root: PathBuf,
    /// Canonical `serve_root`, for symlink-safe containment checks.
    pub canonical_root: PathBuf,
    /// Served for `/`.
    pub entry_file: PathBuf,
    pub config: EnhanceConfig,
}

/// Why a request path did not resolve to a servable file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("invalid percent-encoding")]
    InvalidEncoding,
    #[error("null byte in path")]
    NullByte,
    #[error("path escapes the serve root")]
    Traversal,
    #[error("no matching file")]
    NotFound,
    #[error("resolved outside the serve root")]
    OutsideRoot,
    #[error("{size} bytes exceeds the {limit} byte limit", limit = MAX_FILE_SIZE)]
    TooLarge { size: u64 },
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        match self {
            ResolveError::TooLarge { .. } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                plain_text(),
                format!("Content Too Large: {self}"),
            )
                .into_response(),
            _ => (StatusCode::NOT_FOUND, plain_text(), "Not Found").into_response(),
        }
    }
}

/// Which fallback rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Entry,
    Exact,
    Readme,
    Index,
    Extensionless,
}

#[derive(Debug)]
pub struct Resolved {
    pub path: PathBuf,
    pub branch: Branch,
    pub size: u64,
}

/// Bind `bind_addr:start_port`, stepping to the next port on `EADDRINUSE`
/// up to [`MAX_PORT_ATTEMPTS`] times. Other bind errors fail immediately.
pub fn bind_with_retry(bind_addr: &str, start_port: u16) -> io::Result<(TcpListener, u16)> {
    let mut port = start_port;
    for _ in 0..MAX_PORT_ATTEMPTS {
        match TcpListener::bind((bind_addr, port)) {
            Ok(listener) => {
                debug!(port, "bound");
                return Ok((listener, port));
            }
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                debug!(port, "address in use, trying next port");
                port = port.wrapping_add(1);
            }
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AddrInUse,
        format!("no free port in {MAX_PORT_ATTEMPTS} attempts starting at {start_port}"),
    ))
}

// ---------------------------------------------------------------------------
// Path resolution
// ---------------------------------------------------------------------------

/// Percent-decode a URL path. Malformed escapes and non-UTF-8 results are
/// rejected.
pub fn percent_decode(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let hex = bytes.get(i + 1..i + 3)?;
        let hi = (hex[0] as char).to_digit(16)?;
        let lo = (hex[1] as char).to_digit(16)?;
        out.push((hi * 16 + lo) as u8);
        i += 3;
    }
    String::from_utf8(out).ok()
}

/// Resolve `.` and `..` without touching the filesystem. `None` when a `..`
/// would climb above the root.
pub fn normalize_path(decoded: &str) -> Option<PathBuf> {
    let mut parts: Vec<&str> = Vec::new();
    for component in decoded.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            name => parts.push(name),
        }
    }
    Some(parts.iter().collect())
}

/// `Content-Type` for a file extension, case-insensitive. Unknown types are
/// `application/octet-stream` so browsers never sniff.
pub fn mime_for_ext(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "md" | "txt" => "text/plain; charset=utf-8",
        "css" => "text/css",
        "js" => "text/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Apply the fallback rules to `candidate`: the exact file, then
/// `<candidate>.md` when it has no extension, then `README.md` and
/// `index.md` inside a directory.
pub async fn resolve_candidate(candidate: &Path) -> Option<(PathBuf, Branch)> {
    if is_file(candidate).await {
        return Some((candidate.to_path_buf(), Branch::Exact));
    }
    if candidate.extension().is_none() {
        let with_md = candidate.with_extension("md");
        if is_file(&with_md).await {
            return Some((with_md, Branch::Extensionless));
        }
    }
    for (name, branch) in [("README.md", Branch::Readme), ("index.md", Branch::Index)] {
        let inner = candidate.join(name);
        if is_file(&inner).await {
            return Some((inner, branch));
        }
    }
    None
}

/// Turn a raw request path into a file under the serve root.
pub async fn resolve_request(state: &AppState, raw_path: &str) -> Result<Resolved, ResolveError> {
    let decoded = percent_decode(raw_path).ok_or(ResolveError::InvalidEncoding)?;
    if decoded.contains('\0') {
        return Err(ResolveError::NullByte);
    }
    let normalized = normalize_path(&decoded).ok_or(ResolveError::Traversal)?;

    let (resolved, branch) = if normalized.as_os_str().is_empty() {
        (state.entry_file.clone(), Branch::Entry)
    } else {
        resolve_candidate(&state.serve_root.join(&normalized))
            .await
            .ok_or(ResolveError::NotFound)?
    };

    let canonical = tokio::fs::canonicalize(&resolved)
        .await
        .map_err(|_| ResolveError::NotFound)?;
    if !canonical.starts_with(&state.canonical_root) {
        return Err(ResolveError::OutsideRoot);
    }

    let size = tokio::fs::metadata(&canonical)
        .await
        .map_err(|_| ResolveError::NotFound)?
        .len();
    if size > MAX_FILE_SIZE {
        return Err(ResolveError::TooLarge { size });
    }
    Ok(Resolved {
        path: canonical,
        branch,
        size,
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn plain_text() -> [(HeaderName, &'static str); 1] {
    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")]
}

/// `true` when the query string carries exactly `raw=1`.
fn is_raw_mode(query: &str) -> bool {
    query.split('&').any(|param| param == "raw=1")
}

/// Dropdown links for the markdown files beside `file`, as root-relative
/// URLs.
fn nav_pages(state: &AppState, file: &Path) -> Vec<crate::shell::NavLink> {
    let Some(dir) = file.parent() else {
        return Vec::new();
    };
    let rel_dir = dir.strip_prefix(&state.canonical_root).unwrap_or(Path::new(""));
    sibling_pages(dir, |name| {
        let rel = rel_dir.join(name);
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        format!("/{}", parts.join("/"))
    })
}

fn render_markdown_file(state: &AppState, file: &Path, source: &str) -> String {
    let pages = nav_pages(state, file);
    let fallback = fallback_title(file);
    let site_title = fallback_title(&state.entry_file);
    let ctx = ShellContext {
        site_title: &site_title,
        pages: &pages,
        fallback_title: &fallback,
    };
    render_page(source, &ctx, &state.config).html
}

async fn serve_handler(State(state): State<Arc<AppState>>, req: Request) -> Response {
    let raw_path = req.uri().path().to_owned();
    let query = req.uri().query().unwrap_or("").to_owned();

    if raw_path == STYLESHEET_PATH {
        return ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], web_assets::CSS)
            .into_response();
    }
    if raw_path == SCRIPT_PATH {
        return ([(header::CONTENT_TYPE, "text/javascript; charset=utf-8")], web_assets::JS)
            .into_response();
    }

    let resolved = match resolve_request(&state, &raw_path).await {
        Ok(r) => r,
        Err(e) => {
            warn!(path = %raw_path, reason = %e, "request denied");
            return e.into_response();
        }
    };
    debug!(path = %raw_path, branch = ?resolved.branch, size = resolved.size, "resolved");

    let ext = resolved
        .path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_owned();

    if !ext.eq_ignore_ascii_case("md") {
        return match tokio::fs::read(&resolved.path).await {
            Ok(bytes) => ([(header::CONTENT_TYPE, mime_for_ext(&ext))], bytes).into_response(),
            Err(_) => ResolveError::NotFound.into_response(),
        };
    }

    let source = match tokio::fs::read_to_string(&resolved.path).await {
        Ok(s) => s,
        Err(_) => return ResolveError::NotFound.into_response(),
    };
    if is_raw_mode(&query) {
        return (plain_text(), source).into_response();
    }

    let file = resolved.path;
    let rendered = {
        let state = Arc::clone(&state);
        tokio::task::spawn_blocking(move || render_markdown_file(&state, &file, &source)).await
    };
    match rendered {
        Ok(html) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            Body::from(html),
        )
            .into_response(),
        Err(e) => {
            warn!(path = %raw_path, error = %e, "render task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(serve_handler)
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Serve the directory containing `file` until SIGINT.
pub async fn run_serve(
    file: &Path,
    bind_addr: &str,
    start_port: u16,
    config: EnhanceConfig,
) -> io::Result<()> {
    let entry_file = std::fs::canonicalize(file)?;
    let serve_root = entry_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let canonical_root = std::fs::canonicalize(&serve_root)?;

    let (std_listener, port) = bind_with_retry(bind_addr, start_port)?;
    std_listener.set_nonblocking(true)?;
    let listener = tokio::net::TcpListener::from_std(std_listener)?;

    println!("docshell serve");
    println!("root:  {}", canonical_root.display());
    println!("entry: {}", entry_file.display());
    println!("url:   http://{bind_addr}:{port}/");
    info!(addr = %bind_addr, port, "listening");

    let state = Arc::new(AppState {
        serve_root,
        canonical_root,
        entry_file,
        config,
    });

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for SIGINT");
                std::future::pending::<()>().await;
            }
            info!("shutting down");
        })
        .await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
