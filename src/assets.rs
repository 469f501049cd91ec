//! Static asset storage.
//!
//! [`AssetStore`] is the seam between the request pipeline and wherever the
//! site's files live. [`DirAssetStore`] serves a directory on disk and keeps
//! the bytes it has read in memory.

use crate::error::{Failure, ServeError, Unhandled};
use axum::body::Bytes;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::request::Parts;
use axum::http::{Method, StatusCode};
use futures::stream::{self, BoxStream, StreamExt};
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Size of the chunks an in-memory asset is streamed in
pub const CHUNK_SIZE: usize = 16 * 1024;

/// Body of a fetched asset, streamed chunk by chunk
pub type AssetBody = BoxStream<'static, Result<Bytes, ServeError>>;

/// Maps a request path to the path of the asset that should answer it
pub type MapRequestToAsset = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A fetched asset ready to be turned into a response.
pub struct Asset {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: AssetBody,
}

impl Asset {
    /// An asset whose bytes are already in memory.
    pub fn from_bytes(status: StatusCode, headers: HeaderMap, bytes: Bytes) -> Self {
        Self {
            status,
            headers,
            body: chunked(bytes),
        }
    }

    /// Whether the asset declares an HTML content type.
    pub fn is_html(&self) -> bool {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| {
                value
                    .split(';')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .eq_ignore_ascii_case("text/html")
            })
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Asset")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Options for a single fetch.
#[derive(Clone, Default)]
pub struct FetchOptions {
    /// Skip the store's cache for both reads and writes
    pub bypass_cache: bool,

    /// Replaces [`default_map_request_to_asset`] when set
    pub map_request_to_asset: Option<MapRequestToAsset>,
}

impl FetchOptions {
    /// Options that answer every request with the asset at `path`.
    pub fn serve_fixed(path: &str) -> Self {
        let path = path.to_string();
        Self {
            bypass_cache: false,
            map_request_to_asset: Some(Arc::new(move |_| path.clone())),
        }
    }

    /// Resolve the asset path for a request path.
    pub fn asset_path(&self, request_path: &str) -> String {
        match &self.map_request_to_asset {
            Some(map) => map(request_path),
            None => default_map_request_to_asset(request_path),
        }
    }
}

impl std::fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchOptions")
            .field("bypass_cache", &self.bypass_cache)
            .field("map_request_to_asset", &self.map_request_to_asset.is_some())
            .finish()
    }
}

/// Map directory-style paths to their `index.html`.
///
/// `/` and `/docs/` become `/index.html` and `/docs/index.html`; a last
/// segment without an extension (`/about`) becomes `/about/index.html`.
/// Anything else is returned unchanged.
pub fn default_map_request_to_asset(path: &str) -> String {
    if path.is_empty() {
        return "/index.html".to_string();
    }
    if path.ends_with('/') {
        return format!("{}index.html", path);
    }

    let last_segment = path.rsplit('/').next().unwrap_or_default();
    if last_segment.contains('.') {
        path.to_string()
    } else {
        format!("{}/index.html", path)
    }
}

/// Source of static assets.
///
/// Implementations fail with [`Failure::Error`] for anything they can
/// describe (missing asset, I/O error) and with [`Failure::Unhandled`] for
/// anything else. Failures are never retried by the caller.
pub trait AssetStore: Send + Sync + 'static {
    fn fetch(
        &self,
        request: &Parts,
        options: &FetchOptions,
    ) -> impl Future<Output = Result<Asset, Failure>> + Send;
}

/// Asset store backed by a directory on disk.
pub struct DirAssetStore {
    root: PathBuf,
    cache: RwLock<HashMap<String, Bytes>>,
}

impl DirAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Number of assets currently held in memory.
    pub async fn cached_len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// File system location of an asset path, refusing anything that would
    /// leave the root or embeds a NUL byte.
    fn resolve(&self, asset_path: &str) -> Option<PathBuf> {
        if asset_path.contains('\0') {
            return None;
        }
        let relative = Path::new(asset_path.trim_start_matches('/'));
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(resolved)
    }

    async fn read(&self, asset_path: &str, bypass_cache: bool) -> Result<Bytes, Failure> {
        if !bypass_cache {
            if let Some(bytes) = self.cache.read().await.get(asset_path) {
                debug!("Serving {} from cache", asset_path);
                return Ok(bytes.clone());
            }
        }

        let file = self
            .resolve(asset_path)
            .ok_or_else(|| ServeError::NotFound(asset_path.to_string()))?;

        let read = tokio::task::spawn_blocking(move || std::fs::read(file)).await;
        let bytes = match read {
            Ok(Ok(bytes)) => Bytes::from(bytes),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ServeError::NotFound(asset_path.to_string()).into());
            }
            // Directories read as an error on most platforms
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::IsADirectory => {
                return Err(ServeError::NotFound(asset_path.to_string()).into());
            }
            Ok(Err(e)) => {
                return Err(ServeError::Io {
                    path: asset_path.to_string(),
                    source: e,
                }
                .into());
            }
            Err(join_error) => {
                return match join_error.try_into_panic() {
                    Ok(payload) => Err(Unhandled::new(payload).into()),
                    Err(join_error) => Err(ServeError::Io {
                        path: asset_path.to_string(),
                        source: std::io::Error::other(join_error),
                    }
                    .into()),
                };
            }
        };

        if !bypass_cache {
            self.cache
                .write()
                .await
                .insert(asset_path.to_string(), bytes.clone());
        }

        Ok(bytes)
    }
}

impl AssetStore for DirAssetStore {
    async fn fetch(&self, request: &Parts, options: &FetchOptions) -> Result<Asset, Failure> {
        if request.method != Method::GET && request.method != Method::HEAD {
            return Err(ServeError::MethodNotAllowed(request.method.clone()).into());
        }

        // Invalid UTF-8 decodes to U+FFFD, which names no file
        let request_path = percent_decode_str(request.uri.path()).decode_utf8_lossy();
        let asset_path = options.asset_path(&request_path);
        let bytes = self.read(&asset_path, options.bypass_cache).await?;

        let mut headers = HeaderMap::new();
        let mime = mime_guess::from_path(&asset_path).first_or_octet_stream();
        if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
            headers.insert(header::CONTENT_TYPE, value);
        }
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));

        if request.method == Method::HEAD {
            return Ok(Asset {
                status: StatusCode::OK,
                headers,
                body: stream::empty().boxed(),
            });
        }

        Ok(Asset::from_bytes(StatusCode::OK, headers, bytes))
    }
}

/// Stream in-memory bytes as zero-copy slices of at most [`CHUNK_SIZE`].
pub fn chunked(bytes: Bytes) -> AssetBody {
    let chunks: Vec<Result<Bytes, ServeError>> = (0..bytes.len())
        .step_by(CHUNK_SIZE)
        .map(|start| Ok(bytes.slice(start..(start + CHUNK_SIZE).min(bytes.len()))))
        .collect();
    stream::iter(chunks).boxed()
}
