//! Per-request pipeline: negotiate, fetch, localize, and fall back on failure.

use crate::assets::{Asset, AssetBody, AssetStore, FetchOptions};
use crate::config::Config;
use crate::error::{Failure, Unhandled};
use crate::i18n::{Language, LanguageStrings};
use crate::rewrite::PageLocalizer;
use axum::body::Body;
use axum::http::header::{
    HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CONTENT_LENGTH, X_CONTENT_TYPE_OPTIONS,
    X_FRAME_OPTIONS,
};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{debug, error, info, warn};

/// Asset served, with status 404, when the requested one cannot be
pub const NOT_FOUND_DOCUMENT: &str = "/404.html";

/// Serves localized assets from an [`AssetStore`].
pub struct SiteLocalizer<S> {
    store: S,
    debug: bool,
}

impl<S: AssetStore> SiteLocalizer<S> {
    pub fn new(store: S, config: &Config) -> Self {
        Self {
            store,
            debug: config.debug,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Answer one request.
    ///
    /// Every failure the pipeline can describe becomes a response (the
    /// not-found document or a plain 500). An [`Unhandled`] failure is
    /// returned as-is for the caller to deal with.
    pub async fn serve(&self, request: &Parts) -> Result<Response, Unhandled> {
        match self.localize(request).await {
            Ok(response) => Ok(response),
            Err(failure) => self.recover(request, failure).await,
        }
    }

    async fn localize(&self, request: &Parts) -> Result<Response, Failure> {
        let header = request
            .headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok());
        let language = Language::negotiate(header);
        let strings = LanguageStrings::for_language(language);

        let options = FetchOptions {
            bypass_cache: self.debug,
            ..FetchOptions::default()
        };
        let asset = self.store.fetch(request, &options).await?;

        let mut response = if asset.is_html() {
            debug!(
                "Localizing {} as '{}'",
                request.uri.path(),
                language.code()
            );
            let Asset {
                status,
                mut headers,
                body,
            } = asset;
            headers.remove(CONTENT_LENGTH);
            let body = PageLocalizer::new(language, strings).localize(body).await?;
            build_response(status, headers, body)
        } else {
            build_response(asset.status, asset.headers, asset.body)
        };

        let headers = response.headers_mut();
        headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
        headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));

        Ok(response)
    }

    /// Turn a failed request into a response.
    ///
    /// Outside debug mode the not-found document is tried first; its own
    /// failure is swallowed. What is left: a 500 carrying the error text, or
    /// the unhandled value handed back untouched.
    async fn recover(&self, request: &Parts, failure: Failure) -> Result<Response, Unhandled> {
        let path = request.uri.path();

        if !self.debug {
            let options = FetchOptions::serve_fixed(NOT_FOUND_DOCUMENT);
            match self.store.fetch(request, &options).await {
                Ok(not_found) => {
                    info!("Serving {} for {}: {:?}", NOT_FOUND_DOCUMENT, path, failure);
                    return Ok(build_response(
                        StatusCode::NOT_FOUND,
                        not_found.headers,
                        not_found.body,
                    ));
                }
                Err(fallback) => {
                    debug!("{} unavailable: {:?}", NOT_FOUND_DOCUMENT, fallback);
                }
            }
        }

        match failure {
            Failure::Error(e) => {
                error!("Request for {} failed: {}", path, e);
                Ok((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response())
            }
            Failure::Unhandled(unhandled) => {
                warn!("Request for {} failed with {:?}", path, unhandled);
                Err(unhandled)
            }
        }
    }
}

fn build_response(status: StatusCode, headers: HeaderMap, body: AssetBody) -> Response {
    let mut response = Response::new(Body::from_stream(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServeError;
    use crate::i18n::strings::{ENGLISH_STRINGS, GERMAN_STRINGS};
    use axum::body::{to_bytes, Bytes};
    use axum::http::header::CONTENT_TYPE;
    use axum::http::Request;
    use futures::stream::{self, StreamExt};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const PAGE: &str = r#"<html lang="en"><head><title data-i18n-key="title">t</title></head><body><h1 data-i18n-key="headline">h</h1></body></html>"#;
    const NOT_FOUND_PAGE: &str = "<html><body>Nothing here</body></html>";

    /// What the mock store does for one asset path
    #[derive(Clone)]
    enum Entry {
        Html(&'static str),
        Binary(&'static [u8]),
        Fail(&'static str),
        FailMidStream,
        FailAfterHead,
        Panic(&'static str),
    }

    #[derive(Default)]
    struct MockStore {
        entries: HashMap<&'static str, Entry>,
        fetches: AtomicUsize,
        options_seen: Mutex<Vec<bool>>,
    }

    impl MockStore {
        fn with(mut self, path: &'static str, entry: Entry) -> Self {
            self.entries.insert(path, entry);
            self
        }
    }

    impl AssetStore for MockStore {
        async fn fetch(&self, request: &Parts, options: &FetchOptions) -> Result<Asset, Failure> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.options_seen.lock().unwrap().push(options.bypass_cache);

            let path = options.asset_path(request.uri.path());
            let html_headers = || {
                let mut headers = HeaderMap::new();
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
                headers
            };

            match self.entries.get(path.as_str()).cloned() {
                Some(Entry::Html(html)) => {
                    let mut headers = html_headers();
                    headers.insert(CONTENT_LENGTH, HeaderValue::from(html.len()));
                    Ok(Asset::from_bytes(
                        StatusCode::OK,
                        headers,
                        Bytes::from_static(html.as_bytes()),
                    ))
                }
                Some(Entry::Binary(bytes)) => {
                    let mut headers = HeaderMap::new();
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/png"));
                    Ok(Asset::from_bytes(
                        StatusCode::OK,
                        headers,
                        Bytes::from_static(bytes),
                    ))
                }
                Some(Entry::Fail(message)) => Err(ServeError::Other(message.to_string()).into()),
                Some(Entry::FailMidStream) => Ok(Asset {
                    status: StatusCode::OK,
                    headers: html_headers(),
                    body: stream::iter(vec![Err(ServeError::Other("stream broke".to_string()))])
                        .boxed(),
                }),
                Some(Entry::FailAfterHead) => Ok(Asset {
                    status: StatusCode::OK,
                    headers: html_headers(),
                    body: stream::iter(vec![
                        Ok(Bytes::from_static(b"<html><head></head><body>")),
                        Err(ServeError::Other("stream broke".to_string())),
                    ])
                    .boxed(),
                }),
                Some(Entry::Panic(message)) => Err(Unhandled::new(Box::new(message)).into()),
                None => Err(ServeError::NotFound(path).into()),
            }
        }
    }

    fn site(store: MockStore, debug: bool) -> SiteLocalizer<MockStore> {
        let config = Config {
            port: 0,
            assets_dir: String::new(),
            debug,
        };
        SiteLocalizer::new(store, &config)
    }

    fn request(path: &str, accept_language: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(path);
        if let Some(value) = accept_language {
            builder = builder.header(ACCEPT_LANGUAGE, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    // ==================== Success Path ====================

    #[tokio::test]
    async fn test_german_page() {
        let site = site(MockStore::default().with("/index.html", Entry::Html(PAGE)), false);

        let response = site
            .serve(&request("/", Some("de-DE,de;q=0.9,en;q=0.8")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[X_FRAME_OPTIONS], "DENY");
        assert_eq!(response.headers()[X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert!(response.headers().get(CONTENT_LENGTH).is_none());

        let html = body_text(response).await;
        assert!(html.contains(r#"<html lang="de">"#));
        assert!(html.contains(GERMAN_STRINGS.title));
        assert!(html.contains(GERMAN_STRINGS.headline));
        assert!(html.contains(&format!(r#"content="{}""#, GERMAN_STRINGS.subtitle)));
    }

    #[tokio::test]
    async fn test_unsupported_language_uses_english() {
        let site = site(MockStore::default().with("/index.html", Entry::Html(PAGE)), false);

        let response = site.serve(&request("/", Some("fr-FR"))).await.unwrap();
        let html = body_text(response).await;

        assert!(html.contains(r#"<html lang="en">"#));
        assert!(html.contains(ENGLISH_STRINGS.headline));
    }

    #[tokio::test]
    async fn test_missing_header_uses_english() {
        let site = site(MockStore::default().with("/index.html", Entry::Html(PAGE)), false);

        let html = body_text(site.serve(&request("/", None)).await.unwrap()).await;
        assert!(html.contains(ENGLISH_STRINGS.subtitle));
    }

    #[tokio::test]
    async fn test_binary_assets_pass_through_with_security_headers() {
        let png: &'static [u8] = &[0x89, b'P', b'N', b'G', b'<', b'h', b'e', b'a', b'd', b'>'];
        let site = site(MockStore::default().with("/logo.png", Entry::Binary(png)), false);

        let response = site.serve(&request("/logo.png", Some("ja"))).await.unwrap();
        assert_eq!(response.headers()[X_FRAME_OPTIONS], "DENY");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], png);
    }

    #[tokio::test]
    async fn test_production_fetch_does_not_bypass_cache() {
        let site = site(MockStore::default().with("/index.html", Entry::Html(PAGE)), false);
        site.serve(&request("/", None)).await.unwrap();
        assert_eq!(*site.store().options_seen.lock().unwrap(), vec![false]);
    }

    // ==================== Fallback Path ====================

    #[tokio::test]
    async fn test_missing_asset_serves_not_found_document() {
        let site = site(
            MockStore::default().with("/404.html", Entry::Html(NOT_FOUND_PAGE)),
            false,
        );

        let response = site.serve(&request("/missing.png", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        // The not-found document is served as stored: no rewrite, no extra headers
        assert!(response.headers().get(X_FRAME_OPTIONS).is_none());
        assert_eq!(body_text(response).await, NOT_FOUND_PAGE);
    }

    #[tokio::test]
    async fn test_stream_failure_before_output_serves_not_found_document() {
        let site = site(
            MockStore::default()
                .with("/index.html", Entry::FailMidStream)
                .with("/404.html", Entry::Html(NOT_FOUND_PAGE)),
            false,
        );

        let response = site.serve(&request("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stream_failure_after_output_keeps_response() {
        let site = site(
            MockStore::default()
                .with("/index.html", Entry::FailAfterHead)
                .with("/404.html", Entry::Html(NOT_FOUND_PAGE)),
            false,
        );

        let response = site.serve(&request("/", Some("ja"))).await.unwrap();

        // Already committed: the status stays, the body ends with the error
        assert_eq!(response.status(), StatusCode::OK);
        assert!(to_bytes(response.into_body(), usize::MAX).await.is_err());
        assert_eq!(site.store().fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_failure_gives_500_with_message() {
        let site = site(MockStore::default().with("/index.html", Entry::Fail("boom")), false);

        let response = site.serve(&request("/", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("boom"));
        // Primary fetch and one not-found attempt, nothing else
        assert_eq!(site.store().fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fallback_error_is_not_reported() {
        let site = site(
            MockStore::default()
                .with("/index.html", Entry::Fail("boom"))
                .with("/404.html", Entry::Fail("second failure")),
            false,
        );

        let response = site.serve(&request("/", None)).await.unwrap();
        let text = body_text(response).await;
        assert!(text.contains("boom"));
        assert!(!text.contains("second failure"));
    }

    #[tokio::test]
    async fn test_unhandled_failure_escapes() {
        let with_not_found = site(
            MockStore::default()
                .with("/index.html", Entry::Panic("not an error"))
                .with("/404.html", Entry::Html(NOT_FOUND_PAGE)),
            false,
        );

        // The not-found document still wins when it can be served
        let response = with_not_found.serve(&request("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bare = site(
            MockStore::default().with("/index.html", Entry::Panic("not an error")),
            false,
        );
        let unhandled = bare.serve(&request("/", None)).await.unwrap_err();
        assert_eq!(unhandled.message(), Some("not an error"));
    }

    // ==================== Debug Mode ====================

    #[tokio::test]
    async fn test_debug_skips_not_found_document() {
        let site = site(
            MockStore::default().with("/404.html", Entry::Html(NOT_FOUND_PAGE)),
            true,
        );

        let response = site.serve(&request("/missing.png", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("/missing.png"));
        assert_eq!(site.store().fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_debug_bypasses_cache() {
        let site = site(MockStore::default().with("/index.html", Entry::Html(PAGE)), true);
        site.serve(&request("/", None)).await.unwrap();
        assert_eq!(*site.store().options_seen.lock().unwrap(), vec![true]);
    }
}
