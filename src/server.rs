use crate::assets::{AssetStore, DirAssetStore};
use crate::config::Config;
use crate::handler::SiteLocalizer;
use crate::i18n::CatalogValidator;
use anyhow::{Context, Result};
use axum::extract::{Request, State};
use axum::response::Response;
use axum::Router;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Router answering every path with a localized asset.
///
/// Unhandled failures are re-raised as panics and turned into the runtime's
/// generic 500 by `CatchPanicLayer`.
pub fn router<S: AssetStore>(site: Arc<SiteLocalizer<S>>) -> Router {
    Router::new()
        .fallback(serve_asset::<S>)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(site)
}

async fn serve_asset<S: AssetStore>(
    State(site): State<Arc<SiteLocalizer<S>>>,
    request: Request,
) -> Response {
    let (parts, _body) = request.into_parts();
    match site.serve(&parts).await {
        Ok(response) => response,
        Err(unhandled) => unhandled.resume(),
    }
}

/// Check the catalog, then serve `config.assets_dir` until the process exits.
pub async fn run(config: Config) -> Result<()> {
    let report = CatalogValidator::validate();
    for error in &report.errors {
        warn!("Catalog error: {}", error);
    }
    for warning in &report.warnings {
        warn!("Catalog warning: {}", warning);
    }

    if config.debug {
        warn!("Debug mode is on: asset cache bypassed, no not-found page");
    }

    let store = DirAssetStore::new(&config.assets_dir);
    let site = Arc::new(SiteLocalizer::new(store, &config));
    let app = router(site);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Serving {} on {}", config.assets_dir, addr);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
