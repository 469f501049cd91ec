//! Static site server that localizes HTML pages on the fly.
//!
//! Each request negotiates a locale from `Accept-Language`, fetches the
//! asset from an [`assets::AssetStore`], and streams HTML through
//! [`rewrite::PageLocalizer`]. Failures fall back to `/404.html`, then to a
//! plain 500.

pub mod assets;
pub mod config;
pub mod error;
pub mod handler;
pub mod i18n;
pub mod rewrite;
pub mod server;
