//! Internationalization (i18n) module for localized pages.
//!
//! All locale-related logic and the compiled-in message catalog live here.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for all supported locales and their metadata
//! - `language`: Validated `Language` type and `Accept-Language` negotiation
//! - `accept`: `Accept-Language` header parsing
//! - `strings`: The message catalog, one `LanguageStrings` entry per locale
//! - `validator`: Startup checks that the catalog is complete plain text
//!
//! # Example
//!
//! ```rust,ignore
//! use site_localizer::i18n::{Language, LanguageStrings};
//!
//! let language = Language::negotiate(Some("de-DE,de;q=0.9,en;q=0.8"));
//! assert_eq!(language.code(), "de");
//!
//! let strings = LanguageStrings::for_language(language);
//! assert_eq!(strings.title, "Beispielseite");
//! ```

mod accept;
mod language;
mod registry;
pub mod strings;
mod validator;

pub use accept::{parse_accept_language, LanguageRange};
pub use language::Language;
pub use registry::{LanguageConfig, LanguageRegistry};
pub use strings::{LanguageStrings, FIELD_NAMES};
pub use validator::{CatalogValidator, ValidationReport};
