//! Language type: validated locale plus `Accept-Language` negotiation.

use crate::i18n::accept::parse_accept_language;
use crate::i18n::LanguageRegistry;

/// A validated locale.
///
/// Values are only built from registry entries, so every `Language` has a
/// catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// Locale code (e.g., "en", "de", "ja")
    code: &'static str,
}

impl Language {
    pub const ENGLISH: Language = Language { code: "en" };
    pub const GERMAN: Language = Language { code: "de" };
    pub const JAPANESE: Language = Language { code: "ja" };

    /// The default locale, used whenever negotiation finds no match.
    pub fn canonical() -> Language {
        let config = LanguageRegistry::get().canonical();
        Language { code: config.code }
    }

    /// Pick the locale to render a page in from a raw `Accept-Language` value.
    ///
    /// A missing header is read as the default locale's own tag. Header
    /// entries are tried from most to least preferred; the first one that
    /// strictly matches an enabled locale wins. When nothing matches, the
    /// default locale is returned. This never fails.
    pub fn negotiate(header: Option<&str>) -> Language {
        let canonical = Language::canonical();
        let header = header.unwrap_or(canonical.code);
        let supported = LanguageRegistry::get().list_enabled();

        parse_accept_language(header)
            .iter()
            .find_map(|range| {
                supported
                    .iter()
                    .find(|config| range.matches(config.code))
                    .map(|config| Language { code: config.code })
            })
            .unwrap_or(canonical)
    }

    /// Get the locale code (e.g., "en", "de").
    pub fn code(&self) -> &'static str {
        self.code
    }
}
