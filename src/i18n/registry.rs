//! Language registry: Single source of truth for all supported locales.
//!
//! The registry lists every locale the site can be rendered in. It is built
//! once on first access behind a `OnceLock` and never changes afterwards, so
//! request handlers can read it concurrently without locking.

use std::sync::OnceLock;

/// Configuration for a supported locale.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Locale code as it appears in `Accept-Language` and in `lang` (e.g., "en", "de")
    pub code: &'static str,

    /// Whether this is the default locale used when negotiation finds no match
    pub is_canonical: bool,
}

/// Global language registry singleton.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get a language configuration by its code (case-insensitive).
    ///
    /// # Returns
    /// * `Some(&LanguageConfig)` if the locale exists
    /// * `None` if the locale is not registered
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages
            .iter()
            .find(|lang| lang.code.eq_ignore_ascii_case(code))
    }

    /// Get all languages negotiation may select, in registration order.
    ///
    /// Negotiation walks this list, so the order decides ties between
    /// equally ranked header entries that match several locales.
    pub fn list_enabled(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }

    /// Get the default locale configuration.
    ///
    /// # Panics
    /// Panics if the registry does not define exactly one canonical locale.
    /// The registry is compiled in, so this is a build-time mistake rather
    /// than something a request can trigger.
    pub fn canonical(&self) -> &LanguageConfig {
        let canonical_langs: Vec<_> = self
            .languages
            .iter()
            .filter(|lang| lang.is_canonical)
            .collect();

        match canonical_langs.len() {
            0 => panic!("No canonical language found in registry"),
            1 => canonical_langs[0],
            _ => panic!("Multiple canonical languages found in registry"),
        }
    }

    /// Check if a locale code is supported.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }
}

/// Locales the site ships text for: English (default), German and Japanese.
fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "en",
            is_canonical: true,
        },
        LanguageConfig {
            code: "de",
            is_canonical: false,
        },
        LanguageConfig {
            code: "ja",
            is_canonical: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_get_returns_singleton() {
        let registry1 = LanguageRegistry::get();
        let registry2 = LanguageRegistry::get();

        assert!(std::ptr::eq(registry1, registry2));
    }

    #[test]
    fn test_get_by_code_english() {
        let config = LanguageRegistry::get().get_by_code("en").unwrap();
        assert_eq!(config.code, "en");
        assert!(config.is_canonical);
    }

    #[test]
    fn test_get_by_code_german() {
        let config = LanguageRegistry::get().get_by_code("de").unwrap();
        assert_eq!(config.code, "de");
        assert!(!config.is_canonical);
    }

    #[test]
    fn test_get_by_code_is_case_insensitive() {
        let config = LanguageRegistry::get().get_by_code("JA").unwrap();
        assert_eq!(config.code, "ja");
    }

    #[test]
    fn test_get_by_code_nonexistent() {
        assert!(LanguageRegistry::get().get_by_code("fr").is_none());
        assert!(LanguageRegistry::get().get_by_code("").is_none());
    }

    #[test]
    fn test_list_enabled_in_registration_order() {
        let codes: Vec<_> = LanguageRegistry::get()
            .list_enabled()
            .iter()
            .map(|lang| lang.code)
            .collect();
        assert_eq!(codes, vec!["en", "de", "ja"]);
    }

    #[test]
    fn test_canonical_is_english() {
        let canonical = LanguageRegistry::get().canonical();
        assert_eq!(canonical.code, "en");
        assert!(canonical.is_canonical);
    }

    #[test]
    fn test_is_enabled() {
        let registry = LanguageRegistry::get();
        assert!(registry.is_enabled("en"));
        assert!(registry.is_enabled("de"));
        assert!(registry.is_enabled("ja"));
        assert!(!registry.is_enabled("es"));
    }
}
