//! Message catalog validation.
//!
//! Checks the compiled-in catalog against the registry: every enabled locale
//! needs a complete entry, and entries must be plain text because the
//! rewrite rules decide how each value is escaped.

use crate::i18n::{LanguageRegistry, LanguageStrings};
use regex::Regex;
use std::sync::OnceLock;

/// Validation report containing errors and warnings about the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Problems that make a page render with missing text
    pub errors: Vec<String>,

    /// Suspicious values that still render
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if the report is clean (no errors or warnings)
    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator for the message catalog.
pub struct CatalogValidator;

static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static ENTITY_REGEX: OnceLock<Regex> = OnceLock::new();

impl CatalogValidator {
    /// Validate the catalog entry of every enabled locale.
    pub fn validate() -> ValidationReport {
        let mut report = ValidationReport::new();

        for config in LanguageRegistry::get().list_enabled() {
            let entry = Self::validate_entry(config.code, LanguageStrings::for_code(config.code));
            report.errors.extend(entry.errors);
            report.warnings.extend(entry.warnings);
        }

        report
    }

    /// Validate a single entry.
    ///
    /// Errors: empty fields (a page would keep its source text).
    /// Warnings: HTML tags or character entities inside a value, which the
    /// text substitution rule would show escaped rather than render.
    pub fn validate_entry(code: &str, strings: &LanguageStrings) -> ValidationReport {
        let mut report = ValidationReport::new();

        for (name, value) in strings.fields() {
            if value.trim().is_empty() {
                report
                    .errors
                    .push(format!("Locale '{}' has no text for '{}'", code, name));
                continue;
            }

            if Self::contains_tag(value) {
                report.warnings.push(format!(
                    "Locale '{}' field '{}' contains an HTML tag",
                    code, name
                ));
            }

            if Self::contains_entity(value) {
                report.warnings.push(format!(
                    "Locale '{}' field '{}' contains an HTML entity",
                    code, name
                ));
            }
        }

        report
    }

    fn contains_tag(text: &str) -> bool {
        let regex = TAG_REGEX.get_or_init(|| {
            Regex::new(r"</?[a-zA-Z][^>]*>").expect("tag pattern is valid")
        });
        regex.is_match(text)
    }

    fn contains_entity(text: &str) -> bool {
        let regex = ENTITY_REGEX.get_or_init(|| {
            Regex::new(r"&(?:[a-zA-Z][a-zA-Z0-9]*|#[0-9]+|#x[0-9a-fA-F]+);")
                .expect("entity pattern is valid")
        });
        regex.is_match(text)
    }
}
