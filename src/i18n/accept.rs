//! `Accept-Language` parsing.
//!
//! Turns a header such as `de-DE,de;q=0.9,en;q=0.8` into a list of
//! [`LanguageRange`]s ordered by preference.

use std::cmp::Ordering;

/// One entry of an `Accept-Language` header.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageRange {
    /// Primary language subtag, or `*`
    pub language: String,
    pub script: Option<String>,
    pub region: Option<String>,
    /// Weight from `q=`; 1.0 when absent or unparseable
    pub quality: f32,
}

impl LanguageRange {
    /// Parse a single tag (without the `;q=` part).
    ///
    /// Accepts `*` or one to three alphanumeric subtags joined by `-`,
    /// the first of which must be alphabetic. Two subtags are read as
    /// language-region, three as language-script-region.
    pub fn parse_tag(tag: &str, quality: f32) -> Option<LanguageRange> {
        let tag = tag.trim();
        if tag == "*" {
            return Some(LanguageRange {
                language: "*".to_string(),
                script: None,
                region: None,
                quality,
            });
        }

        let subtags: Vec<&str> = tag.split('-').collect();
        if subtags.is_empty() || subtags.len() > 3 {
            return None;
        }
        if subtags
            .iter()
            .any(|s| s.is_empty() || !s.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            return None;
        }
        if !subtags[0].chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        let (script, region) = match subtags.as_slice() {
            [_] => (None, None),
            [_, region] => (None, Some(region.to_string())),
            [_, script, region] => (Some(script.to_string()), Some(region.to_string())),
            _ => return None,
        };

        Some(LanguageRange {
            language: subtags[0].to_string(),
            script,
            region,
            quality,
        })
    }

    /// Strict match against a supported locale code.
    ///
    /// The primary subtags must be equal (ignoring case), and any script or
    /// region this range names must also be present on the supported code.
    /// `de-DE` does not match `de`; `de` matches `de`.
    pub fn matches(&self, supported: &str) -> bool {
        let Some(supported) = LanguageRange::parse_tag(supported, 1.0) else {
            return false;
        };

        self.language.eq_ignore_ascii_case(&supported.language)
            && subtag_matches(&self.script, &supported.script)
            && subtag_matches(&self.region, &supported.region)
    }
}

fn subtag_matches(wanted: &Option<String>, offered: &Option<String>) -> bool {
    match (wanted, offered) {
        (None, _) => true,
        (Some(w), Some(o)) => w.eq_ignore_ascii_case(o),
        (Some(_), None) => false,
    }
}

/// Parse a full header into ranges, most preferred first.
///
/// Entries that do not parse are skipped, entries with `q=0` are dropped as
/// "not acceptable", and entries of equal weight keep their header order.
pub fn parse_accept_language(header: &str) -> Vec<LanguageRange> {
    let mut ranges: Vec<LanguageRange> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim();
            if tag.is_empty() {
                return None;
            }
            let quality = parts
                .filter_map(|param| param.trim().strip_prefix("q="))
                .filter_map(|q| q.trim().parse::<f32>().ok())
                .find(|q| q.is_finite())
                .unwrap_or(1.0);
            LanguageRange::parse_tag(tag, quality)
        })
        .filter(|range| range.quality > 0.0)
        .collect();

    // `sort_by` is stable, so equal weights keep their header order
    ranges.sort_by(|a, b| b.quality.partial_cmp(&a.quality).unwrap_or(Ordering::Equal));
    ranges
}
