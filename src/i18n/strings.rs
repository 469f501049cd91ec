use crate::i18n::Language;

/// Attribute names of the catalog fields, in declaration order.
///
/// These are the values a page may put in `data-i18n-key`.
pub const FIELD_NAMES: [&str; 6] = [
    "title",
    "headline",
    "subtitle",
    "disclaimer",
    "tutorial",
    "copyright",
];

/// All localized text fragments of the site for one locale
///
/// Strings are plain text. They are escaped by whichever rewrite rule
/// inserts them into a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageStrings {
    /// Document `<title>`
    pub title: &'static str,

    /// Main page heading
    pub headline: &'static str,

    /// Tagline under the heading; also used as the meta description
    pub subtitle: &'static str,

    pub disclaimer: &'static str,

    pub tutorial: &'static str,

    /// Footer credit line
    pub copyright: &'static str,
}

impl LanguageStrings {
    /// Catalog entry for a locale.
    pub fn for_language(language: Language) -> &'static LanguageStrings {
        Self::for_code(language.code())
    }

    /// Catalog entry for a raw locale code.
    ///
    /// Unknown codes get [`EMPTY_STRINGS`] rather than an error; every
    /// consumer treats an empty field as missing.
    pub fn for_code(code: &str) -> &'static LanguageStrings {
        match code {
            "en" => &ENGLISH_STRINGS,
            "de" => &GERMAN_STRINGS,
            "ja" => &JAPANESE_STRINGS,
            _ => &EMPTY_STRINGS,
        }
    }

    /// Look a field up by its attribute name.
    ///
    /// Returns `None` for names that are not catalog fields.
    pub fn get(&self, key: &str) -> Option<&'static str> {
        match key {
            "title" => Some(self.title),
            "headline" => Some(self.headline),
            "subtitle" => Some(self.subtitle),
            "disclaimer" => Some(self.disclaimer),
            "tutorial" => Some(self.tutorial),
            "copyright" => Some(self.copyright),
            _ => None,
        }
    }

    /// Look a field up, treating empty values as missing.
    pub fn translation(&self, key: &str) -> Option<&'static str> {
        self.get(key).filter(|value| !value.is_empty())
    }

    /// All `(name, value)` pairs in [`FIELD_NAMES`] order.
    pub fn fields(&self) -> [(&'static str, &'static str); 6] {
        [
            ("title", self.title),
            ("headline", self.headline),
            ("subtitle", self.subtitle),
            ("disclaimer", self.disclaimer),
            ("tutorial", self.tutorial),
            ("copyright", self.copyright),
        ]
    }
}

// ==================== English Strings ====================

/// English strings (default locale)
pub const ENGLISH_STRINGS: LanguageStrings = LanguageStrings {
    title: "Sample Site",
    headline: "Sample Site",
    subtitle: "This is my sample site. Depending on where in the world you are visiting this site, \
this text will be translated into the corresponding language.",
    disclaimer: "Disclaimer: The initial translations are from Google Translate, \
so they may not be perfect!",
    tutorial: "Find the tutorial for this project in the Cloudflare Workers documentation.",
    copyright: "Design by HTML5 UP.",
};

// ==================== German Strings ====================

pub const GERMAN_STRINGS: LanguageStrings = LanguageStrings {
    title: "Beispielseite",
    headline: "Beispielseite",
    subtitle: "Dies ist meine Beispielseite. Abhängig davon, wo auf der Welt Sie diese Site besuchen, \
wird dieser Text in die entsprechende Sprache übersetzt.",
    disclaimer: "Haftungsausschluss: Die anfänglichen Übersetzungen stammen von Google Translate, \
daher sind sie möglicherweise nicht perfekt!",
    tutorial: "Das Tutorial für dieses Projekt finden Sie in der Cloudflare Workers-Dokumentation.",
    copyright: "Design von HTML5 UP.",
};

// ==================== Japanese Strings ====================

pub const JAPANESE_STRINGS: LanguageStrings = LanguageStrings {
    title: "サンプルサイト",
    headline: "サンプルサイト",
    subtitle: "これは私の例のサイトです。 このサイトにアクセスする世界の場所に応じて、\
このテキストは対応する言語に翻訳されます。",
    disclaimer: "免責事項：最初の翻訳はGoogle翻訳からのものですので、完璧ではないかもしれません！",
    tutorial: "Cloudflare Workersのドキュメントでこのプロジェクトのチュートリアルを見つけてください。",
    copyright: "HTML5 UPによるデザイン。",
};

/// Entry handed out for codes with no catalog entry
pub const EMPTY_STRINGS: LanguageStrings = LanguageStrings {
    title: "",
    headline: "",
    subtitle: "",
    disclaimer: "",
    tutorial: "",
    copyright: "",
};
