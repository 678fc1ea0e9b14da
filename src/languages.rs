//! Language configuration
//!
//! The supported language table, the user-configurable [`LanguageSet`] and
//! the ordering collaborator used by the random-topic sampler.

use std::collections::HashSet;

use crate::error::LanguageError;

/// A Wikipedia edition the reader can display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedLanguage {
    pub code: &'static str,
    pub name: &'static str,
    /// Approximate article count, only used for ordering
    pub article_count: u32,
}

const fn language(
    code: &'static str,
    name: &'static str,
    article_count: u32,
) -> SupportedLanguage {
    SupportedLanguage {
        code,
        name,
        article_count,
    }
}

/// Editions offered in the language settings, largest first
pub const SUPPORTED_LANGUAGES: &[SupportedLanguage] = &[
    language("en", "English", 6_900_000),
    language("de", "German", 2_950_000),
    language("fr", "French", 2_650_000),
    language("sv", "Swedish", 2_600_000),
    language("nl", "Dutch", 2_150_000),
    language("ru", "Russian", 2_000_000),
    language("es", "Spanish", 1_990_000),
    language("it", "Italian", 1_900_000),
    language("pl", "Polish", 1_650_000),
    language("ja", "Japanese", 1_450_000),
    language("zh", "Chinese", 1_450_000),
    language("uk", "Ukrainian", 1_350_000),
    language("vi", "Vietnamese", 1_290_000),
    language("ar", "Arabic", 1_250_000),
    language("pt", "Portuguese", 1_140_000),
    language("fa", "Persian", 1_030_000),
    language("ca", "Catalan", 780_000),
    language("id", "Indonesian", 720_000),
    language("ko", "Korean", 700_000),
    language("he", "Hebrew", 370_000),
    language("hi", "Hindi", 165_000),
];

pub const DEFAULT_DISPLAY_LANGUAGES: &[&str] = &["en", "fr", "ja"];
pub const DEFAULT_SEARCH_PRIORITY: &[&str] = &["en", "fr", "ja"];

pub fn supported(code: &str) -> Option<&'static SupportedLanguage> {
    SUPPORTED_LANGUAGES.iter().find(|l| l.code == code)
}

/// English display name, falling back to the upper-cased code
pub fn display_name(code: &str) -> String {
    supported(code)
        .map(|l| l.name.to_string())
        .unwrap_or_else(|| code.to_uppercase())
}

/// Ordered display languages plus ordered search-priority languages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSet {
    display: Vec<String>,
    search_priority: Vec<String>,
}

impl LanguageSet {
    /// Validate and build a language set.
    ///
    /// Display languages must be non-empty, unique and supported. Search
    /// priority languages must be unique and supported; an empty list falls
    /// back to the display order.
    pub fn new<D, S>(display: D, search_priority: S) -> Result<Self, LanguageError>
    where
        D: IntoIterator,
        D::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        let display = validate(display.into_iter().map(Into::into).collect())?;
        if display.is_empty() {
            return Err(LanguageError::Empty);
        }
        let mut search_priority = validate(search_priority.into_iter().map(Into::into).collect())?;
        if search_priority.is_empty() {
            search_priority = display.clone();
        }
        Ok(Self {
            display,
            search_priority,
        })
    }

    pub fn display(&self) -> &[String] {
        &self.display
    }

    pub fn search_priority(&self) -> &[String] {
        &self.search_priority
    }

    pub fn len(&self) -> usize {
        self.display.len()
    }

    pub fn is_empty(&self) -> bool {
        self.display.is_empty()
    }

    pub fn position(&self, lang: &str) -> Option<usize> {
        self.display.iter().position(|l| l == lang)
    }
}

impl Default for LanguageSet {
    fn default() -> Self {
        Self {
            display: DEFAULT_DISPLAY_LANGUAGES.iter().map(|s| s.to_string()).collect(),
            search_priority: DEFAULT_SEARCH_PRIORITY.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn validate(codes: Vec<String>) -> Result<Vec<String>, LanguageError> {
    let mut seen = HashSet::new();
    for code in &codes {
        if supported(code).is_none() {
            return Err(LanguageError::Unsupported { code: code.clone() });
        }
        if !seen.insert(code.as_str()) {
            return Err(LanguageError::Duplicate { code: code.clone() });
        }
    }
    Ok(codes)
}

// =============================================================================
// Ordering for the random sampler
// =============================================================================

/// Decides which language the random sampler draws from first
pub trait LanguageRanking: Send + Sync {
    fn order(&self, languages: &[String]) -> Vec<String>;
}

/// Largest editions first; unknown codes go last, keeping their order
#[derive(Debug, Clone, Copy, Default)]
pub struct ArticleCountRanking;

impl LanguageRanking for ArticleCountRanking {
    fn order(&self, languages: &[String]) -> Vec<String> {
        let mut ordered = languages.to_vec();
        ordered.sort_by_key(|code| {
            std::cmp::Reverse(supported(code).map(|l| l.article_count).unwrap_or(0))
        });
        ordered
    }
}

/// Keeps the configured display order
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayOrderRanking;

impl LanguageRanking for DisplayOrderRanking {
    fn order(&self, languages: &[String]) -> Vec<String> {
        languages.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_language_set() {
        let set = LanguageSet::default();
        assert_eq!(set.display(), &["en", "fr", "ja"]);
        assert_eq!(set.search_priority(), &["en", "fr", "ja"]);
        assert_eq!(set.position("ja"), Some(2));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_language_set_validation() {
        assert_eq!(
            LanguageSet::new(["en", "xx"], ["en"]),
            Err(LanguageError::Unsupported {
                code: "xx".to_string()
            })
        );
        assert_eq!(
            LanguageSet::new(["en", "en"], ["en"]),
            Err(LanguageError::Duplicate {
                code: "en".to_string()
            })
        );
        assert_eq!(
            LanguageSet::new(Vec::<String>::new(), ["en"]),
            Err(LanguageError::Empty)
        );
    }

    #[test]
    fn test_empty_search_priority_uses_display_order() {
        let set = LanguageSet::new(["de", "ko"], Vec::<String>::new()).unwrap();
        assert_eq!(set.search_priority(), &["de", "ko"]);
    }

    #[test]
    fn test_article_count_ranking() {
        let langs: Vec<String> = ["ja", "en", "fr"].iter().map(|s| s.to_string()).collect();
        assert_eq!(ArticleCountRanking.order(&langs), vec!["en", "fr", "ja"]);
        assert_eq!(DisplayOrderRanking.order(&langs), vec!["ja", "en", "fr"]);
    }

    #[test]
    fn test_supported_table_is_unique_and_largest_first() {
        let mut seen = HashSet::new();
        assert!(SUPPORTED_LANGUAGES.iter().all(|l| seen.insert(l.code)));
        assert!(SUPPORTED_LANGUAGES
            .windows(2)
            .all(|pair| pair[0].article_count >= pair[1].article_count));
        assert_eq!(supported("ja").map(|l| l.name), Some("Japanese"));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("ja"), "Japanese");
        assert_eq!(display_name("tlh"), "TLH");
    }
}
