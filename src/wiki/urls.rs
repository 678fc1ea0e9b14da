//! URL construction and parsing for Wikipedia pages
//!
//! Panels always show the mobile site (`{lang}.m.wikipedia.org`); API calls
//! go to the desktop host.

use url::Url;

/// Wikidata action API endpoint
pub const WIKIDATA_API: &str = "https://www.wikidata.org/w/api.php";

/// Host suffix of pages the reader handles itself
pub const CONTENT_DOMAIN: &str = "wikipedia.org";

/// Landing page of a language edition
pub fn base_url(lang: &str) -> String {
    format!("https://{}.m.wikipedia.org", lang)
}

/// Canonical page URL shown in a panel.
///
/// `build_page_url("fr", "Tour Eiffel") == "https://fr.m.wikipedia.org/wiki/Tour_Eiffel"`
pub fn build_page_url(lang: &str, title: &str) -> String {
    format!("{}/wiki/{}", base_url(lang), title.replace(' ', "_"))
}

/// Action API endpoint of a language edition
pub fn api_url(lang: &str) -> String {
    format!("https://{}.wikipedia.org/w/api.php", lang)
}

/// 100px Commons thumbnail for an image file name from a `P18` claim
pub fn thumbnail_url(file_name: &str) -> String {
    format!(
        "https://commons.wikimedia.org/w/thumb.php?f={}&w=100",
        file_name.replace(' ', "_")
    )
}

/// Whether a URL points into a Wikipedia edition
pub fn is_content_url(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| host == CONTENT_DOMAIN || host.ends_with(".wikipedia.org"))
}

/// Language edition of a Wikipedia URL (`fr.m.wikipedia.org` → `fr`)
pub fn language_of(url: &Url) -> Option<&str> {
    let host = url.host_str()?;
    if !is_content_url(url) || host == CONTENT_DOMAIN {
        return None;
    }
    host.split('.').next().filter(|lang| *lang != "www" && *lang != "m")
}

/// Article title addressed by a Wikipedia URL.
///
/// Handles `/wiki/Title` (percent-decoded, may contain slashes) and
/// `/w/index.php?title=Title`; underscores become spaces.
pub fn article_title_from_url(url: &Url) -> Option<String> {
    let path = url.path();
    let title = if let Some(rest) = path.strip_prefix("/wiki/") {
        urlencoding::decode(rest).ok()?.into_owned()
    } else if path.starts_with("/w/index.php") {
        url.query_pairs()
            .find(|(key, _)| key == "title")
            .map(|(_, value)| value.into_owned())?
    } else {
        return None;
    };

    let title = title.replace('_', " ");
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}
