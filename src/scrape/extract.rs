//! Lightweight HTML extraction: title, meta description, media-like links.
//!
//! Pattern based; pages are not parsed into a DOM. Good enough for the
//! summary the `/scrape` route returns.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Maximum links reported per page.
pub const MAX_LINKS: usize = 10;

/// Description length kept before `...` is appended.
pub const DESCRIPTION_CHARS: usize = 200;

/// Title reported when the page has neither `<title>` nor `<h1>`.
pub const NO_TITLE: &str = "No title found";

/// Substrings that mark an href as audio/video-like.
const MEDIA_MARKERS: [&str; 5] = [".mp3", ".mp4", ".m4a", "audio", "video"];

#[allow(clippy::expect_used)]
static TITLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("title regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static H1_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1\s*>").expect("h1 regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static META_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<meta\b([^>]*)>").expect("meta regex is valid") // Static pattern, safe to panic
});

/// `a`, `source` and `link` opening tags; group 1 is the tag, group 2 its attributes.
#[allow(clippy::expect_used)]
static LINK_TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(a|source|link)\b([^>]*)>").expect("link tag regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static ATTR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z][a-z0-9_:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("attribute regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<[^>]*>").expect("tag regex is valid") // Static pattern, safe to panic
});

/// `<title>` text, else the first `<h1>` text, else [`NO_TITLE`].
#[must_use]
pub fn extract_title(html: &str) -> String {
    [&*TITLE_PATTERN, &*H1_PATTERN]
        .iter()
        .filter_map(|pattern| first_text(pattern, html))
        .next()
        .unwrap_or_else(|| NO_TITLE.to_string())
}

fn first_text(pattern: &Regex, html: &str) -> Option<String> {
    let inner = pattern.captures(html)?.get(1)?.as_str();
    let text = normalize_text(inner);
    (!text.is_empty()).then_some(text)
}

/// `meta name="description"` content, cut to [`DESCRIPTION_CHARS`] plus `...`.
#[must_use]
pub fn extract_description(html: &str) -> String {
    let content = META_PATTERN
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .find_map(|attrs| {
            let attrs = attrs.as_str();
            let is_description = attribute(attrs, "name")
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("description"));
            if is_description {
                attribute(attrs, "content")
            } else {
                None
            }
        })
        .map(|content| decode_entities(&content))
        .unwrap_or_default();

    truncate_description(&content)
}

fn truncate_description(text: &str) -> String {
    if text.chars().count() > DESCRIPTION_CHARS {
        let cut: String = text.chars().take(DESCRIPTION_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

/// Up to [`MAX_LINKS`] unique absolute URLs that look like audio/video.
///
/// Candidates are `href`/`src` values of `a`, `source` and `link` tags. An
/// anchor whose text mentions "download" also counts.
#[must_use]
pub fn extract_media_links(html: &str, base: &Url) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();

    for caps in LINK_TAG_PATTERN.captures_iter(html) {
        if links.len() >= MAX_LINKS {
            break;
        }
        let (Some(tag), Some(attrs), Some(whole)) = (caps.get(1), caps.get(2), caps.get(0)) else {
            continue;
        };
        let Some(href) = attribute(attrs.as_str(), "href").or_else(|| attribute(attrs.as_str(), "src"))
        else {
            continue;
        };
        let href = decode_entities(href.trim());
        if href.is_empty() {
            continue;
        }

        let anchor_text = if tag.as_str().eq_ignore_ascii_case("a") {
            anchor_text(&html[whole.end()..])
        } else {
            String::new()
        };

        let looks_like_media = MEDIA_MARKERS.iter().any(|marker| href.contains(marker))
            || anchor_text.contains("download");
        if !looks_like_media {
            continue;
        }

        let Ok(absolute) = base.join(&href) else {
            continue;
        };
        let absolute = absolute.to_string();
        if !links.contains(&absolute) {
            links.push(absolute);
        }
    }

    links
}

/// Lowercased text up to the closing `</a>`.
fn anchor_text(rest: &str) -> String {
    let lower = rest.to_ascii_lowercase();
    let end = lower.find("</a").unwrap_or(lower.len());
    normalize_text(&lower[..end])
}

fn attribute(attrs: &str, name: &str) -> Option<String> {
    ATTR_PATTERN.captures_iter(attrs).find_map(|caps| {
        let key = caps.get(1)?.as_str();
        if !key.eq_ignore_ascii_case(name) {
            return None;
        }
        caps.get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str().to_string())
    })
}

/// Strips nested tags, decodes common entities, collapses whitespace.
fn normalize_text(fragment: &str) -> String {
    let stripped = TAG_PATTERN.replace_all(fragment, " ");
    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://media.example.com/page/index.html").unwrap()
    }

    #[test]
    fn test_extract_title_prefers_title_tag() {
        let html = "<html><head><title> Tom &amp; Jerry </title></head><h1>Other</h1></html>";
        assert_eq!(extract_title(html), "Tom & Jerry");
    }

    #[test]
    fn test_extract_title_falls_back_to_h1() {
        let html = "<title>   </title><h1 class=\"x\">Big <em>News</em></h1><h1>Second</h1>";
        assert_eq!(extract_title(html), "Big News");
    }

    #[test]
    fn test_extract_title_default() {
        assert_eq!(extract_title("<p>nothing</p>"), NO_TITLE);
    }

    #[test]
    fn test_extract_description_reads_meta() {
        let html = r#"<meta property="og:x" content="no"><meta content="Hello world" name="Description">"#;
        assert_eq!(extract_description(html), "Hello world");
    }

    #[test]
    fn test_extract_description_truncates_long_text() {
        let long = "a".repeat(250);
        let html = format!(r#"<meta name="description" content="{long}">"#);
        let description = extract_description(&html);

        assert_eq!(description.len(), DESCRIPTION_CHARS + 3);
        assert!(description.ends_with("..."));
    }

    #[test]
    fn test_extract_description_missing_is_empty() {
        assert_eq!(extract_description("<html></html>"), "");
    }

    #[test]
    fn test_extract_media_links_filters_and_resolves() {
        let html = r#"
            <a href="/files/song.mp3">Song</a>
            <a href="about.html">About</a>
            <a href="/get?id=1">Download now</a>
            <source src="clip.mp4" type="video/mp4">
            <link rel="alternate" href="https://cdn.example.com/video/stream">
            <a href="/files/song.mp3">Duplicate</a>
        "#;
        let links = extract_media_links(html, &base());

        assert_eq!(
            links,
            vec![
                "https://media.example.com/files/song.mp3",
                "https://media.example.com/get?id=1",
                "https://media.example.com/page/clip.mp4",
                "https://cdn.example.com/video/stream",
            ]
        );
    }

    #[test]
    fn test_extract_media_links_caps_at_limit() {
        let html: String = (0..25)
            .map(|i| format!("<a href=\"/track{i}.mp3\">t</a>"))
            .collect();
        assert_eq!(extract_media_links(&html, &base()).len(), MAX_LINKS);
    }

    #[test]
    fn test_extract_media_links_handles_single_quotes_and_entities() {
        let html = "<a href='/watch?v=1&amp;t=video'>x</a>";
        assert_eq!(
            extract_media_links(html, &base()),
            vec!["https://media.example.com/watch?v=1&t=video"]
        );
    }
}
