//! Pure HTML and sitemap-XML extraction.
//!
//! Side-effect-free functions over decoded response bodies. All inputs are
//! unvalidated strings and all outputs may be empty; matching is
//! case-insensitive and tolerant of single, double, or bare attribute
//! quoting (the tokenizer normalizes all three).

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::config::{MAX_IMG_TAGS, MAX_JSON_LD_BLOCKS};

static LOC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<loc[^>]*>(.*?)</loc>").expect("loc regex is valid")
});

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static META_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector("meta"));
static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector("link"));
static IMG_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static SCRIPT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector("script"));

/// One `<img>` tag's audit-relevant attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImgTag {
    /// `src` attribute, if any.
    pub src: Option<String>,
    /// `alt` attribute, if any (empty string is distinct from absent).
    pub alt: Option<String>,
    /// `loading` attribute, if any.
    pub loading: Option<String>,
}

impl ImgTag {
    /// Whether the tag carries non-empty alt text.
    pub fn has_alt(&self) -> bool {
        self.alt.as_deref().is_some_and(|a| !a.trim().is_empty())
    }

    /// Whether the src points at an AVIF/WebP asset.
    pub fn is_modern_format(&self) -> bool {
        self.src
            .as_deref()
            .map(str::to_ascii_lowercase)
            .is_some_and(|s| s.contains(".avif") || s.contains(".webp"))
    }

    /// Whether the tag requests lazy loading.
    pub fn is_lazy(&self) -> bool {
        self.loading
            .as_deref()
            .is_some_and(|l| l.eq_ignore_ascii_case("lazy"))
    }
}

/// First `<title>` text, trimmed.
pub fn title(html: &str) -> String {
    let document = Html::parse_document(html);
    title_of(&document)
}

/// First `<meta name=...>` content for the given name.
pub fn meta_by_name(html: &str, name: &str) -> Option<String> {
    let document = Html::parse_document(html);
    meta_attr(&document, "name", name)
}

/// First `<meta property=...>` content for the given property.
pub fn meta_by_property(html: &str, property: &str) -> Option<String> {
    let document = Html::parse_document(html);
    meta_attr(&document, "property", property)
}

/// All `<link rel=canonical>` hrefs in document order. Duplicates are
/// preserved so callers can detect multiple canonicals.
pub fn canonical_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    canonicals_of(&document)
}

/// First icon link href (`rel` containing "icon"), if any.
pub fn icon_href(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    icon_of(&document)
}

/// The first 40 `<img>` tags.
pub fn img_tags(html: &str) -> Vec<ImgTag> {
    let document = Html::parse_document(html);
    imgs_of(&document)
}

/// Raw bodies of the first 5 `<script type="application/ld+json">` blocks.
pub fn json_ld_blocks(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    json_ld_of(&document)
}

/// All `<loc>` values from sitemap XML, trimmed. Works for both `urlset`
/// and `sitemapindex` documents.
pub fn locs(xml: &str) -> Vec<String> {
    LOC_RE
        .captures_iter(xml)
        .map(|cap| cap[1].trim().to_string())
        .filter(|loc| !loc.is_empty())
        .collect()
}

fn title_of(document: &Html) -> String {
    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn meta_attr(document: &Html, key: &str, wanted: &str) -> Option<String> {
    document.select(&META_SELECTOR).find_map(|el| {
        let matches = el
            .value()
            .attr(key)
            .is_some_and(|v| v.eq_ignore_ascii_case(wanted));
        if matches {
            el.value().attr("content").map(str::to_string)
        } else {
            None
        }
    })
}

fn canonicals_of(document: &Html) -> Vec<String> {
    document
        .select(&LINK_SELECTOR)
        .filter(|el| {
            el.value()
                .attr("rel")
                .is_some_and(|rel| rel.eq_ignore_ascii_case("canonical"))
        })
        .filter_map(|el| el.value().attr("href").map(str::to_string))
        .collect()
}

fn icon_of(document: &Html) -> Option<String> {
    document.select(&LINK_SELECTOR).find_map(|el| {
        let rel = el.value().attr("rel")?;
        if rel.to_ascii_lowercase().contains("icon") {
            el.value().attr("href").map(str::to_string)
        } else {
            None
        }
    })
}

fn imgs_of(document: &Html) -> Vec<ImgTag> {
    document
        .select(&IMG_SELECTOR)
        .take(MAX_IMG_TAGS)
        .map(|el| ImgTag {
            src: el.value().attr("src").map(str::to_string),
            alt: el.value().attr("alt").map(str::to_string),
            loading: el.value().attr("loading").map(str::to_string),
        })
        .collect()
}

fn json_ld_of(document: &Html) -> Vec<String> {
    document
        .select(&SCRIPT_SELECTOR)
        .filter(|el| {
            el.value()
                .attr("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("application/ld+json"))
        })
        .take(MAX_JSON_LD_BLOCKS)
        .map(|el| el.inner_html())
        .collect()
}

/// Everything the orchestrator needs from one page, extracted in a single
/// parse. The parsed DOM is dropped before the first await so audit futures
/// stay `Send`.
#[derive(Debug, Clone, Default)]
pub struct PageExtract {
    /// `<title>` text, trimmed.
    pub title: String,
    /// `meta[name=description]` content.
    pub meta_description: Option<String>,
    /// `meta[name=viewport]` presence.
    pub has_viewport: bool,
    /// Robots meta triad: `(source, content)` for robots, googlebot, bingbot.
    pub robots_meta: Vec<(&'static str, String)>,
    /// All canonical hrefs in order.
    pub canonicals: Vec<String>,
    /// `og:title` content.
    pub og_title: Option<String>,
    /// `og:image` content.
    pub og_image: Option<String>,
    /// First icon link href.
    pub icon_href: Option<String>,
    /// First 40 image tags.
    pub imgs: Vec<ImgTag>,
}

impl PageExtract {
    /// Parses the document once and pulls every field.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let robots_meta = [
            ("meta[robots]", "robots"),
            ("meta[googlebot]", "googlebot"),
            ("meta[bingbot]", "bingbot"),
        ]
        .into_iter()
        .filter_map(|(source, name)| meta_attr(&document, "name", name).map(|c| (source, c)))
        .collect();

        Self {
            title: title_of(&document),
            meta_description: meta_attr(&document, "name", "description"),
            has_viewport: meta_attr(&document, "name", "viewport").is_some(),
            robots_meta,
            canonicals: canonicals_of(&document),
            og_title: meta_attr(&document, "property", "og:title"),
            og_image: meta_attr(&document, "property", "og:image"),
            icon_href: icon_of(&document),
            imgs: imgs_of(&document),
        }
    }
}
