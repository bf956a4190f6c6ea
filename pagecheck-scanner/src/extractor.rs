use crate::fact::{Fact, Heading, Hreflang, ImageFact, OpenGraph, TwitterCard};
use scraper::{Html, Selector};
use tracing::debug;

/// Extracts a [`Fact`] from a parsed document.
///
/// Every field is pulled independently through CSS selectors; a missing or
/// malformed piece of one field never disturbs the others. The only partial
/// failure that exists at all is an unparseable JSON-LD block, which is
/// counted rather than propagated.
pub struct FactExtractor;

impl FactExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, tree: &Html) -> Fact {
        let (schema_blocks, invalid_schema_blocks) = Self::extract_schema_blocks(tree);

        Fact {
            title: Self::extract_title(tree),
            title_count: Self::count(tree, "title"),
            description: Self::meta_named(tree, "description"),
            keywords: Self::extract_keywords(tree),
            canonical: Self::attr_of(tree, r#"link[rel="canonical"]"#, "href"),
            headings: Self::extract_headings(tree),
            open_graph: Self::extract_open_graph(tree),
            twitter: TwitterCard {
                card: Self::meta_named(tree, "twitter:card"),
                image: Self::meta_named(tree, "twitter:image"),
            },
            hreflangs: Self::extract_hreflangs(tree),
            schema_blocks,
            invalid_schema_blocks,
            images: Self::extract_images(tree),
        }
    }

    /// First `<title>` wins; an empty or whitespace-only title counts as
    /// missing. Extra titles are reported through `title_count`.
    fn extract_title(tree: &Html) -> Option<String> {
        let selector = Selector::parse("title").unwrap();
        tree.select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    }

    fn count(tree: &Html, selector: &str) -> usize {
        let selector = Selector::parse(selector).unwrap();
        tree.select(&selector).count()
    }

    fn meta_named(tree: &Html, name: &str) -> Option<String> {
        Self::attr_of(tree, &format!(r#"meta[name="{}"]"#, name), "content")
    }

    fn attr_of(tree: &Html, selector: &str, attr: &str) -> Option<String> {
        let selector = Selector::parse(selector).unwrap();
        tree.select(&selector)
            .next()
            .and_then(|el| el.value().attr(attr))
            .map(|v| v.to_string())
    }

    /// Comma-separated keywords meta content, trimmed, empties dropped.
    fn extract_keywords(tree: &Html) -> Vec<String> {
        Self::meta_named(tree, "keywords")
            .map(|content| {
                content
                    .split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn extract_headings(tree: &Html) -> Vec<Heading> {
        let selector = Selector::parse("h1").unwrap();
        tree.select(&selector)
            .map(|el| Heading {
                level: 1,
                text: el.text().collect::<String>().trim().to_string(),
            })
            .collect()
    }

    fn extract_open_graph(tree: &Html) -> OpenGraph {
        let property = |prop: &str| -> Option<String> {
            Self::attr_of(tree, &format!(r#"meta[property="{}"]"#, prop), "content")
        };

        OpenGraph {
            title: property("og:title"),
            description: property("og:description"),
            image: property("og:image"),
            url: property("og:url"),
            og_type: property("og:type"),
            locale: property("og:locale"),
        }
    }

    /// `(lang, href)` pairs in document order. Downstream consumers rely on
    /// first-to-last order matching the markup.
    fn extract_hreflangs(tree: &Html) -> Vec<Hreflang> {
        let selector = Selector::parse(r#"link[rel="alternate"][hreflang]"#).unwrap();
        tree.select(&selector)
            .filter_map(|el| {
                let lang = el.value().attr("hreflang")?;
                let href = el.value().attr("href")?;
                Some(Hreflang {
                    lang: lang.to_string(),
                    href: href.to_string(),
                })
            })
            .collect()
    }

    /// Parse each JSON-LD block on its own. A broken block is counted and
    /// skipped so the rest of the document still extracts.
    fn extract_schema_blocks(tree: &Html) -> (Vec<serde_json::Value>, usize) {
        let selector = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();
        let mut blocks = Vec::new();
        let mut invalid = 0;

        for el in tree.select(&selector) {
            let text = el.text().collect::<String>();
            match serde_json::from_str::<serde_json::Value>(text.trim()) {
                Ok(value) => blocks.push(value),
                Err(e) => {
                    debug!("Skipping unparseable JSON-LD block: {}", e);
                    invalid += 1;
                }
            }
        }

        (blocks, invalid)
    }

    fn extract_images(tree: &Html) -> Vec<ImageFact> {
        let selector = Selector::parse("img").unwrap();
        tree.select(&selector)
            .map(|el| ImageFact {
                has_alt: el
                    .value()
                    .attr("alt")
                    .map(|alt| !alt.trim().is_empty())
                    .unwrap_or(false),
            })
            .collect()
    }
}

impl Default for FactExtractor {
    fn default() -> Self {
        Self::new()
    }
}
