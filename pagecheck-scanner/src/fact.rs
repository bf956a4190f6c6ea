use serde::{Deserialize, Serialize};

/// The extracted, typed snapshot of one document's SEO-relevant attributes.
///
/// A Fact is a pure function of the document tree: extracting twice from the
/// same content yields structurally equal Facts. Every field tolerates
/// absence; extraction never fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub title: Option<String>,
    pub title_count: usize,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub canonical: Option<String>,
    pub headings: Vec<Heading>,
    pub open_graph: OpenGraph,
    pub twitter: TwitterCard,
    pub hreflangs: Vec<Hreflang>,
    pub schema_blocks: Vec<serde_json::Value>,
    pub invalid_schema_blocks: usize,
    pub images: Vec<ImageFact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenGraph {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub og_type: Option<String>,
    pub locale: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TwitterCard {
    pub card: Option<String>,
    pub image: Option<String>,
}

/// One `<link rel="alternate" hreflang=...>` pair, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hreflang {
    pub lang: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFact {
    pub has_alt: bool,
}

impl Fact {
    pub fn h1_count(&self) -> usize {
        self.headings.iter().filter(|h| h.level == 1).count()
    }

    /// At least one JSON-LD block parsed successfully.
    pub fn has_valid_schema(&self) -> bool {
        !self.schema_blocks.is_empty()
    }

    pub fn images_missing_alt(&self) -> usize {
        self.images.iter().filter(|i| !i.has_alt).count()
    }
}
