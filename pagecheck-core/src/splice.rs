// Byte-splice backend for the Transformer's edits.
//
// Extraction and "already satisfied" checks always go through the parsed
// DOM; only the final write-back works on the raw document text, locating
// tags with a quote-aware scanner so attribute values containing '>' never
// confuse the splice.

const VOID_TAGS: &[&str] = &["meta", "link", "img", "br", "input", "hr"];

/// The subset of CSS selector syntax the planner emits:
/// `tag` or `tag[attr="value"]`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TagSelector {
    pub tag: String,
    pub attr: Option<(String, String)>,
}

impl TagSelector {
    pub fn parse(selector: &str) -> Option<Self> {
        let selector = selector.trim();
        match selector.find('[') {
            None => Some(Self {
                tag: selector.to_ascii_lowercase(),
                attr: None,
            }),
            Some(open) => {
                let tag = selector[..open].to_ascii_lowercase();
                let inner = selector[open + 1..].strip_suffix(']')?;
                let eq = inner.find('=')?;
                let name = inner[..eq].trim().to_ascii_lowercase();
                let value = inner[eq + 1..].trim().trim_matches(['"', '\'']).to_string();
                Some(Self {
                    tag,
                    attr: Some((name, value)),
                })
            }
        }
    }
}

#[derive(Debug)]
struct Attr {
    name: String,
    value: Option<String>,
    /// Absolute byte range of the value content (inside quotes), when present.
    value_span: Option<(usize, usize)>,
}

#[derive(Debug)]
struct OpenTag {
    start: usize,
    /// One past the closing '>'.
    end: usize,
    attrs: Vec<Attr>,
}

impl OpenTag {
    fn matches(&self, selector: &TagSelector) -> bool {
        match &selector.attr {
            None => true,
            Some((name, value)) => self
                .attrs
                .iter()
                .any(|a| a.name == *name && a.value.as_deref() == Some(value.as_str())),
        }
    }

    fn attr(&self, name: &str) -> Option<&Attr> {
        self.attrs.iter().find(|a| a.name == name)
    }
}

/// All opening tags named `tag` (ASCII case-insensitive), in document order.
fn find_open_tags(html: &str, tag: &str) -> Vec<OpenTag> {
    let lower = html.to_ascii_lowercase();
    let needle = format!("<{}", tag);
    let bytes = html.as_bytes();
    let mut tags = Vec::new();
    let mut from = 0;

    while let Some(rel) = lower[from..].find(&needle) {
        let start = from + rel;
        let after_name = start + needle.len();

        // Require a real tag boundary: `<header>` must not match `head`.
        let boundary = bytes
            .get(after_name)
            .map(|b| b.is_ascii_whitespace() || *b == b'>' || *b == b'/')
            .unwrap_or(false);
        if !boundary {
            from = after_name;
            continue;
        }

        if let Some(end) = scan_tag_end(bytes, after_name) {
            let attrs = parse_attrs(html, after_name, end - 1);
            tags.push(OpenTag { start, end, attrs });
            from = end;
        } else {
            break;
        }
    }

    tags
}

/// Position one past the '>' that closes the open tag, skipping quoted
/// attribute values.
fn scan_tag_end(bytes: &[u8], mut i: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return Some(i + 1),
                _ => {}
            },
        }
        i += 1;
    }
    None
}

/// Attributes of the region between the tag name and the closing '>'.
/// Spans are absolute into the full document.
fn parse_attrs(html: &str, from: usize, to: usize) -> Vec<Attr> {
    let bytes = html.as_bytes();
    let mut attrs = Vec::new();
    let mut i = from;

    while i < to {
        while i < to && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        if i >= to {
            break;
        }

        let name_start = i;
        while i < to && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' && bytes[i] != b'/' {
            i += 1;
        }
        let name = html[name_start..i].to_ascii_lowercase();

        while i < to && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        if i < to && bytes[i] == b'=' {
            i += 1;
            while i < to && bytes[i].is_ascii_whitespace() {
                i += 1;
            }

            if i < to && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let q = bytes[i];
                let value_start = i + 1;
                let mut j = value_start;
                while j < to && bytes[j] != q {
                    j += 1;
                }
                attrs.push(Attr {
                    name,
                    value: Some(html[value_start..j].to_string()),
                    value_span: Some((value_start, j)),
                });
                i = (j + 1).min(to);
            } else {
                let value_start = i;
                while i < to && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                let mut value_end = i;
                // A bare value running to the end of the region would
                // otherwise swallow the self-closing slash.
                if value_end == to && value_end > value_start && bytes[value_end - 1] == b'/' {
                    value_end -= 1;
                }
                attrs.push(Attr {
                    name,
                    value: Some(html[value_start..value_end].to_string()),
                    value_span: Some((value_start, value_end)),
                });
            }
        } else {
            attrs.push(Attr {
                name,
                value: None,
                value_span: None,
            });
        }
    }

    attrs
}

pub(crate) fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Insert pre-rendered tags directly after the `<head>` open tag (falling
/// back to `<html>` when a document carries no literal head tag).
pub(crate) fn insert_after_head(html: &str, tags: &[String]) -> Option<String> {
    let insert_at = find_open_tags(html, "head")
        .first()
        .map(|t| t.end)
        .or_else(|| find_open_tags(html, "html").first().map(|t| t.end))?;

    let mut block = String::new();
    for tag in tags {
        block.push_str("\n  ");
        block.push_str(tag);
    }

    let mut out = String::with_capacity(html.len() + block.len());
    out.push_str(&html[..insert_at]);
    out.push_str(&block);
    out.push_str(&html[insert_at..]);
    Some(out)
}

/// Replace (or add) one attribute on the first element matching `selector`.
pub(crate) fn replace_attr(
    html: &str,
    selector: &TagSelector,
    attr: &str,
    value: &str,
) -> Option<String> {
    let tags = find_open_tags(html, &selector.tag);
    let tag = tags.iter().find(|t| t.matches(selector))?;
    let attr_name = attr.to_ascii_lowercase();
    let escaped = escape_attr(value);

    match tag.attr(&attr_name).and_then(|a| a.value_span) {
        Some((start, end)) => {
            let mut out = String::with_capacity(html.len() + escaped.len());
            out.push_str(&html[..start]);
            out.push_str(&escaped);
            out.push_str(&html[end..]);
            Some(out)
        }
        None => {
            // Attribute missing (or valueless): add it before the tag close.
            let bytes = html.as_bytes();
            let mut at = tag.end - 1;
            if at > tag.start && bytes[at - 1] == b'/' {
                at -= 1;
            }
            let insertion = format!(r#" {}="{}""#, attr_name, escaped);
            let mut out = String::with_capacity(html.len() + insertion.len());
            out.push_str(&html[..at]);
            out.push_str(&insertion);
            out.push_str(&html[at..]);
            Some(out)
        }
    }
}

/// Remove every block matching `selector`. Void elements lose just the tag;
/// container elements are removed through their closing tag. Returns the new
/// text and how many blocks went away.
pub(crate) fn remove_blocks(html: &str, selector: &TagSelector) -> (String, usize) {
    let lower = html.to_ascii_lowercase();
    let close_needle = format!("</{}", selector.tag);
    let is_void = VOID_TAGS.contains(&selector.tag.as_str());

    let mut spans: Vec<(usize, usize)> = Vec::new();
    for tag in find_open_tags(html, &selector.tag) {
        if !tag.matches(selector) {
            continue;
        }

        let end = if is_void {
            tag.end
        } else {
            match lower[tag.end..].find(&close_needle) {
                Some(rel) => {
                    let close_start = tag.end + rel;
                    match lower[close_start..].find('>') {
                        Some(gt) => close_start + gt + 1,
                        None => tag.end,
                    }
                }
                None => tag.end,
            }
        };

        spans.push(expand_to_line(html, tag.start, end));
    }

    let removed = spans.len();
    let mut out = html.to_string();
    for (start, end) in spans.into_iter().rev() {
        out.replace_range(start..end, "");
    }
    (out, removed)
}

/// Widen a removal span to eat the whole line when the block sits alone on
/// it, so removals do not leave blank indented lines behind.
fn expand_to_line(html: &str, start: usize, end: usize) -> (usize, usize) {
    let bytes = html.as_bytes();

    let line_start = html[..start].rfind('\n').map(|p| p + 1).unwrap_or(0);
    let only_indent_before = html[line_start..start]
        .bytes()
        .all(|b| b == b' ' || b == b'\t');

    let mut line_end = end;
    while line_end < bytes.len() && (bytes[line_end] == b' ' || bytes[line_end] == b'\t') {
        line_end += 1;
    }
    let newline_next = bytes.get(line_end) == Some(&b'\n');

    if only_indent_before && newline_next {
        (line_start, line_end + 1)
    } else {
        (start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_parse_plain_tag() {
        let sel = TagSelector::parse("title").unwrap();
        assert_eq!(sel.tag, "title");
        assert_eq!(sel.attr, None);
    }

    #[test]
    fn test_selector_parse_with_attribute() {
        let sel = TagSelector::parse(r#"meta[name="description"]"#).unwrap();
        assert_eq!(sel.tag, "meta");
        assert_eq!(
            sel.attr,
            Some(("name".to_string(), "description".to_string()))
        );
    }

    #[test]
    fn test_insert_after_head() {
        let html = "<html>\n<head>\n  <title>T</title>\n</head>\n</html>";
        let out = insert_after_head(html, &["<meta name=\"a\" content=\"b\">".to_string()])
            .unwrap();
        assert!(out.starts_with("<html>\n<head>\n  <meta name=\"a\" content=\"b\">"));
        assert!(out.contains("<title>T</title>"));
    }

    #[test]
    fn test_insert_after_head_with_attributes_on_head() {
        let html = r#"<head data-x="a > b"><title>T</title></head>"#;
        let out = insert_after_head(html, &["<meta name=\"k\" content=\"v\">".to_string()])
            .unwrap();
        // The '>' inside the quoted attribute must not end the head tag.
        assert!(out.contains(r#"<head data-x="a > b">"#));
        let head_end = out.find("b\">").unwrap();
        let meta_at = out.find("<meta").unwrap();
        assert!(meta_at > head_end);
        assert!(meta_at < out.find("<title>").unwrap());
    }

    #[test]
    fn test_insert_without_head_falls_back_to_html() {
        let html = "<html><body></body></html>";
        let out = insert_after_head(html, &["<title>X</title>".to_string()]).unwrap();
        assert!(out.contains("<title>X</title>"));
        assert_eq!(insert_after_head("<div></div>", &["<p>".to_string()]), None);
    }

    #[test]
    fn test_replace_attr_value() {
        let html = r#"<head><meta name="description" content="old text"></head>"#;
        let sel = TagSelector::parse(r#"meta[name="description"]"#).unwrap();
        let out = replace_attr(html, &sel, "content", "new text").unwrap();
        assert!(out.contains(r#"content="new text""#));
        assert!(!out.contains("old text"));
    }

    #[test]
    fn test_replace_attr_only_touches_matching_tag() {
        let html = concat!(
            r#"<meta name="keywords" content="kw">"#,
            r#"<meta name="description" content="desc">"#,
        );
        let sel = TagSelector::parse(r#"meta[name="description"]"#).unwrap();
        let out = replace_attr(html, &sel, "content", "updated").unwrap();
        assert!(out.contains(r#"content="kw""#));
        assert!(out.contains(r#"content="updated""#));
    }

    #[test]
    fn test_replace_attr_escapes_value() {
        let html = r#"<meta name="description" content="x">"#;
        let sel = TagSelector::parse(r#"meta[name="description"]"#).unwrap();
        let out = replace_attr(html, &sel, "content", r#"say "hi" & <go>"#).unwrap();
        assert!(out.contains("&quot;hi&quot; &amp; &lt;go&gt;"));
    }

    #[test]
    fn test_replace_attr_adds_missing_attribute() {
        let html = r#"<meta name="description">"#;
        let sel = TagSelector::parse(r#"meta[name="description"]"#).unwrap();
        let out = replace_attr(html, &sel, "content", "added").unwrap();
        assert_eq!(out, r#"<meta name="description" content="added">"#);
    }

    #[test]
    fn test_replace_attr_single_quoted_value() {
        let html = "<meta name='description' content='old'>";
        let sel = TagSelector::parse(r#"meta[name="description"]"#).unwrap();
        let out = replace_attr(html, &sel, "content", "new").unwrap();
        assert!(out.contains("content='new'"));
    }

    #[test]
    fn test_remove_container_block() {
        let html = "<head>\n  <script type=\"application/ld+json\">{bad</script>\n  <title>T</title>\n</head>";
        let sel = TagSelector::parse(r#"script[type="application/ld+json"]"#).unwrap();
        let (out, removed) = remove_blocks(html, &sel);
        assert_eq!(removed, 1);
        assert!(!out.contains("script"));
        assert!(out.contains("<title>T</title>"));
        // The line the block lived on is gone entirely.
        assert!(!out.contains("\n  \n"));
    }

    #[test]
    fn test_remove_void_block() {
        let html = r#"<head><meta name="robots" content="noindex"><title>T</title></head>"#;
        let sel = TagSelector::parse(r#"meta[name="robots"]"#).unwrap();
        let (out, removed) = remove_blocks(html, &sel);
        assert_eq!(removed, 1);
        assert!(!out.contains("robots"));
        assert!(out.contains("<title>T</title>"));
    }

    #[test]
    fn test_remove_matches_nothing() {
        let html = "<head><title>T</title></head>";
        let sel = TagSelector::parse(r#"meta[name="robots"]"#).unwrap();
        let (out, removed) = remove_blocks(html, &sel);
        assert_eq!(removed, 0);
        assert_eq!(out, html);
    }

    #[test]
    fn test_header_does_not_match_head() {
        let html = "<html><header>x</header></html>";
        assert!(find_open_tags(html, "head").is_empty());
        assert_eq!(find_open_tags(html, "header").len(), 1);
    }

    #[test]
    fn test_case_insensitive_tags_and_attrs() {
        let html = r#"<HEAD><META NAME="description" CONTENT="old"></HEAD>"#;
        let sel = TagSelector::parse(r#"meta[name="description"]"#).unwrap();
        let out = replace_attr(html, &sel, "content", "new").unwrap();
        assert!(out.contains(r#"CONTENT="new""#));
    }
}
