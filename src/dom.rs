//! Tree queries over a parsed HTML document.
//!
//! Extraction strategies talk to the document only through this module:
//! find elements by tag or predicate, climb to the nearest ancestor that
//! matches, and read an element's text either flat or line by line. The
//! underlying parser is `scraper` (html5ever), which never fails on malformed
//! markup; broken fragments simply produce a smaller tree.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashMap;

/// Subtrees that never hold newsletter content.
static NOISE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "head, script, style, noscript, template, nav, footer, iframe, svg, \
         [class*='advert'], [id*='advert'], [class*='footer'], [id*='footer']",
    )
    .expect("NOISE_SELECTOR should parse")
});

/// Elements that start a new line of text when rendered.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "center", "dd", "div", "dl", "dt",
    "figcaption", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "ol", "p", "pre", "section", "table", "tbody", "td", "tfoot", "th", "thead",
    "tr", "ul",
];

/// Ancestors that delimit one newsletter item.
pub const CONTAINER_TAGS: &[&str] = &[
    "td", "th", "p", "li", "div", "section", "article", "blockquote",
];

pub fn is_block(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

/// A parsed HTML document with noise subtrees removed.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse `html` and drop script/style/nav/footer/ad subtrees.
    pub fn parse(html: &str) -> Self {
        let mut html = Html::parse_document(html);
        let noise: Vec<_> = html.select(&NOISE_SELECTOR).map(|el| el.id()).collect();
        for id in noise {
            if let Some(mut node) = html.tree.get_mut(id) {
                node.detach();
            }
        }
        Self { html }
    }

    /// Lookup from element to its pre-order index in the document, for
    /// sorting finds from different sweeps back into reading order.
    pub fn reading_order(&self) -> impl Fn(&ElementRef<'_>) -> usize + '_ {
        let order: HashMap<_, usize> = self
            .html
            .root_element()
            .descendants()
            .enumerate()
            .map(|(i, node)| (node.id(), i))
            .collect();
        move |el: &ElementRef<'_>| order.get(&el.id()).copied().unwrap_or(usize::MAX)
    }

    /// All elements with one of the given tag names, in document order.
    pub fn find_by_tag(&self, tags: &[&str]) -> Vec<ElementRef<'_>> {
        self.find_by_predicate(|el| tags.contains(&el.value().name()))
    }

    /// All elements satisfying `pred`, in document order.
    pub fn find_by_predicate<F>(&self, pred: F) -> Vec<ElementRef<'_>>
    where
        F: Fn(&ElementRef<'_>) -> bool,
    {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| pred(el))
            .collect()
    }

    /// Visible text of the whole document, one rendered line per line.
    pub fn text(&self) -> String {
        block_text(self.html.root_element())
    }
}

/// The closest proper ancestor of `el` that satisfies `pred`.
pub fn nearest_ancestor<'a, F>(el: ElementRef<'a>, pred: F) -> Option<ElementRef<'a>>
where
    F: Fn(&ElementRef<'a>) -> bool,
{
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| pred(ancestor))
}

/// The closest ancestor (or `el` itself) whose tag is one of `tags`.
pub fn nearest_ancestor_or_self<'a>(el: ElementRef<'a>, tags: &[&str]) -> Option<ElementRef<'a>> {
    if tags.contains(&el.value().name()) {
        return Some(el);
    }
    nearest_ancestor(el, |a| tags.contains(&a.value().name()))
}

/// Descendant elements of `el` with one of the given tag names.
pub fn descendants_by_tag<'a>(el: ElementRef<'a>, tags: &[&str]) -> Vec<ElementRef<'a>> {
    el.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(|d| tags.contains(&d.value().name()))
        .collect()
}

/// Attribute value, if present.
pub fn attr<'a>(el: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name)
}

/// All text under `el`, whitespace-collapsed into a single line.
pub fn flat_text(el: ElementRef<'_>) -> String {
    crate::utils::collapse_whitespace(&block_text(el))
}

/// Text under `el` with block boundaries and `<br>` rendered as newlines.
pub fn block_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_block_text(el, &mut out);
    out
}

fn push_block_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = element.name();
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                let block = is_block(name);
                if block {
                    out.push('\n');
                }
                push_block_text(child_el, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Non-empty, whitespace-collapsed lines of [`block_text`].
pub fn text_lines(el: ElementRef<'_>) -> Vec<String> {
    block_text(el)
        .lines()
        .map(crate::utils::collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <html><head><title>Ignored</title><style>.x{color:red}</style></head>
        <body>
          <nav><a href="https://example.com/nav">Nav link</a></nav>
          <table><tr>
            <td id="cell"><strong>Headline here</strong><br>First line.<p>Second <em>line</em>.</p></td>
          </tr></table>
          <div class="footer-links"><a href="https://example.com/foot">Footer</a></div>
          <script>var a = "<a href='x'>";</script>
        </body></html>
    "#;

    #[test]
    fn test_noise_subtrees_removed() {
        let doc = Document::parse(SAMPLE);
        let anchors = doc.find_by_tag(&["a"]);
        assert!(anchors.is_empty());
        assert!(!doc.text().contains("Ignored"));
        assert!(!doc.text().contains("color:red"));
    }

    #[test]
    fn test_find_by_predicate() {
        let doc = Document::parse(SAMPLE);
        let cells = doc.find_by_predicate(|el| attr(el, "id") == Some("cell"));
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].value().name(), "td");
    }

    #[test]
    fn test_text_lines_follow_blocks_and_breaks() {
        let doc = Document::parse(SAMPLE);
        let cell = doc.find_by_tag(&["td"])[0];
        assert_eq!(
            text_lines(cell),
            vec!["Headline here", "First line.", "Second line."]
        );
        assert_eq!(flat_text(cell), "Headline here First line. Second line.");
    }

    #[test]
    fn test_nearest_ancestor() {
        let doc = Document::parse(SAMPLE);
        let strong = doc.find_by_tag(&["strong"])[0];
        let cell = nearest_ancestor(strong, |a| a.value().name() == "td").unwrap();
        assert_eq!(attr(&cell, "id"), Some("cell"));
        assert!(nearest_ancestor(strong, |a| a.value().name() == "li").is_none());
        let same = nearest_ancestor_or_self(cell, &["td"]).unwrap();
        assert_eq!(same.id(), cell.id());
    }

    #[test]
    fn test_descendants_by_tag() {
        let doc = Document::parse(SAMPLE);
        let cell = doc.find_by_tag(&["td"])[0];
        assert_eq!(descendants_by_tag(cell, &["strong", "em"]).len(), 2);
        assert!(descendants_by_tag(cell, &["td"]).is_empty());
    }

    #[test]
    fn test_position_follows_reading_order() {
        let doc = Document::parse(
            "<table><tr><td><b>First headline</b></td></tr></table><p><a href='https://example.com/2'>Second</a></p>",
        );
        let bold = doc.find_by_tag(&["b"])[0];
        let anchor = doc.find_by_tag(&["a"])[0];
        let cell = doc.find_by_tag(&["td"])[0];
        let position = doc.reading_order();
        assert!(position(&cell) < position(&bold));
        assert!(position(&bold) < position(&anchor));
    }

    #[test]
    fn test_malformed_markup_still_parses() {
        let doc = Document::parse("<div><a href='https://example.com/x'>Unclosed <b>tags");
        assert_eq!(doc.find_by_tag(&["a"]).len(), 1);
    }
}
