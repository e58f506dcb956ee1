//! HTML extraction pass.
//!
//! Three strategies run over the same parsed [`Document`]:
//!
//! 1. **Anchor sweep**: every click-tracking anchor is a primary candidate.
//!    Its title is the anchor text, or, for icon/"→" links, the first
//!    plausible headline line of the enclosing block.
//! 2. **Table-cell sweep**: innermost table cells that carry a headline (bold
//!    or heading text) or a read-time marker, paired with the first usable link
//!    in the cell. Catches layouts whose links are not tracking redirects.
//! 3. **Bold sweep**: bold/strong headlines paired with their enclosing link,
//!    or the first usable link of their block.
//!
//! Classification always looks at the whole enclosing block, because sponsor
//! labels sit beside the link rather than inside it.
//!
//! Every find remembers the link element it came from. The pooled output is
//! sorted by that link's position in the document, with strategy order as
//! the tie-break, so the same article found by several sweeps keeps the
//! anchor sweep's version first.

use super::{ExtractContext, build_candidate, clean_title, text_after_title};
use crate::classifier;
use crate::dom::{
    CONTAINER_TAGS, Document, attr, descendants_by_tag, flat_text, nearest_ancestor,
    nearest_ancestor_or_self, text_lines,
};
use crate::models::{ArticleCandidate, LinkCandidate, Provenance};
use crate::resolver;
use scraper::ElementRef;
use tracing::{debug, instrument};

/// Anchor texts shorter than this fall back to a headline from the block.
const MIN_ANCHOR_TITLE_CHARS: usize = 5;
/// Length window for a headline line taken from the block.
const BLOCK_TITLE_CHARS: (usize, usize) = (15, 200);
/// Minimum length of bold text treated as a headline.
const MIN_BOLD_TITLE_CHARS: usize = 10;

const HEADLINE_TAGS: &[&str] = &["b", "strong", "h1", "h2", "h3", "h4"];

/// A candidate and the link element it was built from.
pub type Found<'d> = (ElementRef<'d>, ArticleCandidate);

/// A named HTML strategy.
pub struct HtmlStrategy {
    pub name: &'static str,
    pub run: for<'d> fn(&'d Document, &ExtractContext<'_>) -> Vec<Found<'d>>,
}

/// Strategies in tie-break order.
pub const HTML_STRATEGIES: &[HtmlStrategy] = &[
    HtmlStrategy {
        name: "anchor_sweep",
        run: anchor_sweep,
    },
    HtmlStrategy {
        name: "table_cell_sweep",
        run: table_cell_sweep,
    },
    HtmlStrategy {
        name: "bold_sweep",
        run: bold_sweep,
    },
];

/// Run every HTML strategy over `html` and pool the results in document order.
#[instrument(level = "debug", skip_all, fields(bytes = html.len()))]
pub fn extract_html(html: &str, ctx: &ExtractContext<'_>) -> Vec<ArticleCandidate> {
    if html.trim().is_empty() {
        return Vec::new();
    }
    let document = Document::parse(html);
    let position = document.reading_order();
    let mut pooled: Vec<(usize, usize, ArticleCandidate)> = Vec::new();
    for (rank, strategy) in HTML_STRATEGIES.iter().enumerate() {
        let found = (strategy.run)(&document, ctx);
        debug!(strategy = strategy.name, count = found.len(), "HTML strategy finished");
        pooled.extend(found.into_iter().map(|(link, candidate)| (position(&link), rank, candidate)));
    }
    // Stable, so one strategy's finds on the same link keep their order
    pooled.sort_by_key(|(pos, rank, _)| (*pos, *rank));
    pooled.into_iter().map(|(_, _, candidate)| candidate).collect()
}

/// The block an element belongs to, or the element itself at top level.
fn container_of(el: ElementRef<'_>) -> ElementRef<'_> {
    nearest_ancestor(el, |a| CONTAINER_TAGS.contains(&a.value().name())).unwrap_or(el)
}

fn looks_like_boilerplate(line: &str, ctx: &ExtractContext<'_>) -> bool {
    classifier::is_admin(line, "", ctx.config)
        || classifier::is_sponsored(line, &ctx.config.classifier)
        || resolver::is_tracking_link(line, &ctx.config.resolver)
        || line.starts_with("http")
}

/// First line of the block that reads like a headline.
fn headline_from_block(container: ElementRef<'_>, ctx: &ExtractContext<'_>) -> Option<String> {
    let (min, max) = BLOCK_TITLE_CHARS;
    text_lines(container)
        .into_iter()
        .map(|line| clean_title(&line))
        .find(|line| {
            let len = line.chars().count();
            (min..=max).contains(&len) && !looks_like_boilerplate(line, ctx)
        })
}

/// Shared tail of every strategy: wrap the find and hand it to the builder.
fn candidate_from<'d>(
    anchor: ElementRef<'d>,
    href: &str,
    title: &str,
    container: ElementRef<'_>,
    ctx: &ExtractContext<'_>,
) -> Option<Found<'d>> {
    let surrounding = flat_text(container);
    let body = text_after_title(&surrounding, title).to_string();
    let link = LinkCandidate {
        href: href.to_string(),
        anchor_text: flat_text(anchor),
        surrounding_text: surrounding,
        provenance: Provenance::Html,
    };
    build_candidate(&link, title, &body, ctx).map(|candidate| (anchor, candidate))
}

/// First anchor under `el` whose target resolves and is not administrative.
fn first_usable_link<'a>(el: ElementRef<'a>, ctx: &ExtractContext<'_>) -> Option<(ElementRef<'a>, &'a str)> {
    descendants_by_tag(el, &["a"]).into_iter().find_map(|a| {
        let href = attr(&a, "href")?;
        let usable = resolver::resolve(href, &ctx.config.resolver).is_some()
            && !classifier::is_admin(&flat_text(a), href, ctx.config);
        usable.then_some((a, href))
    })
}

/// Primary strategy: every click-tracking anchor.
pub fn anchor_sweep<'d>(document: &'d Document, ctx: &ExtractContext<'_>) -> Vec<Found<'d>> {
    document
        .find_by_tag(&["a"])
        .into_iter()
        .filter_map(|anchor| {
            let href = attr(&anchor, "href")?;
            if !resolver::is_tracking_link(href, &ctx.config.resolver) {
                return None;
            }
            let anchor_text = flat_text(anchor);
            if classifier::is_admin(&anchor_text, href, ctx.config) {
                debug!(text = %anchor_text, "Skipping administrative anchor");
                return None;
            }

            let container = container_of(anchor);
            let own_title = clean_title(&anchor_text);
            let title = if own_title.chars().count() >= MIN_ANCHOR_TITLE_CHARS {
                own_title
            } else {
                headline_from_block(container, ctx)?
            };
            candidate_from(anchor, href, &title, container, ctx)
        })
        .collect()
}

/// Innermost table cells with a headline or a read-time marker.
pub fn table_cell_sweep<'d>(document: &'d Document, ctx: &ExtractContext<'_>) -> Vec<Found<'d>> {
    document
        .find_by_tag(&["td", "th"])
        .into_iter()
        .filter(|cell| descendants_by_tag(*cell, &["td", "th"]).is_empty())
        .filter_map(|cell| {
            let (anchor, href) = first_usable_link(cell, ctx)?;
            let headline = descendants_by_tag(cell, HEADLINE_TAGS)
                .into_iter()
                .map(|h| clean_title(&flat_text(h)))
                .find(|t| t.chars().count() >= MIN_BOLD_TITLE_CHARS);

            let title = match headline {
                Some(title) => title,
                None if classifier::has_read_time(&flat_text(cell)) => clean_title(&flat_text(anchor)),
                None => return None,
            };
            candidate_from(anchor, href, &title, cell, ctx)
        })
        .collect()
}

/// Bold/strong/heading text used as a headline.
pub fn bold_sweep<'d>(document: &'d Document, ctx: &ExtractContext<'_>) -> Vec<Found<'d>> {
    let (min, max) = BLOCK_TITLE_CHARS;
    document
        .find_by_tag(HEADLINE_TAGS)
        .into_iter()
        .filter_map(|bold| {
            let title = clean_title(&flat_text(bold));
            if !(min..=max).contains(&title.chars().count()) {
                return None;
            }
            let container = container_of(bold);
            let (anchor, href) = match nearest_ancestor_or_self(bold, &["a"]) {
                Some(a) => (a, attr(&a, "href")?),
                None => first_usable_link(container, ctx)?,
            };
            candidate_from(anchor, href, &title, container, ctx)
        })
        .collect()
}
