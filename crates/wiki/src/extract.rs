//! Structural extraction of wiki pages.
//!
//! One DOM pass over the main content container collects, in document
//! order: substantial top-level paragraphs, every top-level header with
//! its following paragraphs, the flattened infobox, and the internal
//! link graph. A fixed keyword catalog is then matched against the
//! collected header list: the catalog is data, the matching loop is the
//! only logic.

use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;

/// Paragraphs shorter than this (after whitespace collapsing) are
/// considered navigation noise and skipped in the intro.
const MIN_PARAGRAPH_CHARS: usize = 20;

/// Named section headers worth keeping, keyword → emitted label.
/// Grouped by the page kinds they show up on (quests, items, creatures,
/// vendors, slayer masters); matched first-header-wins per entry.
const SECTION_CATALOG: &[(&str, &str)] = &[
    ("location", "Location Information"),
    ("drops", "Drops Information"),
    ("combat", "Combat Information"),
    // quest pages
    ("requirements", "Requirements"),
    ("rewards", "Rewards"),
    ("walkthrough", "Walkthrough"),
    ("details", "Details"),
    ("required for", "Required for completing"),
    // item pages
    ("creation", "Creation"),
    ("money making", "Money Making"),
    ("products", "Products"),
    ("uses", "Uses"),
    ("item sources", "Item Sources"),
    ("combat stats", "Combat Stats"),
    ("cost", "Cost"),
    ("materials", "Materials"),
    ("skill requirements", "Skill Requirements"),
    ("grand exchange", "Grand Exchange"),
    ("advanced data", "Advanced Data"),
    // creature pages
    ("strategy", "Strategy"),
    ("mechanics", "Mechanics"),
    ("combat info", "Combat Info"),
    ("slayer info", "Slayer Info"),
    ("aggressive stats", "Aggressive Stats"),
    ("defence", "Defence"),
    ("immunities", "Immunities"),
    // vendor pages
    ("stock", "Stock"),
    ("dialogue", "Dialogue"),
    ("involvement in quests", "Involvement in Quests"),
    ("involvement in events", "Involvement in Events"),
    ("shop", "Shop"),
    ("services", "Services"),
    ("repair", "Repair"),
    ("trade", "Trade"),
    ("options", "Options"),
    ("examine", "Examine"),
    // slayer master pages
    ("slayer masters", "Slayer Masters"),
    ("slayer points", "Slayer Points"),
    ("combat level", "Combat Level"),
    ("slayer level", "Slayer Level"),
    ("task list", "Task List"),
    ("teleport", "Teleport"),
    ("equipment", "Equipment"),
    // shared trailing sections
    ("notes", "Notes"),
    ("changes", "Changes"),
    ("gallery", "Gallery"),
    ("trivia", "Trivia"),
    ("references", "References"),
];

/// The result of structural extraction: content blocks in encounter
/// order and the deduplicated internal link set.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub blocks: Vec<String>,
    pub related_links: BTreeSet<String>,
}

impl ExtractedDocument {
    /// Total word count across all blocks.
    pub fn word_count(&self) -> usize {
        self.blocks.iter().map(|b| b.split_whitespace().count()).sum()
    }
}

/// Collapse runs of whitespace (including newlines) into single spaces.
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map an internal href to a page name, excluding the administrative and
/// file namespaces. `/w/Abyssal_whip` → `Abyssal_whip`.
fn page_name_from_href(href: &str) -> Option<String> {
    let rest = href.strip_prefix("/w/")?;
    if href.starts_with("/w/Special:") {
        return None;
    }
    let page = rest.rsplit('/').next().unwrap_or(rest);
    if page.is_empty() || page.starts_with("File:") {
        return None;
    }
    Some(page.to_string())
}

fn harvest_links(el: ElementRef<'_>, links: &mut BTreeSet<String>) {
    let a_sel = Selector::parse("a[href]").unwrap();
    for link in el.select(&a_sel) {
        if let Some(href) = link.value().attr("href") {
            if let Some(page) = page_name_from_href(href) {
                links.insert(page);
            }
        }
    }
}

/// Extract content blocks and the related-link set from raw page HTML.
pub fn extract_document(html: &str) -> ExtractedDocument {
    let doc = Html::parse_document(html);
    let mut blocks = Vec::new();
    let mut related_links = BTreeSet::new();

    let main_sel = Selector::parse("div.mw-parser-output").unwrap();
    let Some(main) = doc.select(&main_sel).next() else {
        return ExtractedDocument {
            blocks: vec!["No content found".into()],
            related_links,
        };
    };

    // Single pass over the container's direct children: intro paragraphs
    // before the first top-level header, then (header, paragraphs) runs.
    let mut headers: Vec<(String, Vec<String>)> = Vec::new();
    let mut in_section = false;

    for child in main.children() {
        let Some(el) = ElementRef::wrap(child) else {
            continue;
        };
        match el.value().name() {
            "p" => {
                let text = clean_text(&el.text().collect::<String>());
                harvest_links(el, &mut related_links);
                if in_section {
                    if let Some((_, paragraphs)) = headers.last_mut() {
                        if !text.is_empty() {
                            paragraphs.push(text);
                        }
                    }
                } else if text.len() > MIN_PARAGRAPH_CHARS {
                    blocks.push(text);
                }
            }
            "h2" => {
                let title = clean_text(&el.text().collect::<String>());
                headers.push((title.to_lowercase(), Vec::new()));
                in_section = true;
            }
            _ => {}
        }
    }

    // Infobox: flatten label/value rows, harvest its links too.
    let infobox_sel = Selector::parse("table.infobox").unwrap();
    if let Some(infobox) = doc.select(&infobox_sel).next() {
        let row_sel = Selector::parse("tr").unwrap();
        let th_sel = Selector::parse("th").unwrap();
        let td_sel = Selector::parse("td").unwrap();

        let mut lines = Vec::new();
        for row in infobox.select(&row_sel) {
            harvest_links(row, &mut related_links);
            let label = row.select(&th_sel).next().map(|e| clean_text(&e.text().collect::<String>()));
            let value = row.select(&td_sel).next().map(|e| clean_text(&e.text().collect::<String>()));
            if let (Some(label), Some(value)) = (label, value) {
                if !label.is_empty() && !value.is_empty() {
                    lines.push(format!("{label}: {value}"));
                }
            }
        }
        if !lines.is_empty() {
            blocks.push(format!("\nInfobox Information:\n{}", lines.join("\n")));
        }
    }

    // Catalog lookup against the collected header list: the first header
    // containing the keyword wins, matched case-insensitively.
    for (keyword, label) in SECTION_CATALOG {
        let section = headers
            .iter()
            .find(|(title, _)| title.contains(keyword))
            .filter(|(_, paragraphs)| !paragraphs.is_empty());
        if let Some((_, paragraphs)) = section {
            blocks.push(format!("\n{label}:\n{}", paragraphs.join("\n")));
        }
    }

    ExtractedDocument {
        blocks,
        related_links,
    }
}

/// Whether a fetched document is a disambiguation page: one that lists
/// multiple distinct referents instead of content.
pub fn is_disambiguation(html: &str) -> bool {
    html.contains("may refer to") || html.to_lowercase().contains("disambiguation")
}

/// Harvest candidate page names from a disambiguation page, in document
/// order, excluding the page's own title.
pub fn disambiguation_candidates(html: &str, exclude: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let a_sel = Selector::parse("a[href]").unwrap();

    let mut seen = BTreeSet::new();
    let mut candidates = Vec::new();
    for link in doc.select(&a_sel) {
        if let Some(href) = link.value().attr("href") {
            if let Some(page) = page_name_from_href(href) {
                if page != exclude && seen.insert(page.clone()) {
                    candidates.push(page);
                }
            }
        }
    }
    candidates
}
