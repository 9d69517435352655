//! Readable text extraction from HTML.
//!
//! Pulls headings and paragraphs out of a page in document order. Styling is
//! left to the caller; each block carries its kind so headings can be
//! rendered differently from body text.

use scraper::{Html, Selector};

/// Elements that make up the readable text of a page.
const TEXT_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p";

/// Kind of a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `<h1>` through `<h6>`; the level is 1..=6.
    Heading(u8),
    Paragraph,
}

impl BlockKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "p" => Some(BlockKind::Paragraph),
            "h1" => Some(BlockKind::Heading(1)),
            "h2" => Some(BlockKind::Heading(2)),
            "h3" => Some(BlockKind::Heading(3)),
            "h4" => Some(BlockKind::Heading(4)),
            "h5" => Some(BlockKind::Heading(5)),
            "h6" => Some(BlockKind::Heading(6)),
            _ => None,
        }
    }
}

/// One heading or paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub kind: BlockKind,
    /// Text content with whitespace runs collapsed to single spaces.
    pub text: String,
}

/// Extract headings and paragraphs from an HTML document.
///
/// Blocks with no visible text are dropped.
pub fn extract_text_blocks(html: &str) -> Vec<TextBlock> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(TEXT_SELECTOR).expect("invalid selector");

    document
        .select(&selector)
        .filter_map(|element| {
            let kind = BlockKind::from_tag(element.value().name())?;
            let text = element.text().collect::<Vec<_>>().join("");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() { None } else { Some(TextBlock { kind, text }) }
        })
        .collect()
}
