//! Terminal rendering for pages and search results.

use colored::{ColoredString, Colorize};
use textweb_client::{BlockKind, SearchHit, TextBlock};

/// Header printed above search results.
const RESULTS_HEADER: &str = "Top 10 results:";

/// Style one block: headings by level, body text green.
pub fn style_block(block: &TextBlock) -> ColoredString {
    let text = block.text.as_str();
    match block.kind {
        BlockKind::Heading(1) => text.bold().white().underline(),
        BlockKind::Heading(2) => text.bold().white(),
        BlockKind::Heading(3) => text.bold().yellow(),
        BlockKind::Heading(4) => text.bold().green(),
        BlockKind::Heading(5) => text.bold().blue(),
        BlockKind::Heading(6) => text.bold().magenta(),
        BlockKind::Heading(_) | BlockKind::Paragraph => text.green(),
    }
}

/// Render extracted blocks, one per line.
pub fn render_page(blocks: &[TextBlock]) -> String {
    blocks
        .iter()
        .map(|block| style_block(block).to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a numbered result list under the results header.
pub fn render_search(hits: &[SearchHit]) -> String {
    let mut lines = vec![RESULTS_HEADER.bold().cyan().to_string()];
    lines.extend(
        hits.iter()
            .enumerate()
            .map(|(i, hit)| format!("{}. {} - {}", i + 1, hit.title.green(), hit.href)),
    );
    lines.join("\n")
}
