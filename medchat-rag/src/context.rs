//! Context assembly: search matches in, prompt material and citations out.

use serde::{Deserialize, Serialize};

use crate::document::SearchMatch;

/// Separator placed between passages when they are rendered as one block.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Citation label prefix used when a passage has no explicit source.
pub const MANUAL_CITATION_PREFIX: &str = "Medical Manual P.";

/// Placeholder page used when a passage has neither source nor page.
pub const UNKNOWN_PAGE: &str = "?";

/// One retained passage, ready to hand to a generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextPassage {
    /// Identifier of the match the passage came from.
    pub id: String,
    /// The passage text.
    pub text: String,
    /// The citation label for this passage.
    pub citation: String,
    /// The source document, when the index recorded one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

/// The generation input derived from a set of search matches.
///
/// Passages and citations are in search-result order and there is exactly
/// one citation per passage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssembledContext {
    passages: Vec<ContextPassage>,
}

impl AssembledContext {
    /// The retained passages.
    pub fn passages(&self) -> &[ContextPassage] {
        &self.passages
    }

    /// Whether no passage survived filtering.
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Number of retained passages.
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    /// The passage texts joined by [`CONTEXT_SEPARATOR`].
    pub fn block(&self) -> String {
        self.passages.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join(CONTEXT_SEPARATOR)
    }

    /// One citation per retained passage.
    pub fn citations(&self) -> Vec<String> {
        self.passages.iter().map(|p| p.citation.clone()).collect()
    }
}

/// Build the citation label for a match: its explicit source if it has one,
/// otherwise the manual page (or `?` when the page is unknown).
pub fn format_citation(search_match: &SearchMatch) -> String {
    if let Some(source) = search_match.source() {
        return source.to_string();
    }
    let page = search_match.page().unwrap_or_else(|| UNKNOWN_PAGE.to_string());
    format!("{MANUAL_CITATION_PREFIX}{page}")
}

/// Keep the matches that carry text and derive one citation for each.
///
/// Never fails: no matches (or none with text) yields an empty context, and
/// generation still runs against it.
pub fn assemble(matches: &[SearchMatch]) -> AssembledContext {
    let passages = matches
        .iter()
        .filter_map(|m| {
            let text = m.text()?;
            Some(ContextPassage {
                id: m.id.clone(),
                text: text.to_string(),
                citation: format_citation(m),
                document_id: m.document_id().map(str::to_string),
            })
        })
        .collect();
    AssembledContext { passages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{PAGE_KEY, SOURCE_KEY, TEXT_KEY};

    fn passage(id: &str, text: &str, page: u32) -> SearchMatch {
        SearchMatch::new(id, 0.8).with_metadata(TEXT_KEY, text).with_metadata(PAGE_KEY, page)
    }

    #[test]
    fn page_citations_follow_result_order() {
        let ctx = assemble(&[passage("a", "T1", 10), passage("b", "T2", 12)]);
        assert_eq!(ctx.citations(), vec!["Medical Manual P.10", "Medical Manual P.12"]);
        assert_eq!(ctx.block(), "T1\n\n---\n\nT2");
    }

    #[test]
    fn explicit_source_wins_over_page() {
        let m = passage("a", "T1", 10).with_metadata(SOURCE_KEY, "Merck Manual, ch. 4");
        assert_eq!(format_citation(&m), "Merck Manual, ch. 4");
    }

    #[test]
    fn missing_page_uses_placeholder() {
        let m = SearchMatch::new("a", 0.5).with_metadata(TEXT_KEY, "T1");
        assert_eq!(format_citation(&m), "Medical Manual P.?");
    }

    #[test]
    fn matches_without_text_are_dropped() {
        let matches = vec![
            passage("a", "T1", 1),
            SearchMatch::new("b", 0.7).with_metadata(PAGE_KEY, 2),
            passage("c", "", 3),
            passage("d", "T4", 4),
        ];
        let ctx = assemble(&matches);
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.citations(), vec!["Medical Manual P.1", "Medical Manual P.4"]);
        assert_eq!(ctx.passages()[1].id, "d");
    }

    #[test]
    fn no_matches_gives_empty_context() {
        let ctx = assemble(&[]);
        assert!(ctx.is_empty());
        assert_eq!(ctx.block(), "");
        assert!(ctx.citations().is_empty());
    }
}
