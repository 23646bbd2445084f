use crate::document::Document;
use crate::link_parser::extract_links;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Bytes of context kept on each side of the first match when building a
/// snippet.
const SNIPPET_CONTEXT: usize = 120;

/// Titles shorter than this produce too many false positives to be useful.
const MIN_TITLE_LEN: usize = 3;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// A document that mentions a target note's title without linking to it.
#[derive(Debug, Clone, Serialize)]
pub struct MentionItem {
    pub slug: String,
    pub title: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub snippet: String,
    #[serde(rename = "highlightedSnippet")]
    pub highlighted_snippet: String,
}

/// Whole-word, case-insensitive matcher for a note title.
fn title_regex(target_title: &str) -> Option<Regex> {
    let pattern = format!(r"(?i)\b{}\b", regex::escape(target_title));
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(title = target_title, error = %e, "failed to build title matcher");
            None
        }
    }
}

/// Pull a prose window around the first match, collapsed to single spaces.
fn get_snippet(text: &str, re: &Regex) -> String {
    let Some(m) = re.find(text) else {
        return String::new();
    };

    let mut start = m.start().saturating_sub(SNIPPET_CONTEXT);
    while start > 0 && !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = usize::min(m.end() + SNIPPET_CONTEXT, text.len());
    while end < text.len() && !text.is_char_boundary(end) {
        end += 1;
    }

    let window = WHITESPACE_RE.replace_all(text[start..end].trim(), " ");
    let mut snippet = String::new();
    if start > 0 {
        snippet.push_str("...");
    }
    snippet.push_str(&window);
    if end < text.len() {
        snippet.push_str("...");
    }
    snippet
}

/// Wrap every title match in `<mark>` tags.
fn highlight_match(snippet: &str, re: &Regex) -> String {
    re.replace_all(snippet, "<mark>$0</mark>").into_owned()
}

/// Find documents whose body mentions `target_title` as plain text but
/// which do not wiki-link to `target_slug` (and are not the target itself).
///
/// Returns an empty list for a missing slug/title or a title shorter than
/// three characters.
pub fn find_unlinked_mentions(
    documents: &[Document],
    target_slug: &str,
    target_title: &str,
) -> Vec<MentionItem> {
    if target_slug.is_empty() || target_title.chars().count() < MIN_TITLE_LEN {
        return Vec::new();
    }
    let Some(re) = title_regex(target_title) else {
        return Vec::new();
    };

    let mut mentions = Vec::new();
    for doc in documents {
        if doc.slug == target_slug {
            continue;
        }
        if extract_links(&doc.body).iter().any(|l| l == target_slug) {
            continue;
        }
        if !re.is_match(&doc.body) {
            continue;
        }

        let snippet = get_snippet(&doc.body, &re);
        mentions.push(MentionItem {
            slug: doc.slug.clone(),
            title: doc.title.clone(),
            doc_type: doc.doc_type.clone(),
            highlighted_snippet: highlight_match(&snippet, &re),
            snippet,
        });
    }

    mentions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(slug: &str, title: &str, body: &str) -> Document {
        Document::new(slug, title, "note", body)
    }

    #[test]
    fn finds_plain_text_mention() {
        let docs = vec![
            doc("zettelkasten", "Zettelkasten", "the method itself"),
            doc("a", "A", "I started using the Zettelkasten method last year."),
        ];
        let mentions = find_unlinked_mentions(&docs, "zettelkasten", "Zettelkasten");
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].slug, "a");
        assert!(mentions[0].snippet.contains("Zettelkasten method"));
        assert!(mentions[0]
            .highlighted_snippet
            .contains("<mark>Zettelkasten</mark>"));
    }

    #[test]
    fn match_is_case_insensitive() {
        let docs = vec![doc("a", "A", "all about zettelkasten here")];
        let mentions = find_unlinked_mentions(&docs, "zettelkasten", "Zettelkasten");
        assert_eq!(mentions.len(), 1);
    }

    #[test]
    fn linked_documents_are_excluded() {
        let docs = vec![doc(
            "a",
            "A",
            "Zettelkasten is covered in [[zettelkasten]] already.",
        )];
        let mentions = find_unlinked_mentions(&docs, "zettelkasten", "Zettelkasten");
        assert!(mentions.is_empty());
    }

    #[test]
    fn target_itself_is_excluded() {
        let docs = vec![doc("zettelkasten", "Zettelkasten", "Zettelkasten notes")];
        let mentions = find_unlinked_mentions(&docs, "zettelkasten", "Zettelkasten");
        assert!(mentions.is_empty());
    }

    #[test]
    fn requires_whole_word() {
        let docs = vec![doc("a", "A", "the superzettelkastenish approach")];
        let mentions = find_unlinked_mentions(&docs, "zettelkasten", "zettelkasten");
        assert!(mentions.is_empty());
    }

    #[test]
    fn short_or_missing_title_yields_nothing() {
        let docs = vec![doc("a", "A", "ab is mentioned")];
        assert!(find_unlinked_mentions(&docs, "ab", "ab").is_empty());
        assert!(find_unlinked_mentions(&docs, "", "something").is_empty());
    }

    #[test]
    fn regex_metacharacters_in_title_are_literal() {
        let docs = vec![doc("a", "A", "the Design (of) Things matters")];
        let mentions = find_unlinked_mentions(&docs, "design-of-things", "Design (of) Things");
        assert_eq!(mentions.len(), 1);
    }

    #[test]
    fn snippet_windows_long_bodies() {
        let body = format!("{} Zettelkasten {}", "x".repeat(500), "y".repeat(500));
        let docs = vec![doc("a", "A", &body)];
        let mentions = find_unlinked_mentions(&docs, "zettelkasten", "Zettelkasten");
        let snippet = &mentions[0].snippet;
        assert!(snippet.starts_with("..."));
        assert!(snippet.ends_with("..."));
        assert!(snippet.len() < body.len());
    }
}
