#[cfg(test)]
mod tests {
    use super::*;

    // === extract_links tests ===

    #[test]
    fn extracts_simple_link() {
        let result = extract_links("[[Note]]");
        assert_eq!(result, vec!["note"]);
    }

    #[test]
    fn returns_empty_for_no_links() {
        let result = extract_links("plain text");
        assert_eq!(result, Vec::<String>::new());
    }

    #[test]
    fn returns_empty_for_empty_input() {
        let result = extract_links("");
        assert_eq!(result, Vec::<String>::new());
    }

    #[test]
    fn extracts_multiple_links_in_order() {
        let result = extract_links("[[One]] and [[Two]]");
        assert_eq!(result, vec!["one", "two"]);
    }

    #[test]
    fn normalizes_spaces_to_hyphens() {
        let result = extract_links("[[Foo Bar]]");
        assert_eq!(result, vec!["foo-bar"]);
    }

    #[test]
    fn collapses_whitespace_runs() {
        let result = extract_links("[[Foo   \t Bar]]");
        assert_eq!(result, vec!["foo-bar"]);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let result = extract_links("[[  Ideas  ]]");
        assert_eq!(result, vec!["ideas"]);
    }

    #[test]
    fn ignores_display_text() {
        let result = extract_links("[[foo-bar|Custom Text]]");
        assert_eq!(result, vec!["foo-bar"]);
    }

    #[test]
    fn deduplicates_repeated_targets() {
        let result = extract_links("[[Foo]] then [[foo]] then [[Foo Bar]]");
        assert_eq!(result, vec!["foo", "foo-bar"]);
    }

    #[test]
    fn ignores_empty_brackets() {
        let result = extract_links("[[]]");
        assert_eq!(result, Vec::<String>::new());
    }

    #[test]
    fn ignores_whitespace_only_target() {
        let result = extract_links("[[   ]]");
        assert_eq!(result, Vec::<String>::new());
    }

    #[test]
    fn lone_brackets_do_not_match() {
        let result = extract_links("a [ b ]] c [[ d");
        assert_eq!(result, Vec::<String>::new());
    }

    // === normalize_slug tests ===

    #[test]
    fn normalize_lowercases_and_hyphenates() {
        assert_eq!(normalize_slug("  My Great Note "), "my-great-note");
    }

    #[test]
    fn normalize_keeps_existing_hyphens() {
        assert_eq!(normalize_slug("already-a-slug"), "already-a-slug");
    }

    // === rewrite_wiki_links tests ===

    #[test]
    fn rewrites_plain_link() {
        let result = rewrite_wiki_links("see [[My Note]] here");
        assert_eq!(result, "see [My Note](/my-note){.wiki-link} here");
    }

    #[test]
    fn rewrites_link_with_display_text() {
        let result = rewrite_wiki_links("[[foo-bar|Custom Text]]");
        assert_eq!(result, "[Custom Text](/foo-bar){.wiki-link}");
    }

    #[test]
    fn rewrites_multiple_links() {
        let result = rewrite_wiki_links("[[A]] and [[b|B]]");
        assert_eq!(result, "[A](/a){.wiki-link} and [B](/b){.wiki-link}");
    }

    #[test]
    fn leaves_malformed_syntax_untouched() {
        let result = rewrite_wiki_links("[[a|]] and [not a link]");
        assert_eq!(result, "[[a|]] and [not a link]");
    }

    #[test]
    fn leaves_plain_text_untouched() {
        let result = rewrite_wiki_links("no links here");
        assert_eq!(result, "no links here");
    }
}

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

// Compile regexes once, reuse across calls
static WIKILINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]|]+)(?:\|([^\]]+))?\]\]").unwrap());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Normalize a raw wiki-link target into a slug: trim, lowercase,
/// collapse whitespace runs to single hyphens.
pub fn normalize_slug(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    WHITESPACE_RE.replace_all(&lowered, "-").into_owned()
}

/// Extract wiki-link targets from markdown text, normalized to slugs.
/// Returns targets de-duplicated, in first-occurrence order. Display text
/// (`[[target|display]]`) is ignored here; it only matters for rewriting.
/// Malformed bracket sequences simply fail to match.
pub fn extract_links(markdown: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for cap in WIKILINK_RE.captures_iter(markdown) {
        let slug = normalize_slug(&cap[1]);
        if slug.is_empty() {
            continue;
        }
        if seen.insert(slug.clone()) {
            links.push(slug);
        }
    }

    links
}

/// Rewrite `[[target]]` and `[[target|display]]` into markdown links of the
/// form `[display](/slug){.wiki-link}`, for a rendering pipeline to apply
/// before markdown parsing. Display text defaults to the trimmed raw target.
pub fn rewrite_wiki_links(markdown: &str) -> String {
    WIKILINK_RE
        .replace_all(markdown, |caps: &regex::Captures| {
            let slug = normalize_slug(&caps[1]);
            let text = caps
                .get(2)
                .map(|m| m.as_str().trim())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| caps[1].trim());
            format!("[{}](/{}){{.wiki-link}}", text, slug)
        })
        .into_owned()
}
