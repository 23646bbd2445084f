use crate::document::Document;
use crate::embeddings::SimilarNote;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Hard cap on search result counts, whatever the caller asks for.
pub const MAX_SEARCH_RESULTS: usize = 10;

/// Blend weights: keyword matches are precise, semantic captures meaning.
pub const KEYWORD_WEIGHT: f32 = 0.4;
pub const SEMANTIC_WEIGHT: f32 = 0.6;

/// Common stop words filtered out of search queries.
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "what", "which", "who", "whom",
    "this", "that", "these", "those", "am", "or", "and", "but", "if", "for", "not", "no", "can",
    "how", "all", "each", "every", "both", "few", "more", "most", "other", "some", "such", "only",
    "own", "same", "so", "than", "too", "very", "just", "about", "into", "through", "during",
    "before", "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off",
    "over", "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "any", "of", "at", "by", "with",
];

static STOP_WORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());

static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());

/// Extract meaningful keywords from a query: lowercase, strip punctuation,
/// drop stop words and words of one or two characters, keep at most eight.
pub fn extract_keywords(message: &str) -> Vec<String> {
    let lowered = message.to_lowercase();
    let cleaned = NON_WORD_RE.replace_all(&lowered, " ");
    cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() > 2 && !STOP_WORD_SET.contains(w))
        .map(str::to_string)
        .take(8)
        .collect()
}

fn matches_tag(tags_lower: &[String], keyword: &str) -> bool {
    tags_lower
        .iter()
        .any(|tag| tag == keyword || tag.contains(keyword) || keyword.contains(tag))
}

/// Relevance score for one note: title hits weigh 2, summary hits 1,
/// tag hits 3, summed over all keywords.
pub fn score_note(doc: &Document, keywords: &[String]) -> u32 {
    let title_lower = doc.title.to_lowercase();
    let summary_lower = doc.summary.as_deref().unwrap_or_default().to_lowercase();
    let tags_lower: Vec<String> = doc.tags.iter().map(|t| t.to_lowercase()).collect();

    keywords
        .iter()
        .map(|keyword| {
            let mut score = 0;
            if title_lower.contains(keyword.as_str()) {
                score += 2;
            }
            if summary_lower.contains(keyword.as_str()) {
                score += 1;
            }
            if matches_tag(&tags_lower, keyword) {
                score += 3;
            }
            score
        })
        .sum()
}

/// A keyword-scored search hit.
#[derive(Debug, Clone)]
pub struct ScoredNote<'a> {
    pub doc: &'a Document,
    pub score: u32,
}

/// Score and rank notes against a query. Only notes with a positive score
/// are returned, best first; `limit` is capped at [`MAX_SEARCH_RESULTS`].
pub fn keyword_search<'a>(
    documents: &'a [Document],
    query: &str,
    type_filter: Option<&str>,
    limit: usize,
) -> Vec<ScoredNote<'a>> {
    let max_limit = limit.min(MAX_SEARCH_RESULTS);
    let keywords = extract_keywords(query);
    if keywords.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<ScoredNote<'a>> = documents
        .iter()
        .filter(|doc| type_filter.map_or(true, |t| doc.doc_type == t))
        .map(|doc| ScoredNote {
            doc,
            score: score_note(doc, &keywords),
        })
        .filter(|s| s.score > 0)
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(max_limit);
    scored
}

/// A keyword-side input to the hybrid merge.
#[derive(Debug, Clone)]
pub struct KeywordResult {
    pub slug: String,
    pub title: String,
    pub score: f32,
}

/// A hit carrying both scores and their blend.
#[derive(Debug, Clone)]
pub struct HybridResult {
    pub slug: String,
    pub title: String,
    pub doc_type: Option<String>,
    pub keyword_score: f32,
    pub semantic_score: f32,
    pub hybrid_score: f32,
}

fn hybrid_score(keyword_score: f32, semantic_score: f32) -> f32 {
    keyword_score * KEYWORD_WEIGHT + semantic_score * SEMANTIC_WEIGHT
}

/// Merge keyword and semantic results into one ranking, matched by slug.
/// Keyword-only hits get semantic score 0 and vice versa; output is sorted
/// by blended score descending.
pub fn merge_search_results(
    keyword_results: &[KeywordResult],
    semantic_results: &[SimilarNote],
) -> Vec<HybridResult> {
    let mut merged: HashMap<String, HybridResult> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for kr in keyword_results {
        if !merged.contains_key(&kr.slug) {
            order.push(kr.slug.clone());
        }
        merged.insert(
            kr.slug.clone(),
            HybridResult {
                slug: kr.slug.clone(),
                title: kr.title.clone(),
                doc_type: None,
                keyword_score: kr.score,
                semantic_score: 0.0,
                hybrid_score: hybrid_score(kr.score, 0.0),
            },
        );
    }

    for sr in semantic_results {
        if let Some(existing) = merged.get_mut(&sr.slug) {
            existing.semantic_score = sr.score;
            existing.doc_type = Some(sr.doc_type.clone());
            existing.hybrid_score = hybrid_score(existing.keyword_score, sr.score);
            continue;
        }
        order.push(sr.slug.clone());
        merged.insert(
            sr.slug.clone(),
            HybridResult {
                slug: sr.slug.clone(),
                title: sr.title.clone(),
                doc_type: Some(sr.doc_type.clone()),
                keyword_score: 0.0,
                semantic_score: sr.score,
                hybrid_score: hybrid_score(0.0, sr.score),
            },
        );
    }

    let mut results: Vec<HybridResult> = order
        .into_iter()
        .filter_map(|slug| merged.remove(&slug))
        .collect();
    results.sort_by(|a, b| {
        b.hybrid_score
            .partial_cmp(&a.hybrid_score)
            .unwrap_or(Ordering::Equal)
    });
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(slug: &str, title: &str, summary: &str, tags: &[&str]) -> Document {
        let mut d = Document::new(slug, title, "note", "");
        d.summary = Some(summary.to_string());
        d.tags = tags.iter().map(|t| t.to_string()).collect();
        d
    }

    #[test]
    fn keywords_drop_stop_words_and_short_words() {
        let kw = extract_keywords("What is the best way to learn rust?");
        assert_eq!(kw, vec!["best", "way", "learn", "rust"]);
    }

    #[test]
    fn keywords_strip_punctuation() {
        let kw = extract_keywords("spaced-repetition, really?!");
        assert_eq!(kw, vec!["spaced-repetition", "really"]);
    }

    #[test]
    fn keywords_cap_at_eight() {
        let kw = extract_keywords("alpha bravo charlie delta echo foxtrot golf hotel india");
        assert_eq!(kw.len(), 8);
    }

    #[test]
    fn title_and_tag_hits_outrank_summary_hits() {
        let keywords = vec!["rust".to_string()];
        let title_hit = doc("a", "Rust Patterns", "", &[]);
        let summary_hit = doc("b", "Patterns", "notes on rust", &[]);
        let tag_hit = doc("c", "Patterns", "", &["rust"]);
        assert_eq!(score_note(&title_hit, &keywords), 2);
        assert_eq!(score_note(&summary_hit, &keywords), 1);
        assert_eq!(score_note(&tag_hit, &keywords), 3);
    }

    #[test]
    fn search_filters_zero_scores_and_sorts() {
        let docs = vec![
            doc("a", "Gardening", "", &[]),
            doc("b", "Rust Book", "all about rust", &["rust"]),
            doc("c", "Rust Snippets", "", &[]),
        ];
        let results = keyword_search(&docs, "learning rust", None, 5);
        let slugs: Vec<&str> = results.iter().map(|r| r.doc.slug.as_str()).collect();
        assert_eq!(slugs, vec!["b", "c"]);
    }

    #[test]
    fn search_respects_type_filter_and_limit_cap() {
        let mut docs = Vec::new();
        for i in 0..15 {
            docs.push(doc(&format!("n{i}"), "rust notes", "", &[]));
        }
        docs.push(doc("book", "rust book", "", &[]));
        docs[15].doc_type = "book".to_string();

        let all = keyword_search(&docs, "rust", None, 100);
        assert_eq!(all.len(), MAX_SEARCH_RESULTS);

        let books = keyword_search(&docs, "rust", Some("book"), 100);
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].doc.slug, "book");
    }

    #[test]
    fn empty_query_finds_nothing() {
        let docs = vec![doc("a", "Rust", "", &[])];
        assert!(keyword_search(&docs, "the of and", None, 5).is_empty());
    }

    #[test]
    fn hybrid_merge_matches_by_slug() {
        let keyword = vec![KeywordResult {
            slug: "a".to_string(),
            title: "A".to_string(),
            score: 5.0,
        }];
        let semantic = vec![
            SimilarNote {
                slug: "a".to_string(),
                title: "A".to_string(),
                doc_type: "note".to_string(),
                score: 0.9,
            },
            SimilarNote {
                slug: "b".to_string(),
                title: "B".to_string(),
                doc_type: "note".to_string(),
                score: 0.8,
            },
        ];

        let merged = merge_search_results(&keyword, &semantic);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].slug, "a");
        assert!((merged[0].hybrid_score - (5.0 * 0.4 + 0.9 * 0.6)).abs() < 1e-6);
        assert_eq!(merged[1].slug, "b");
        assert_eq!(merged[1].keyword_score, 0.0);
    }

    #[test]
    fn hybrid_merge_sorts_descending() {
        let semantic = vec![
            SimilarNote {
                slug: "low".to_string(),
                title: "Low".to_string(),
                doc_type: "note".to_string(),
                score: 0.1,
            },
            SimilarNote {
                slug: "high".to_string(),
                title: "High".to_string(),
                doc_type: "note".to_string(),
                score: 0.95,
            },
        ];
        let merged = merge_search_results(&[], &semantic);
        assert_eq!(merged[0].slug, "high");
    }
}
