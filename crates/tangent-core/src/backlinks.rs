use crate::document::Document;
use crate::link_parser::extract_links;
use serde::Serialize;
use std::collections::BTreeMap;

/// A source document that links to some target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BacklinkEntry {
    pub slug: String,
    pub title: String,
    #[serde(rename = "type")]
    pub doc_type: String,
}

/// Mapping from target slug to the documents that link to it.
///
/// Targets with zero backlinks are absent, never present with an empty
/// list; consumers treat a missing key as "no backlinks". The whole
/// structure is rebuilt from scratch on every call and never persisted.
pub type BacklinksIndex = BTreeMap<String, Vec<BacklinkEntry>>;

/// Add backlink entries contributed by a single source document.
fn add_backlinks_for_document(doc: &Document, index: &mut BacklinksIndex) {
    // extract_links de-duplicates per document, so a source contributes at
    // most one entry per distinct target.
    for target in extract_links(&doc.body) {
        if target == doc.slug {
            continue;
        }
        index.entry(target).or_default().push(BacklinkEntry {
            slug: doc.slug.clone(),
            title: doc.title.clone(),
            doc_type: doc.doc_type.clone(),
        });
    }
}

/// Build the complete backlinks index for a document collection.
///
/// Pure function of its input; iteration order of `documents` fixes the
/// entry order within each target's list.
pub fn build_backlinks_index(documents: &[Document]) -> BacklinksIndex {
    let mut index = BacklinksIndex::new();
    for doc in documents {
        add_backlinks_for_document(doc, &mut index);
    }
    tracing::debug!(
        documents = documents.len(),
        targets = index.len(),
        "built backlinks index"
    );
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(slug: &str, body: &str) -> Document {
        Document::new(slug, &slug.to_uppercase(), "note", body)
    }

    #[test]
    fn simple_backlink() {
        let docs = vec![doc("a", "see [[b]]"), doc("b", "no links")];
        let index = build_backlinks_index(&docs);

        let entries = index.get("b").expect("b should have backlinks");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].slug, "a");
        assert_eq!(entries[0].title, "A");
        assert_eq!(entries[0].doc_type, "note");
        // "a" is never linked to, so it must be absent entirely
        assert!(!index.contains_key("a"));
    }

    #[test]
    fn self_references_are_dropped() {
        let docs = vec![doc("a", "[[a]] self link")];
        let index = build_backlinks_index(&docs);
        assert!(index.is_empty());
    }

    #[test]
    fn duplicate_links_collapse_to_one_entry() {
        let docs = vec![doc("a", "[[b]] and again [[b]] and [[B]]")];
        let index = build_backlinks_index(&docs);
        assert_eq!(index.get("b").map(Vec::len), Some(1));
    }

    #[test]
    fn normalized_targets_share_a_key() {
        let docs = vec![doc("a", "[[Foo Bar]]"), doc("c", "[[foo-bar|Custom Text]]")];
        let index = build_backlinks_index(&docs);

        let entries = index.get("foo-bar").expect("foo-bar key");
        let sources: Vec<&str> = entries.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(sources, vec!["a", "c"]);
        // Display text never leaks into the index
        let json = serde_json::to_string(&index).unwrap();
        assert!(!json.contains("Custom Text"));
    }

    #[test]
    fn unreferenced_slugs_are_absent_not_empty() {
        let docs = vec![doc("a", "see [[b]]"), doc("b", ""), doc("c", "")];
        let index = build_backlinks_index(&docs);
        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let docs = vec![
            doc("a", "[[b]] [[c]]"),
            doc("b", "[[c]]"),
            doc("c", "[[a]]"),
        ];
        let first = build_backlinks_index(&docs);
        let second = build_backlinks_index(&docs);
        assert_eq!(first, second);
    }

    #[test]
    fn targets_without_a_document_still_get_entries() {
        // The index records references, not resolutions; a link to a slug
        // that does not exist as a document still shows up under that key.
        let docs = vec![doc("a", "[[ghost]]")];
        let index = build_backlinks_index(&docs);
        assert!(index.contains_key("ghost"));
    }

    #[test]
    fn serializes_to_the_wire_shape() {
        let docs = vec![doc("a", "see [[b]]")];
        let index = build_backlinks_index(&docs);
        let json = serde_json::to_value(&index).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "b": [{"slug": "a", "title": "A", "type": "note"}]
            })
        );
    }
}
