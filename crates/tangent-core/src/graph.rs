use crate::document::Document;
use crate::link_parser::extract_links;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Cap on second-degree nodes in the ego graph, to keep the picture legible.
pub const MAX_LEVEL2_NODES: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Total degree: outgoing resolved links plus incoming backlinks.
    pub connections: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

/// Whole-corpus graph: one node per document, one edge per distinct
/// resolved (source, target) link.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Build the full knowledge graph. Edges only target slugs that exist in
/// the corpus; self-references are excluded.
pub fn build_graph(documents: &[Document]) -> GraphData {
    let existing: HashSet<&str> = documents.iter().map(|d| d.slug.as_str()).collect();

    let mut edges = Vec::new();
    let mut degree: HashMap<String, usize> = HashMap::new();

    for doc in documents {
        for target in extract_links(&doc.body) {
            if target == doc.slug || !existing.contains(target.as_str()) {
                continue;
            }
            *degree.entry(doc.slug.clone()).or_default() += 1;
            *degree.entry(target.clone()).or_default() += 1;
            edges.push(GraphEdge {
                source: doc.slug.clone(),
                target,
            });
        }
    }

    let nodes = documents
        .iter()
        .map(|doc| GraphNode {
            id: doc.slug.clone(),
            title: doc.title.clone(),
            doc_type: doc.doc_type.clone(),
            connections: degree.get(&doc.slug).copied().unwrap_or(0),
        })
        .collect();

    GraphData { nodes, edges }
}

// ---------------------------------------------------------------------------
// Note-centric ego graph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct NoteGraphNode {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(rename = "isCenter", skip_serializing_if = "Option::is_none")]
    pub is_center: Option<bool>,
    /// 0 = center, 1 = direct connection, 2 = second degree.
    pub level: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteGraphEdge {
    pub source: String,
    pub target: String,
    /// 1 = center <-> L1, 2 = L1 <-> L2.
    pub level: u8,
}

/// Two-level neighborhood of a single note.
#[derive(Debug, Clone, Serialize)]
pub struct NoteGraph {
    pub center: NoteGraphNode,
    pub connected: Vec<NoteGraphNode>,
    pub edges: Vec<NoteGraphEdge>,
}

/// Reverse index: target slug -> source slugs linking to it.
fn build_backlink_map(documents: &[Document]) -> HashMap<String, Vec<String>> {
    let mut index: HashMap<String, Vec<String>> = HashMap::new();
    for doc in documents {
        for target in extract_links(&doc.body) {
            index.entry(target).or_default().push(doc.slug.clone());
        }
    }
    index
}

/// Forward index: source slug -> distinct outgoing targets.
fn build_outgoing_map(documents: &[Document]) -> HashMap<String, Vec<String>> {
    documents
        .iter()
        .map(|doc| (doc.slug.clone(), extract_links(&doc.body)))
        .collect()
}

fn is_valid_l2_slug(
    slug: &str,
    center_slug: &str,
    l1_slug: &str,
    level1: &HashSet<&str>,
    existing: &HashSet<&str>,
) -> bool {
    slug != center_slug && slug != l1_slug && !level1.contains(slug) && existing.contains(slug)
}

/// Build the ego graph around `center_slug`. Returns `None` when the slug
/// does not name a document in the corpus.
pub fn build_note_graph(documents: &[Document], center_slug: &str) -> Option<NoteGraph> {
    let center_doc = documents.iter().find(|d| d.slug == center_slug)?;
    let existing: HashSet<&str> = documents.iter().map(|d| d.slug.as_str()).collect();

    let outgoing: Vec<String> = extract_links(&center_doc.body)
        .into_iter()
        .filter(|s| s != center_slug)
        .collect();

    let backlink_map = build_backlink_map(documents);
    let outgoing_map = build_outgoing_map(documents);

    let backlinks: Vec<&String> = backlink_map
        .get(center_slug)
        .map(|sources| sources.iter().filter(|s| *s != center_slug).collect())
        .unwrap_or_default();

    // Level 1: distinct union of outgoing targets and backlink sources
    let mut level1_slugs: Vec<&str> = Vec::new();
    let mut level1_set: HashSet<&str> = HashSet::new();
    for slug in outgoing.iter().map(String::as_str).chain(backlinks.iter().map(|s| s.as_str())) {
        if level1_set.insert(slug) {
            level1_slugs.push(slug);
        }
    }

    let mut connected: Vec<NoteGraphNode> = Vec::new();
    let mut edges: Vec<NoteGraphEdge> = Vec::new();

    for doc in documents {
        if level1_set.contains(doc.slug.as_str()) {
            connected.push(NoteGraphNode {
                id: doc.slug.clone(),
                title: doc.title.clone(),
                doc_type: doc.doc_type.clone(),
                is_center: None,
                level: 1,
            });
        }
    }

    for target in &outgoing {
        if existing.contains(target.as_str()) {
            edges.push(NoteGraphEdge {
                source: center_slug.to_string(),
                target: target.clone(),
                level: 1,
            });
        }
    }
    for source in &backlinks {
        edges.push(NoteGraphEdge {
            source: (*source).clone(),
            target: center_slug.to_string(),
            level: 1,
        });
    }

    // Level 2: neighbors of level-1 nodes, capped
    let mut level2_slugs: Vec<&str> = Vec::new();
    let mut level2_set: HashSet<&str> = HashSet::new();
    let mut level2_edges: Vec<NoteGraphEdge> = Vec::new();

    for l1 in &level1_slugs {
        for target in outgoing_map.get(*l1).map(Vec::as_slice).unwrap_or_default() {
            if is_valid_l2_slug(target, center_slug, l1, &level1_set, &existing) {
                if level2_set.insert(target) {
                    level2_slugs.push(target);
                }
                level2_edges.push(NoteGraphEdge {
                    source: (*l1).to_string(),
                    target: target.clone(),
                    level: 2,
                });
            }
        }
        for source in backlink_map.get(*l1).map(Vec::as_slice).unwrap_or_default() {
            if is_valid_l2_slug(source, center_slug, l1, &level1_set, &existing) {
                if level2_set.insert(source) {
                    level2_slugs.push(source);
                }
                level2_edges.push(NoteGraphEdge {
                    source: source.clone(),
                    target: (*l1).to_string(),
                    level: 2,
                });
            }
        }
    }

    let capped: HashSet<&str> = level2_slugs.iter().take(MAX_LEVEL2_NODES).copied().collect();
    for edge in level2_edges {
        if capped.contains(edge.source.as_str()) || capped.contains(edge.target.as_str()) {
            edges.push(edge);
        }
    }

    for doc in documents {
        if capped.contains(doc.slug.as_str()) {
            connected.push(NoteGraphNode {
                id: doc.slug.clone(),
                title: doc.title.clone(),
                doc_type: doc.doc_type.clone(),
                is_center: None,
                level: 2,
            });
        }
    }

    Some(NoteGraph {
        center: NoteGraphNode {
            id: center_slug.to_string(),
            title: center_doc.title.clone(),
            doc_type: center_doc.doc_type.clone(),
            is_center: Some(true),
            level: 0,
        },
        connected,
        edges,
    })
}
