use crate::document::Document;
use crate::graph::{GraphData, GraphNode};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

/// Number of hub notes reported in the connection stats.
const MAX_HUBS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorCount {
    pub author: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthCount {
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityStats {
    pub with_summary: usize,
    pub with_body: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStats {
    pub total_edges: usize,
    pub avg_per_note: f64,
    pub orphan_count: usize,
    pub orphan_percent: f64,
    pub hubs: Vec<GraphNode>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsData {
    pub total: usize,
    pub by_type: Vec<TypeCount>,
    pub by_tag: Vec<TagCount>,
    pub by_author: Vec<AuthorCount>,
    pub by_month: Vec<MonthCount>,
    pub quality: QualityStats,
    pub connections: ConnectionStats,
    pub this_week: usize,
}

fn sorted_counts(counts: HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    // Descending by count, name as tiebreak for stable output
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}

fn aggregate_by_type(documents: &[Document]) -> Vec<TypeCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for doc in documents {
        *counts.entry(doc.doc_type.clone()).or_default() += 1;
    }
    sorted_counts(counts)
        .into_iter()
        .map(|(doc_type, count)| TypeCount { doc_type, count })
        .collect()
}

fn aggregate_by_tag(documents: &[Document]) -> Vec<TagCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for doc in documents {
        for tag in &doc.tags {
            *counts.entry(tag.clone()).or_default() += 1;
        }
    }
    sorted_counts(counts)
        .into_iter()
        .map(|(tag, count)| TagCount { tag, count })
        .collect()
}

fn aggregate_by_author(documents: &[Document]) -> Vec<AuthorCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for doc in documents {
        for author in &doc.authors {
            *counts.entry(author.clone()).or_default() += 1;
        }
    }
    sorted_counts(counts)
        .into_iter()
        .map(|(author, count)| AuthorCount { author, count })
        .collect()
}

fn aggregate_by_month(documents: &[Document]) -> Vec<MonthCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for doc in documents {
        if let Some(date) = &doc.date {
            if date.len() >= 7 {
                *counts.entry(date[..7].to_string()).or_default() += 1;
            }
        }
    }
    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
        .into_iter()
        .map(|(month, count)| MonthCount { month, count })
        .collect()
}

fn count_this_week(documents: &[Document], today: NaiveDate) -> usize {
    let Some(week_ago) = today.checked_sub_days(Days::new(7)) else {
        return 0;
    };
    let cutoff = week_ago.format("%Y-%m-%d").to_string();
    documents
        .iter()
        .filter(|doc| doc.date.as_deref().is_some_and(|d| d >= cutoff.as_str()))
        .count()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn connection_stats(graph: &GraphData) -> ConnectionStats {
    let orphan_count = graph.nodes.iter().filter(|n| n.connections == 0).count();
    let orphan_percent = if graph.nodes.is_empty() {
        0.0
    } else {
        round1(orphan_count as f64 / graph.nodes.len() as f64 * 100.0)
    };
    let avg_per_note = if graph.nodes.is_empty() {
        0.0
    } else {
        round1(graph.edges.len() as f64 / graph.nodes.len() as f64)
    };

    let mut hubs: Vec<GraphNode> = graph
        .nodes
        .iter()
        .filter(|n| n.connections > 0)
        .cloned()
        .collect();
    hubs.sort_by(|a, b| b.connections.cmp(&a.connections));
    hubs.truncate(MAX_HUBS);

    ConnectionStats {
        total_edges: graph.edges.len(),
        avg_per_note,
        orphan_count,
        orphan_percent,
        hubs,
    }
}

/// Aggregate corpus statistics. `today` is injected so the seven-day
/// window is deterministic under test.
pub fn build_stats(documents: &[Document], graph: &GraphData, today: NaiveDate) -> StatsData {
    StatsData {
        total: documents.len(),
        by_type: aggregate_by_type(documents),
        by_tag: aggregate_by_tag(documents),
        by_author: aggregate_by_author(documents),
        by_month: aggregate_by_month(documents),
        quality: QualityStats {
            with_summary: documents.iter().filter(|d| d.has_summary()).count(),
            with_body: documents.iter().filter(|d| d.has_body()).count(),
            total: documents.len(),
        },
        connections: connection_stats(graph),
        this_week: count_this_week(documents, today),
    }
}
