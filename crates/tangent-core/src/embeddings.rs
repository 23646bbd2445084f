use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use thiserror::Error;

/// One note's precomputed embedding, as written by the out-of-process
/// generation script.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingEntry {
    pub vector: Vec<f32>,
    pub title: String,
    #[serde(rename = "type")]
    pub doc_type: String,
}

/// The `embeddings.json` payload: a versioned map of slug to vector.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsData {
    pub version: String,
    pub model: String,
    pub embeddings: HashMap<String, EmbeddingEntry>,
}

#[derive(Debug, Error)]
pub enum EmbeddingsError {
    #[error("failed to parse embeddings file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("embedding for '{slug}' is empty")]
    EmptyVector { slug: String },
    #[error("vector length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}

/// A semantically similar note with its similarity score.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarNote {
    pub slug: String,
    pub title: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub score: f32,
}

/// Dot product of two vectors. Vectors in the embeddings file are
/// pre-normalized, so this equals cosine similarity for them.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32, EmbeddingsError> {
    if a.len() != b.len() {
        return Err(EmbeddingsError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

/// Cosine similarity for vectors of unknown magnitude. Zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, EmbeddingsError> {
    let dot = dot_product(a, b)?;
    let mag_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (mag_a * mag_b))
}

/// Parse and validate an embeddings file. Every vector must be non-empty
/// and the same length.
pub fn parse_embeddings(json: &str) -> Result<EmbeddingsData, EmbeddingsError> {
    let data: EmbeddingsData = serde_json::from_str(json)?;

    let mut expected_len: Option<usize> = None;
    for (slug, entry) in &data.embeddings {
        if entry.vector.is_empty() {
            return Err(EmbeddingsError::EmptyVector { slug: slug.clone() });
        }
        match expected_len {
            None => expected_len = Some(entry.vector.len()),
            Some(len) if len != entry.vector.len() => {
                return Err(EmbeddingsError::LengthMismatch {
                    left: len,
                    right: entry.vector.len(),
                });
            }
            Some(_) => {}
        }
    }

    tracing::info!(
        notes = data.embeddings.len(),
        model = %data.model,
        "loaded embeddings"
    );
    Ok(data)
}

impl EmbeddingsData {
    pub fn entry(&self, slug: &str) -> Option<&EmbeddingEntry> {
        self.embeddings.get(slug)
    }

    /// Rank all embedded notes against an arbitrary query vector.
    pub fn rank_by_vector(&self, query: &[f32], top_n: usize) -> Vec<SimilarNote> {
        let mut results: Vec<SimilarNote> = self
            .embeddings
            .iter()
            .filter_map(|(slug, entry)| match dot_product(query, &entry.vector) {
                Ok(score) => Some(SimilarNote {
                    slug: slug.clone(),
                    title: entry.title.clone(),
                    doc_type: entry.doc_type.clone(),
                    score,
                }),
                Err(e) => {
                    tracing::warn!(slug = %slug, error = %e, "skipping embedding");
                    None
                }
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        results.truncate(top_n);
        results
    }

    /// Most similar notes to a given slug, excluding the note itself.
    /// Returns an empty list when the slug has no embedding.
    pub fn find_similar(&self, slug: &str, top_n: usize) -> Vec<SimilarNote> {
        let Some(source) = self.embeddings.get(slug) else {
            return Vec::new();
        };

        let mut results = self.rank_by_vector(&source.vector, top_n + 1);
        results.retain(|r| r.slug != slug);
        results.truncate(top_n);
        results
    }
}
