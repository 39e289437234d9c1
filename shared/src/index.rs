//! Flat exact nearest-neighbor index over the policy corpus.

use std::sync::Arc;

use crate::embedding::Embedder;
use crate::models::PolicyDocument;
use crate::{Error, Result};

/// A retrieved document with its distance to the query.
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub document: &'a PolicyDocument,
    /// Position of the document in the corpus.
    pub position: usize,
    /// Squared Euclidean distance to the query vector.
    pub distance: f32,
}

/// Read-only semantic index, built once and shared by `Arc`.
pub struct PolicyIndex {
    documents: Vec<PolicyDocument>,
    /// Row-major vectors, `dimension` floats per document.
    vectors: Vec<f32>,
    dimension: usize,
    embedder: Arc<dyn Embedder>,
}

impl PolicyIndex {
    /// Embed every document's `title + " " + description` and index it.
    pub async fn build(documents: Vec<PolicyDocument>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let dimension = embedder.dimension();
        let mut vectors = Vec::with_capacity(documents.len() * dimension);

        for document in &documents {
            let vector = embedder.embed(&document.search_text()).await?;
            check_dimension(dimension, &vector)?;
            vectors.extend_from_slice(&vector);
        }

        Ok(Self {
            documents,
            vectors,
            dimension,
            embedder,
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Encode `query` and return the `k` nearest documents, best first.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit<'_>>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed(query).await?;
        self.search_vector(&vector, k)
    }

    /// Exact k-nearest search by ascending squared distance.
    ///
    /// Returns `min(k, len)` hits. Equal distances keep corpus order.
    pub fn search_vector(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit<'_>>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        check_dimension(self.dimension, query)?;

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimension)
            .map(|row| squared_l2(row, query))
            .enumerate()
            .collect();
        // Stable sort, so ties stay in insertion order.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, distance)| SearchHit {
                document: &self.documents[position],
                position,
                distance,
            })
            .collect())
    }
}

fn check_dimension(expected: usize, vector: &[f32]) -> Result<()> {
    if vector.len() != expected {
        return Err(Error::Embedding(format!(
            "Embedding dim mismatch: expected {}, got {}",
            expected,
            vector.len()
        )));
    }
    Ok(())
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
