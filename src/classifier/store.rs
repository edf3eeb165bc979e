use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;

/// Append-only collection of embeddings for a single class label.
///
/// Every embedding in the store has the same dimension, fixed at creation.
/// Insertion order is preserved (useful for deterministic tests and exact
/// persistence round-trips), though nearest-neighbor scoring itself is
/// order-insensitive. Duplicates are permitted and meaningful: repeated
/// examples strengthen a label's density.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingStore {
    dim: usize,
    vectors: Vec<Array1<f32>>,
}

/// Serialized form of an [`EmbeddingStore`].
///
/// Self-describing: the embedding count and dimension are recorded
/// explicitly, never inferred from the payload length. `values` holds
/// `count * dim` floats in embedding-major (row-major) order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorePayload {
    pub dim: usize,
    pub count: usize,
    pub values: Vec<f32>,
}

impl EmbeddingStore {
    /// Creates an empty store for embeddings of the given dimension.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            vectors: Vec::new(),
        }
    }

    /// The embedding dimension all entries must match.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored embeddings.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Appends an embedding to the store.
    ///
    /// Fails with `DimensionMismatch` if the length disagrees with the
    /// store's dimension; a failed append leaves the store untouched.
    pub fn append(&mut self, embedding: Array1<f32>) -> Result<(), ClassifierError> {
        if embedding.len() != self.dim {
            return Err(ClassifierError::DimensionMismatch {
                expected: self.dim,
                actual: embedding.len(),
            });
        }
        self.vectors.push(embedding);
        Ok(())
    }

    /// Read-only view of all embeddings, in insertion order.
    pub fn vectors(&self) -> &[Array1<f32>] {
        &self.vectors
    }

    /// Flattens the store into its serialized payload form.
    pub fn to_payload(&self) -> StorePayload {
        let mut values = Vec::with_capacity(self.vectors.len() * self.dim);
        for vector in &self.vectors {
            values.extend(vector.iter().copied());
        }
        StorePayload {
            dim: self.dim,
            count: self.vectors.len(),
            values,
        }
    }

    /// Rebuilds a store from its payload, validating the recorded shape.
    ///
    /// Fails with `CorruptData` if `count * dim` does not match the number
    /// of values, or if a non-empty payload claims a zero dimension.
    pub fn from_payload(payload: StorePayload) -> Result<Self, ClassifierError> {
        if payload.count > 0 && payload.dim == 0 {
            return Err(ClassifierError::CorruptData(
                "store payload has embeddings but zero dimension".to_string(),
            ));
        }
        let expected = payload
            .count
            .checked_mul(payload.dim)
            .ok_or_else(|| ClassifierError::CorruptData("store payload shape overflows".to_string()))?;
        if payload.values.len() != expected {
            return Err(ClassifierError::CorruptData(format!(
                "store payload has {} values, expected {} ({} x {})",
                payload.values.len(),
                expected,
                payload.count,
                payload.dim
            )));
        }

        let vectors = payload
            .values
            .chunks(payload.dim.max(1))
            .take(payload.count)
            .map(|row| Array1::from_vec(row.to_vec()))
            .collect();

        Ok(Self {
            dim: payload.dim,
            vectors,
        })
    }

    /// Serializes the store to a self-describing byte payload.
    pub fn serialize(&self) -> Result<Vec<u8>, ClassifierError> {
        serde_json::to_vec(&self.to_payload())
            .map_err(|e| ClassifierError::CorruptData(format!("failed to encode store: {}", e)))
    }

    /// Deserializes a store from bytes produced by [`serialize`](Self::serialize).
    pub fn deserialize(bytes: &[u8]) -> Result<Self, ClassifierError> {
        let payload: StorePayload = serde_json::from_slice(bytes)
            .map_err(|e| ClassifierError::CorruptData(format!("failed to decode store: {}", e)))?;
        Self::from_payload(payload)
    }
}
