mod error;
mod extractor;
mod knn;
mod store;
mod utils;

pub use error::ClassifierError;
pub use extractor::{FeatureExtractor, ImageSource};
pub use knn::{KnnClassifier, Prediction};
pub use store::{EmbeddingStore, StorePayload};

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Number of classes with at least one example
    pub num_classes: usize,
    /// Labels of those classes, in sorted order
    pub class_labels: Vec<String>,
    /// Embedding dimension, once established by an example or a load
    pub embedding_dim: Option<usize>,
    /// Total number of stored examples
    pub num_examples: usize,
}
