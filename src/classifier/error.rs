use std::io;

/// Represents the different types of errors that can occur in the classifier.
///
/// All variants are local, recoverable conditions. In particular `NotFound`
/// from a load is a benign signal at the workflow level (no prior model on
/// disk), and `EmptyClassifier` tells the caller to fall back to a non-KNN
/// prediction strategy.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// Embedding length disagrees with the established dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// Prediction requested before any example was added or loaded
    #[error("Classifier has no examples; fall back to another prediction strategy")]
    EmptyClassifier,
    /// Persisted payload failed structural validation
    #[error("Corrupt classifier data: {0}")]
    CorruptData(String),
    /// Load source does not exist
    #[error("Classifier file not found: {0}")]
    NotFound(String),
    /// Any call made after `dispose()`
    #[error("Classifier used after dispose")]
    UseAfterDispose,
    /// Invalid input parameter (empty embedding, k == 0, unknown label text)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Error raised by an external feature extractor or image source
    #[error("Extractor error: {0}")]
    Extractor(String),
    /// I/O failure while saving or loading
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
