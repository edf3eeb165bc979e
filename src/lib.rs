//! An incrementally trained k-nearest-neighbor image classifier over
//! embeddings, with durable persistence.
//!
//! A [`KnnClassifier`] holds one append-only [`EmbeddingStore`] per class
//! label. Embeddings come from an external [`FeatureExtractor`] (any model
//! that maps an image to a fixed-length vector); the classifier itself only
//! stores vectors, votes among the k nearest on prediction, and saves and
//! reloads its full state as a versioned, self-describing snapshot.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use ndarray::array;
//! use occipital::KnnClassifier;
//!
//! let mut classifier = KnnClassifier::new();
//! classifier.add_example("car", array![1.0, 0.0, 0.0, 0.0])?;
//! classifier.add_example("car", array![1.0, 0.0, 1.0, 0.0])?;
//! classifier.add_example("bike", array![0.0, 1.0, 0.0, 0.0])?;
//!
//! let prediction = classifier.predict(&array![1.0, 0.0, 0.0, 0.0], 3)?;
//! println!("Predicted class: {} ({:.0}%)", prediction.label, prediction.confidence * 100.0);
//! assert_eq!(prediction.label, "car");
//! # Ok(())
//! # }
//! ```
//!
//! # Persistence
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use ndarray::array;
//! use occipital::{ClassifierError, KnnClassifier};
//!
//! let path = std::env::temp_dir().join("occipital-doc-model.json");
//! let mut classifier = KnnClassifier::new();
//! classifier.add_example("truck", array![0.5, 0.5])?;
//! classifier.save(&path)?;
//!
//! // A missing prior model is benign: start fresh on NotFound.
//! let restored = match KnnClassifier::load(&path) {
//!     Ok(classifier) => classifier,
//!     Err(ClassifierError::NotFound(_)) => KnnClassifier::new(),
//!     Err(e) => return Err(e.into()),
//! };
//! assert_eq!(restored.class_count()?, 1);
//! # std::fs::remove_file(&path).ok();
//! # Ok(())
//! # }
//! ```
//!
//! # Single-writer discipline
//!
//! The classifier is designed for sequential access: `predict` and
//! `class_count` take `&self` and may run concurrently with each other, but
//! callers must not interleave them with `add_example`, `save`, `load_from`
//! or `dispose` without external synchronization.

pub mod classifier;
pub mod labels;

pub use classifier::{
    ClassifierError, ClassifierInfo, EmbeddingStore, FeatureExtractor, ImageSource, KnnClassifier,
    Prediction, StorePayload,
};
pub use labels::VehicleClass;

pub fn init_logger() {
    env_logger::init();
}
