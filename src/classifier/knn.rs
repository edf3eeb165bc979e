use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use log::{debug, info};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::store::{EmbeddingStore, StorePayload};
use super::utils::squared_euclidean;
use super::ClassifierInfo;

/// Version tag written into every persisted snapshot.
const SCHEMA_VERSION: u32 = 1;

/// Result of a nearest-neighbor prediction.
#[derive(Debug, Clone)]
pub struct Prediction {
    /// The winning class label
    pub label: String,
    /// Confidence of the winning label, in [0, 1]
    pub confidence: f64,
    /// Confidence per label for every label that received at least one vote.
    /// Values sum to 1.0 across the map.
    pub scores: HashMap<String, f64>,
}

/// On-disk form of a whole classifier: schema version, embedding dimension
/// and one store payload per label, in label order.
#[derive(Debug, Serialize, Deserialize)]
struct ClassifierSnapshot {
    schema_version: u32,
    dim: Option<usize>,
    classes: Vec<ClassRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClassRecord {
    label: String,
    store: StorePayload,
}

/// An incrementally trained k-nearest-neighbor classifier over embeddings.
///
/// The classifier owns one [`EmbeddingStore`] per class label. Examples are
/// added one at a time, predictions vote among the k nearest stored
/// embeddings across all labels jointly, and the full state can be saved to
/// and reloaded from disk.
///
/// The embedding dimension is established by the first example ever added
/// (or by a successful load) and enforced from then on.
///
/// # Concurrency
///
/// Designed for single-writer use: callers must not interleave
/// `add_example`/`save`/`load_from` with other calls on the same instance
/// from multiple threads without external synchronization. Read-only calls
/// (`predict`, `class_count`, `info`) may run concurrently with each other.
///
/// # Example
///
/// ```rust
/// use ndarray::array;
/// use occipital::KnnClassifier;
///
/// # fn main() -> Result<(), occipital::ClassifierError> {
/// let mut classifier = KnnClassifier::new();
/// classifier.add_example("car", array![1.0, 0.0, 0.0, 0.0])?;
/// classifier.add_example("car", array![1.0, 0.0, 1.0, 0.0])?;
/// classifier.add_example("bike", array![0.0, 1.0, 0.0, 0.0])?;
///
/// let prediction = classifier.predict(&array![1.0, 0.0, 0.0, 0.0], 3)?;
/// assert_eq!(prediction.label, "car");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct KnnClassifier {
    stores: BTreeMap<String, EmbeddingStore>,
    dim: Option<usize>,
    disposed: bool,
}

impl KnnClassifier {
    /// Creates an empty classifier. The embedding dimension is fixed by the
    /// first example added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a classifier from a snapshot file written by [`save`](Self::save).
    ///
    /// # Errors
    /// * `NotFound` if the path does not exist; callers typically treat
    ///   this as "no prior model" and start fresh
    /// * `CorruptData` if the snapshot fails structural validation
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let mut classifier = Self::new();
        classifier.load_from(path)?;
        Ok(classifier)
    }

    fn ensure_live(&self) -> Result<(), ClassifierError> {
        if self.disposed {
            return Err(ClassifierError::UseAfterDispose);
        }
        Ok(())
    }

    /// The established embedding dimension, if any example has been added
    /// or loaded yet.
    pub fn dim(&self) -> Result<Option<usize>, ClassifierError> {
        self.ensure_live()?;
        Ok(self.dim)
    }

    /// Number of distinct labels with at least one example.
    ///
    /// Callers are expected to branch on `class_count() == 0` and fall back
    /// to a different prediction strategy when the classifier is empty.
    pub fn class_count(&self) -> Result<usize, ClassifierError> {
        self.ensure_live()?;
        Ok(self.stores.values().filter(|s| !s.is_empty()).count())
    }

    /// Total number of stored examples across all labels.
    pub fn example_count(&self) -> Result<usize, ClassifierError> {
        self.ensure_live()?;
        Ok(self.stores.values().map(EmbeddingStore::len).sum())
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> Result<ClassifierInfo, ClassifierError> {
        self.ensure_live()?;
        Ok(ClassifierInfo {
            num_classes: self.class_count()?,
            class_labels: self
                .stores
                .iter()
                .filter(|(_, s)| !s.is_empty())
                .map(|(label, _)| label.clone())
                .collect(),
            embedding_dim: self.dim,
            num_examples: self.example_count()?,
        })
    }

    /// The store backing one label, if any example with that label exists.
    pub fn store(&self, label: &str) -> Result<Option<&EmbeddingStore>, ClassifierError> {
        self.ensure_live()?;
        Ok(self.stores.get(label))
    }

    /// Adds a labeled example, creating the label's store on first sight.
    ///
    /// The embedding is owned by the classifier afterwards. A failed call
    /// leaves the classifier unchanged.
    ///
    /// # Errors
    /// * `DimensionMismatch` if the embedding length disagrees with the
    ///   dimension established by the first example
    /// * `InvalidArgument` for an empty label or zero-length embedding
    pub fn add_example(
        &mut self,
        label: impl Into<String>,
        embedding: Array1<f32>,
    ) -> Result<(), ClassifierError> {
        self.ensure_live()?;
        let label = label.into();
        if label.is_empty() {
            return Err(ClassifierError::InvalidArgument(
                "class label cannot be empty".to_string(),
            ));
        }
        if embedding.is_empty() {
            return Err(ClassifierError::InvalidArgument(
                "embedding cannot be zero-length".to_string(),
            ));
        }
        let dim = match self.dim {
            Some(dim) => {
                if embedding.len() != dim {
                    return Err(ClassifierError::DimensionMismatch {
                        expected: dim,
                        actual: embedding.len(),
                    });
                }
                dim
            }
            None => embedding.len(),
        };

        self.stores
            .entry(label.clone())
            .or_insert_with(|| EmbeddingStore::new(dim))
            .append(embedding)?;
        self.dim = Some(dim);
        debug!("Added example for class '{}'", label);
        Ok(())
    }

    /// Predicts a class for the query embedding by majority vote among its
    /// k nearest stored neighbors (squared Euclidean distance).
    ///
    /// If fewer than `k` examples exist in total, all of them are used.
    /// Confidence per label is `votes / k_effective`, so confidences sum to
    /// 1.0 over the returned labels. Ties on confidence are broken toward
    /// the label whose closest selected neighbor is nearer, then toward the
    /// lexicographically smaller label, making the result deterministic.
    ///
    /// # Errors
    /// * `EmptyClassifier` if no examples have been added or loaded
    /// * `DimensionMismatch` if the query length disagrees with the
    ///   established dimension
    /// * `InvalidArgument` if `k == 0`
    pub fn predict(&self, query: &Array1<f32>, k: usize) -> Result<Prediction, ClassifierError> {
        self.ensure_live()?;
        if k == 0 {
            return Err(ClassifierError::InvalidArgument(
                "k must be at least 1".to_string(),
            ));
        }
        let total = self.stores.values().map(EmbeddingStore::len).sum::<usize>();
        if total == 0 {
            return Err(ClassifierError::EmptyClassifier);
        }
        // dim is always set once at least one example exists
        let dim = self.dim.unwrap_or_default();
        if query.len() != dim {
            return Err(ClassifierError::DimensionMismatch {
                expected: dim,
                actual: query.len(),
            });
        }

        let mut distances: Vec<(f64, &str)> = Vec::with_capacity(total);
        for (label, store) in &self.stores {
            for stored in store.vectors() {
                distances.push((squared_euclidean(query, stored), label.as_str()));
            }
        }
        distances.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        let k_effective = k.min(total);
        // Vote count and closest selected neighbor per label, in label order.
        let mut votes: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
        for &(distance, label) in &distances[..k_effective] {
            let entry = votes.entry(label).or_insert((0, distance));
            entry.0 += 1;
            if distance < entry.1 {
                entry.1 = distance;
            }
        }

        let mut best: Option<(&str, usize, f64)> = None;
        for (&label, &(count, nearest)) in &votes {
            let better = match best {
                None => true,
                Some((_, best_count, best_nearest)) => {
                    count > best_count || (count == best_count && nearest < best_nearest)
                }
            };
            if better {
                best = Some((label, count, nearest));
            }
        }
        // votes is non-empty because k_effective >= 1
        let (label, count, _) = best.expect("at least one neighbor was selected");

        let scores: HashMap<String, f64> = votes
            .iter()
            .map(|(&l, &(c, _))| (l.to_string(), c as f64 / k_effective as f64))
            .collect();

        Ok(Prediction {
            label: label.to_string(),
            confidence: count as f64 / k_effective as f64,
            scores,
        })
    }

    /// Saves the full classifier state to `path`.
    ///
    /// The snapshot is written to a sibling temporary file and renamed into
    /// place, so a crash mid-write never leaves a load-breaking half-written
    /// file behind. Parent directories are created as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ClassifierError> {
        self.ensure_live()?;
        let path = path.as_ref();

        let snapshot = ClassifierSnapshot {
            schema_version: SCHEMA_VERSION,
            dim: self.dim,
            classes: self
                .stores
                .iter()
                .map(|(label, store)| ClassRecord {
                    label: label.clone(),
                    store: store.to_payload(),
                })
                .collect(),
        };
        let bytes = serde_json::to_vec(&snapshot)
            .map_err(|e| ClassifierError::CorruptData(format!("failed to encode snapshot: {}", e)))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp_path = match path.file_name() {
            Some(name) => {
                let mut tmp = name.to_os_string();
                tmp.push(".tmp");
                path.with_file_name(tmp)
            }
            None => {
                return Err(ClassifierError::InvalidArgument(format!(
                    "save path has no file name: {}",
                    path.display()
                )))
            }
        };
        fs::write(&tmp_path, &bytes)?;
        fs::rename(&tmp_path, path)?;

        info!(
            "Saved classifier ({} classes, {} examples) to {:?}",
            self.class_count()?,
            self.example_count()?,
            path
        );
        Ok(())
    }

    /// Loads a snapshot from `path`, fully replacing any prior in-memory
    /// state. Valid from any non-disposed state.
    ///
    /// # Errors
    /// * `NotFound` if the path does not exist
    /// * `CorruptData` if the snapshot fails structural validation
    pub fn load_from<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ClassifierError> {
        self.ensure_live()?;
        let path = path.as_ref();
        if !path.exists() {
            return Err(ClassifierError::NotFound(path.display().to_string()));
        }

        let bytes = fs::read(path)?;
        let snapshot: ClassifierSnapshot = serde_json::from_slice(&bytes)
            .map_err(|e| ClassifierError::CorruptData(format!("failed to decode snapshot: {}", e)))?;

        if snapshot.schema_version != SCHEMA_VERSION {
            return Err(ClassifierError::CorruptData(format!(
                "unsupported snapshot schema version {}",
                snapshot.schema_version
            )));
        }

        let mut stores = BTreeMap::new();
        for record in snapshot.classes {
            if record.store.dim != snapshot.dim.unwrap_or(record.store.dim) {
                return Err(ClassifierError::CorruptData(format!(
                    "store for class '{}' has dimension {}, snapshot declares {:?}",
                    record.label, record.store.dim, snapshot.dim
                )));
            }
            let store = EmbeddingStore::from_payload(record.store)?;
            if stores.insert(record.label.clone(), store).is_some() {
                return Err(ClassifierError::CorruptData(format!(
                    "duplicate class label '{}' in snapshot",
                    record.label
                )));
            }
        }

        if snapshot.dim.is_none() && stores.values().any(|s: &EmbeddingStore| !s.is_empty()) {
            return Err(ClassifierError::CorruptData(
                "snapshot has examples but no declared dimension".to_string(),
            ));
        }

        self.stores = stores;
        self.dim = snapshot.dim;
        info!(
            "Loaded classifier ({} classes, {} examples) from {:?}",
            self.class_count()?,
            self.example_count()?,
            path
        );
        Ok(())
    }

    /// Clears all examples and forgets the established dimension, returning
    /// the classifier to its empty state. The only shrinking operation.
    pub fn reset(&mut self) -> Result<(), ClassifierError> {
        self.ensure_live()?;
        self.stores.clear();
        self.dim = None;
        Ok(())
    }

    /// Releases all embedding buffers. Terminal: every later call on this
    /// instance fails with `UseAfterDispose`.
    pub fn dispose(&mut self) {
        self.stores.clear();
        self.dim = None;
        self.disposed = true;
    }
}
