use ndarray::Array1;

use super::error::ClassifierError;

/// Maps an encoded image to a fixed-length feature embedding.
///
/// The classifier treats the extractor as an opaque capability: any model
/// that turns image bytes into a vector of a fixed dimension works. The
/// dimension must stay constant for the lifetime of a classifier instance,
/// since it fixes the dimension of everything stored.
pub trait FeatureExtractor {
    /// Dimension of every embedding this extractor produces.
    fn embedding_dim(&self) -> usize;

    /// Produces the embedding for one image.
    ///
    /// # Errors
    /// `Extractor` if the image cannot be embedded.
    fn embed(&self, image: &[u8]) -> Result<Array1<f32>, ClassifierError>;
}

/// An enumerable collection of labeled images used for training and testing.
///
/// Enumeration is finite and restartable: calling `labeled_images` twice
/// yields the same pairs.
pub trait ImageSource {
    /// Returns every (label, image bytes) pair in the source.
    fn labeled_images(&self) -> Result<Vec<(String, Vec<u8>)>, ClassifierError>;
}
