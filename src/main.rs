use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use ndarray::Array1;

use occipital::{
    ClassifierError, FeatureExtractor, ImageSource, KnnClassifier, VehicleClass,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Folder of labeled pictures named like `car.1.png`, `bike.2.png`, ...
    #[arg(long, default_value = "./datas")]
    data_dir: PathBuf,

    /// Where to persist the classifier (defaults to the occipital cache dir)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Number of neighbors to vote on each prediction
    #[arg(short, default_value_t = 3)]
    k: usize,

    /// Discard any previously saved classifier and learn from scratch
    #[arg(long)]
    fresh: bool,
}

/// Default location of the persisted classifier snapshot.
fn default_model_path() -> PathBuf {
    // 1. Check environment variable
    if let Ok(path) = env::var("OCCIPITAL_CACHE") {
        return PathBuf::from(path).join("vehicle-front.json");
    }

    // 2. Use platform-specific cache directory
    if let Some(cache_dir) = dirs::cache_dir() {
        return cache_dir.join("occipital").join("vehicle-front.json");
    }

    // 3. Fallback to user's home directory
    if let Some(home_dir) = dirs::home_dir() {
        return home_dir
            .join(".cache")
            .join("occipital")
            .join("vehicle-front.json");
    }

    // 4. If all else fails, use system temp directory
    env::temp_dir().join("occipital").join("vehicle-front.json")
}

/// A deliberately simple feature extractor: a normalized 64-bin byte
/// histogram of the encoded image. Good enough to exercise the classifier
/// end-to-end; swap in a real visual model behind the same trait for real
/// accuracy.
struct ByteHistogram;

impl ByteHistogram {
    const BINS: usize = 64;
}

impl FeatureExtractor for ByteHistogram {
    fn embedding_dim(&self) -> usize {
        Self::BINS
    }

    fn embed(&self, image: &[u8]) -> Result<Array1<f32>, ClassifierError> {
        if image.is_empty() {
            return Err(ClassifierError::Extractor("image is empty".to_string()));
        }
        let mut bins = vec![0.0_f32; Self::BINS];
        for &byte in image {
            bins[byte as usize * Self::BINS / 256] += 1.0;
        }
        let total = image.len() as f32;
        for bin in &mut bins {
            *bin /= total;
        }
        Ok(Array1::from_vec(bins))
    }
}

/// Reads labeled pictures from a folder where each file is named
/// `<class>.<index>.<ext>`, e.g. `truck.3.png`. Files whose leading token
/// is not a known vehicle class are skipped with a warning.
struct PictureFolder {
    root: PathBuf,
}

impl ImageSource for PictureFolder {
    fn labeled_images(&self) -> Result<Vec<(String, Vec<u8>)>, ClassifierError> {
        let mut images = Vec::new();
        let mut entries: Vec<PathBuf> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        entries.sort();

        for path in entries {
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };
            let label = name.split('.').next().unwrap_or_default();
            match VehicleClass::from_str(label) {
                Ok(class) => {
                    let bytes = fs::read(&path)?;
                    images.push((class.to_string(), bytes));
                }
                Err(_) => warn!("Skipping {:?}: not named after a known class", path),
            }
        }
        Ok(images)
    }
}

fn classify_all(
    classifier: &KnnClassifier,
    extractor: &ByteHistogram,
    images: &[(String, Vec<u8>)],
    k: usize,
) -> Result<()> {
    if classifier.class_count()? == 0 {
        // Caller-level strategy selection: with no learned classes there is
        // nothing to vote on, so a real deployment would fall back to the
        // extractor model's own classifier here.
        info!("Classifier has no classes yet; skipping KNN pass");
        return Ok(());
    }

    for (index, (expected, image)) in images.iter().enumerate() {
        let embedding = extractor.embed(image)?;
        let prediction = classifier.predict(&embedding, k)?;

        let mut scores: Vec<_> = prediction.scores.iter().collect();
        scores.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));

        println!(
            "picture {:>3}  expected {:<9}  predicted {:<9}  ({:.0}%)",
            index + 1,
            expected,
            prediction.label,
            prediction.confidence * 100.0
        );
        for (label, score) in scores {
            println!("    {}: {:.1}%", label, score * 100.0);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let model_path = args.model.clone().unwrap_or_else(default_model_path);
    info!("=== Starting Vehicle Classifier Demo ===");
    info!("Model path: {:?}", model_path);

    if args.fresh && model_path.exists() {
        info!("Fresh run requested - removing saved classifier...");
        fs::remove_file(&model_path)?;
    }

    // A missing prior model is expected on first run, not an error.
    let (mut classifier, found_previous) = match KnnClassifier::load(&model_path) {
        Ok(classifier) => {
            info!(
                "Previous classifier loaded ({} classes)",
                classifier.class_count()?
            );
            (classifier, true)
        }
        Err(ClassifierError::NotFound(_)) => {
            info!("No previous classifier found");
            (KnnClassifier::new(), false)
        }
        Err(e) => return Err(e).context("failed to load saved classifier"),
    };

    let extractor = ByteHistogram;
    let source = PictureFolder {
        root: args.data_dir.clone(),
    };
    let images = source
        .labeled_images()
        .with_context(|| format!("failed to enumerate pictures in {:?}", args.data_dir))?;
    info!("Loaded {} labeled pictures from {:?}", images.len(), args.data_dir);

    // If a trained classifier was restored, see how it does before learning.
    if found_previous {
        println!("--- Classification with the restored classifier ---");
        classify_all(&classifier, &extractor, &images, args.k)?;
    }

    let learn_start = Instant::now();
    for (label, image) in &images {
        classifier.add_example(label.as_str(), extractor.embed(image)?)?;
    }
    info!(
        "Learned {} examples across {} classes (took {:.2?})",
        classifier.example_count()?,
        classifier.class_count()?,
        learn_start.elapsed()
    );

    println!("--- Classification after learning ---");
    classify_all(&classifier, &extractor, &images, args.k)?;

    classifier
        .save(&model_path)
        .context("failed to save classifier")?;

    classifier.dispose();
    info!("=== Demo Complete ===");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_embedding_shape() {
        let extractor = ByteHistogram;
        let embedding = extractor.embed(&[0u8, 255, 128, 128]).unwrap();
        assert_eq!(embedding.len(), extractor.embedding_dim());
        let sum: f32 = embedding.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_histogram_rejects_empty_image() {
        let extractor = ByteHistogram;
        assert!(matches!(
            extractor.embed(&[]),
            Err(ClassifierError::Extractor(_))
        ));
    }
}
