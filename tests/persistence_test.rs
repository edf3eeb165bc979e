use std::fs;
use std::path::PathBuf;

use ndarray::array;
use occipital::{ClassifierError, KnnClassifier};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("occipital-test-{}-{}.json", std::process::id(), name))
}

fn setup_vehicle_classifier() -> KnnClassifier {
    let mut classifier = KnnClassifier::new();
    classifier
        .add_example("car", array![1.0, 0.0, 0.0, 0.0])
        .unwrap();
    classifier
        .add_example("car", array![1.0, 0.0, 1.0, 0.0])
        .unwrap();
    classifier
        .add_example("bike", array![0.0, 1.0, 0.0, 0.0])
        .unwrap();
    classifier
}

#[test]
fn test_save_load_round_trip() -> Result<(), ClassifierError> {
    let path = temp_path("round-trip");
    let classifier = setup_vehicle_classifier();
    classifier.save(&path)?;

    let restored = KnnClassifier::load(&path)?;

    assert_eq!(restored.class_count()?, classifier.class_count()?);
    assert_eq!(restored.dim()?, classifier.dim()?);
    for label in ["car", "bike"] {
        let original = classifier.store(label)?.expect("label exists");
        let loaded = restored.store(label)?.expect("label survives reload");
        assert_eq!(loaded.len(), original.len());
        // element-wise exact, in insertion order
        assert_eq!(loaded.vectors(), original.vectors());
    }

    // and the reloaded classifier predicts identically
    let query = array![1.0, 0.0, 0.0, 0.0];
    let before = classifier.predict(&query, 3)?;
    let after = restored.predict(&query, 3)?;
    assert_eq!(before.label, after.label);
    assert_eq!(before.scores, after.scores);

    fs::remove_file(&path).ok();
    Ok(())
}

#[test]
fn test_load_missing_file_is_not_found() {
    let path = temp_path("missing-does-not-exist");
    let result = KnnClassifier::load(&path);
    assert!(matches!(result, Err(ClassifierError::NotFound(_))));
}

#[test]
fn test_load_garbage_is_corrupt_data() {
    let path = temp_path("garbage");
    fs::write(&path, b"definitely not a snapshot").unwrap();

    let result = KnnClassifier::load(&path);
    assert!(matches!(result, Err(ClassifierError::CorruptData(_))));

    fs::remove_file(&path).ok();
}

#[test]
fn test_load_bad_shape_is_corrupt_data() {
    let path = temp_path("bad-shape");
    // 7 values cannot be 2 embeddings of dimension 4
    let snapshot = r#"{
        "schema_version": 1,
        "dim": 4,
        "classes": [
            {"label": "car", "store": {"dim": 4, "count": 2, "values": [0, 0, 0, 0, 0, 0, 0]}}
        ]
    }"#;
    fs::write(&path, snapshot).unwrap();

    let result = KnnClassifier::load(&path);
    assert!(matches!(result, Err(ClassifierError::CorruptData(_))));

    fs::remove_file(&path).ok();
}

#[test]
fn test_load_unknown_schema_version_is_corrupt_data() {
    let path = temp_path("future-schema");
    fs::write(
        &path,
        r#"{"schema_version": 99, "dim": 2, "classes": []}"#,
    )
    .unwrap();

    let result = KnnClassifier::load(&path);
    assert!(matches!(result, Err(ClassifierError::CorruptData(_))));

    fs::remove_file(&path).ok();
}

#[test]
fn test_load_duplicate_label_is_corrupt_data() {
    let path = temp_path("duplicate-label");
    let snapshot = r#"{
        "schema_version": 1,
        "dim": 1,
        "classes": [
            {"label": "car", "store": {"dim": 1, "count": 1, "values": [1.0]}},
            {"label": "car", "store": {"dim": 1, "count": 1, "values": [2.0]}}
        ]
    }"#;
    fs::write(&path, snapshot).unwrap();

    let result = KnnClassifier::load(&path);
    assert!(matches!(result, Err(ClassifierError::CorruptData(_))));

    fs::remove_file(&path).ok();
}

#[test]
fn test_load_replaces_prior_state() -> Result<(), ClassifierError> {
    let path = temp_path("replace-state");
    setup_vehicle_classifier().save(&path)?;

    let mut classifier = KnnClassifier::new();
    classifier.add_example("truck", array![9.0, 9.0, 9.0])?;

    // dimensions may even differ: load is a wholesale replacement
    classifier.load_from(&path)?;
    assert_eq!(classifier.dim()?, Some(4));
    assert_eq!(classifier.class_count()?, 2);
    assert!(classifier.store("truck")?.is_none());

    fs::remove_file(&path).ok();
    Ok(())
}

#[test]
fn test_empty_classifier_round_trip() -> Result<(), ClassifierError> {
    let path = temp_path("empty-degenerate");
    KnnClassifier::new().save(&path)?;

    let restored = KnnClassifier::load(&path)?;
    assert_eq!(restored.class_count()?, 0);
    assert_eq!(restored.dim()?, None);
    // still empty, so prediction keeps signalling the fallback path
    assert!(matches!(
        restored.predict(&array![1.0], 1),
        Err(ClassifierError::EmptyClassifier)
    ));

    fs::remove_file(&path).ok();
    Ok(())
}

#[test]
fn test_save_leaves_no_temp_file() -> Result<(), ClassifierError> {
    let path = temp_path("no-temp-left");
    setup_vehicle_classifier().save(&path)?;

    let mut tmp = path.file_name().unwrap().to_os_string();
    tmp.push(".tmp");
    assert!(path.exists());
    assert!(!path.with_file_name(tmp).exists());

    fs::remove_file(&path).ok();
    Ok(())
}

#[test]
fn test_save_creates_parent_directories() -> Result<(), ClassifierError> {
    let dir = std::env::temp_dir().join(format!(
        "occipital-test-{}-nested/deeper",
        std::process::id()
    ));
    let path = dir.join("model.json");
    setup_vehicle_classifier().save(&path)?;

    assert!(KnnClassifier::load(&path)?.class_count()? == 2);

    fs::remove_dir_all(dir.parent().unwrap()).ok();
    Ok(())
}

#[test]
fn test_save_again_after_more_examples() -> Result<(), ClassifierError> {
    // Incremental training sessions accumulate across restarts.
    let path = temp_path("incremental");
    setup_vehicle_classifier().save(&path)?;

    let mut classifier = KnnClassifier::load(&path)?;
    classifier.add_example("truck", array![0.0, 0.0, 0.0, 1.0])?;
    classifier.save(&path)?;

    let restored = KnnClassifier::load(&path)?;
    assert_eq!(restored.class_count()?, 3);
    assert_eq!(restored.store("truck")?.unwrap().len(), 1);

    fs::remove_file(&path).ok();
    Ok(())
}
