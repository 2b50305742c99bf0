//! Integration test: training pipeline

mod common;

use crop_recommender::error::CropError;
use crop_recommender::export::ModelArtifact;
use crop_recommender::training::{train_and_save, TrainEngine, TrainingConfig};
use crop_recommender::utils::DataLoader;
use common::{crop_csv, sorted_labels, write_crop_csv, HEADER};

fn fast_config() -> TrainingConfig {
    TrainingConfig::default().with_n_estimators(20)
}

#[test]
fn test_train_and_save_report() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("crops.csv");
    let model = dir.path().join("model.json");
    write_crop_csv(&data, 40, 1);

    let report = train_and_save(fast_config(), &data, &model).unwrap();

    assert!(model.exists());
    assert_eq!(report.classes, sorted_labels());
    assert_eq!(report.n_holdout, 5 * 8);
    assert_eq!(report.n_train, 5 * 32);
    assert_eq!(report.metrics.n_samples, report.n_holdout);
    assert!(report.accuracy() > 0.9, "accuracy {}", report.accuracy());

    let names: Vec<&str> = report.feature_importances.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["temperature", "humidity", "ph", "rainfall"]);
    let total: f64 = report.feature_importances.iter().map(|(_, v)| v).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn test_training_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("crops.csv");
    write_crop_csv(&data, 30, 7);

    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    train_and_save(fast_config(), &data, &a).unwrap();
    train_and_save(fast_config(), &data, &b).unwrap();

    assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
}

#[test]
fn test_seed_changes_model() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("crops.csv");
    write_crop_csv(&data, 30, 7);

    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    train_and_save(fast_config(), &data, &a).unwrap();
    train_and_save(fast_config().with_random_seed(43), &data, &b).unwrap();

    assert_ne!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
}

#[test]
fn test_retraining_overwrites_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("crops.csv");
    let model = dir.path().join("model.json");
    std::fs::write(&model, "stale").unwrap();
    write_crop_csv(&data, 20, 3);

    train_and_save(fast_config(), &data, &model).unwrap();

    let text = std::fs::read_to_string(&model).unwrap();
    assert!(text.starts_with('{'));
}

#[test]
fn test_engine_on_dataframe() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("crops.csv");
    write_crop_csv(&data, 20, 11);
    let df = DataLoader::new().load_csv(&data).unwrap();

    let mut engine = TrainEngine::new(fast_config());
    let accuracy = engine.fit(&df).unwrap().accuracy();
    assert!(engine.report().is_some());

    let artifact = engine.into_artifact().unwrap();
    assert_eq!(artifact.label_encoder().classes(), sorted_labels().as_slice());
    assert_eq!(artifact.model().n_trees(), 20);
    assert!(accuracy > 0.8);
}

#[test]
fn test_labels_with_whitespace_kept_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("crops.csv");
    let model = dir.path().join("model.json");

    let mut csv = String::from(HEADER);
    csv.push('\n');
    for i in 0..10 {
        let jitter = i as f64 * 0.1;
        csv.push_str(&format!("1,2,3,{:.1},82.0,6.4,235.0,\"rice \"\n", 23.0 + jitter));
        csv.push_str(&format!("1,2,3,{:.1},65.0,6.2,85.0,maize\n", 22.0 + jitter));
        csv.push_str(&format!("1,2,3,{:.1},17.0,7.3,80.0,rice\n", 18.0 + jitter));
    }
    std::fs::write(&data, csv).unwrap();

    let report = train_and_save(fast_config(), &data, &model).unwrap();
    assert_eq!(report.classes, ["maize", "rice", "rice "]);

    let artifact = ModelArtifact::load(&model).unwrap();
    let encoder = artifact.label_encoder();
    assert!(encoder.classes().iter().any(|c| c == "rice "));
    for label in ["rice ", "rice", "maize"] {
        let code = encoder.encode(label).unwrap();
        assert_eq!(encoder.decode(code).unwrap(), label);
    }
    assert_ne!(encoder.encode("rice ").unwrap(), encoder.encode("rice").unwrap());
}

fn train_text(csv: &str) -> Result<(), CropError> {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("crops.csv");
    let model = dir.path().join("model.json");
    std::fs::write(&data, csv).unwrap();

    let result = train_and_save(fast_config(), &data, &model).map(|_| ());
    if result.is_err() {
        assert!(!model.exists(), "no artifact on failure");
    }
    result
}

#[test]
fn test_single_class_fails() {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for i in 0..10 {
        csv.push_str(&format!("1,2,3,{}.0,80.0,6.5,200.0,rice\n", 20 + i));
    }
    assert!(matches!(train_text(&csv), Err(CropError::ValidationError(_))));
}

#[test]
fn test_singleton_class_fails() {
    let mut csv = crop_csv(10, 5);
    csv.push_str("1,2,3,40.0,10.0,4.0,10.0,cactus\n");
    assert!(train_text(&csv).is_err());
}

#[test]
fn test_missing_value_fails() {
    let mut csv = crop_csv(10, 5);
    csv.push_str("1,2,3,,80.0,6.5,200.0,rice\n");
    assert!(matches!(train_text(&csv), Err(CropError::DataError(_))));
}

#[test]
fn test_non_numeric_value_fails() {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    csv.push_str("1,2,3,20.0,humid,6.5,200.0,rice\n");
    csv.push_str(&crop_csv(10, 5).lines().skip(1).collect::<Vec<_>>().join("\n"));
    csv.push('\n');
    assert!(train_text(&csv).is_err());
}

#[test]
fn test_missing_column_fails() {
    let csv = "temperature,humidity,ph,label\n20,80,6.5,rice\n21,81,6.4,rice\n";
    assert!(matches!(train_text(csv), Err(CropError::FeatureNotFound(c)) if c == "rainfall"));
}

#[test]
fn test_empty_dataset_fails() {
    let csv = format!("{}\n", HEADER);
    assert!(train_text(&csv).is_err());
}

#[test]
fn test_missing_dataset_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = train_and_save(
        fast_config(),
        dir.path().join("nope.csv"),
        dir.path().join("model.json"),
    );
    assert!(matches!(result, Err(CropError::DataError(_))));
}
