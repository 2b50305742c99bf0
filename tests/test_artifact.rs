//! Integration test: artifact persistence and prediction

mod common;

use crop_recommender::error::CropError;
use crop_recommender::inference::{CropFeatures, Predictor};
use crop_recommender::training::{train_and_save, TrainEngine, TrainingConfig};
use crop_recommender::utils::DataLoader;
use common::{write_crop_csv, CROPS};

fn probe_grid() -> Vec<CropFeatures> {
    let mut grid = Vec::new();
    for t in [15.0, 20.0, 25.0, 30.0, 35.0] {
        for h in [15.0, 50.0, 65.0, 85.0] {
            for ph in [5.5, 6.5, 7.5] {
                for r in [60.0, 150.0, 240.0] {
                    grid.push(CropFeatures::new(t, h, ph, r));
                }
            }
        }
    }
    grid
}

#[test]
fn test_save_load_same_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("crops.csv");
    let model = dir.path().join("model.json");
    write_crop_csv(&data, 25, 2);

    let df = DataLoader::new().load_csv(&data).unwrap();
    let mut engine = TrainEngine::new(TrainingConfig::default().with_n_estimators(15));
    engine.fit(&df).unwrap();
    let artifact = engine.into_artifact().unwrap();
    artifact.save(&model).unwrap();

    let in_memory = Predictor::new(artifact);
    let loaded = Predictor::load(&model).unwrap();

    let grid = probe_grid();
    assert_eq!(
        in_memory.predict_batch(&grid).unwrap(),
        loaded.predict_batch(&grid).unwrap()
    );
    assert_eq!(in_memory.classes(), loaded.classes());
}

#[test]
fn test_restart_invariance() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("crops.csv");
    let model = dir.path().join("model.json");
    write_crop_csv(&data, 25, 4);
    train_and_save(TrainingConfig::default().with_n_estimators(15), &data, &model).unwrap();

    let first = Predictor::load(&model).unwrap();
    let second = Predictor::load(&model).unwrap();

    let grid = probe_grid();
    assert_eq!(first.predict_batch(&grid).unwrap(), second.predict_batch(&grid).unwrap());
}

#[test]
fn test_predictions_in_vocabulary() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("crops.csv");
    let model = dir.path().join("model.json");
    write_crop_csv(&data, 25, 6);
    train_and_save(TrainingConfig::default().with_n_estimators(15), &data, &model).unwrap();

    let predictor = Predictor::load(&model).unwrap();
    for crop in predictor.predict_batch(&probe_grid()).unwrap() {
        assert!(predictor.classes().contains(&crop), "{} not in vocabulary", crop);
    }

    // Cluster centers map back to their own crop
    for (label, center) in CROPS.iter() {
        let crop = predictor.predict(&CropFeatures::from_vector(*center)).unwrap();
        assert_eq!(&crop, label);
    }
}

#[test]
fn test_load_missing_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let result = Predictor::load(dir.path().join("absent.json"));
    assert!(matches!(result, Err(CropError::Io(_))));
}

#[test]
fn test_load_corrupt_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    std::fs::write(&path, b"{\"model\": 42}").unwrap();

    let result = Predictor::load(&path);
    assert!(matches!(result, Err(CropError::SerializationError(_))));
}
