//! Integration test: adapter fit/predict surface end-to-end

use boostbridge::prelude::*;
use ndarray::{Array1, Array2};

fn classification_data() -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_vec((24, 3), (0..72).map(|i| (i % 13) as f64).collect()).unwrap();
    let y: Array1<f64> = (0..24).map(|i| (i % 4) as f64).collect();
    (x, y)
}

fn regression_data() -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_vec((30, 2), (0..60).map(|i| i as f64 * 0.3).collect()).unwrap();
    let y: Array1<f64> = x.rows().into_iter().map(|r| r[0] * 1.5 + r[1]).collect();
    (x, y)
}

fn small_options() -> GbtOptions {
    GbtOptions {
        booster: BoosterKind::GbTree,
        ..Default::default()
    }
}

#[test]
fn test_classifier_sets_class_count_from_labels() {
    let (x, y) = classification_data();
    let mut clf = GbtClassifier::new(small_options()).unwrap();
    clf.fit(&x, &y).unwrap();
    assert_eq!(clf.num_class(), Some(4));
}

#[test]
fn test_classifier_predictions_are_known_labels() {
    let (x, y) = classification_data();
    let mut clf = GbtClassifier::new(small_options()).unwrap();
    clf.fit(&x, &y).unwrap();

    let preds = clf.predict(&x).unwrap();
    assert_eq!(preds.len(), x.nrows());
    for p in preds.iter() {
        assert!([0.0, 1.0, 2.0, 3.0].contains(p), "unexpected label {p}");
    }
}

#[test]
fn test_regressor_prediction_length_matches_rows() {
    let (x, y) = regression_data();
    let mut reg = GbtRegressor::new(small_options()).unwrap();
    reg.fit(&x, &y).unwrap();

    let preds = reg.predict(&x).unwrap();
    assert_eq!(preds.len(), x.nrows());
}

#[test]
fn test_regressor_learns_linear_target() {
    let (x, y) = regression_data();
    let mut reg = GbtRegressor::new(small_options()).unwrap();
    reg.fit(&x, &y).unwrap();

    let preds = reg.predict(&x).unwrap();
    let mse: f64 =
        preds.iter().zip(y.iter()).map(|(p, t)| (p - t).powi(2)).sum::<f64>() / y.len() as f64;
    let mean = y.mean().unwrap();
    let var: f64 = y.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / y.len() as f64;
    assert!(mse < var * 0.2, "mse {mse} vs variance {var}");
}

#[test]
fn test_dart_booster_end_to_end() {
    let (x, y) = regression_data();
    let opts = GbtOptions {
        booster: BoosterKind::Dart,
        ..Default::default()
    };
    let mut reg = GbtRegressor::new(opts).unwrap();
    reg.fit(&x, &y).unwrap();
    assert!(reg.predict(&x).unwrap().iter().all(|p| p.is_finite()));
}

#[test]
fn test_refit_replaces_previous_model() {
    let (x, y) = classification_data();
    let mut clf = GbtClassifier::new(small_options()).unwrap();
    clf.fit(&x, &y).unwrap();

    let y_binary: Array1<f64> = (0..24).map(|i| (i % 2) as f64).collect();
    clf.fit(&x, &y_binary).unwrap();
    assert_eq!(clf.num_class(), Some(2));

    let preds = clf.predict(&x).unwrap();
    for p in preds.iter() {
        assert!([0.0, 1.0].contains(p));
    }
}

#[test]
fn test_model_bytes_round_trip() {
    let (x, y) = regression_data();
    let mut reg = GbtRegressor::new(small_options()).unwrap();
    reg.fit(&x, &y).unwrap();

    let bytes = reg.to_bytes().unwrap();
    let restored = GbtRegressor::from_bytes(&bytes).unwrap();
    assert_eq!(restored.predict(&x).unwrap(), reg.predict(&x).unwrap());
}

#[test]
fn test_invalid_options_rejected_eagerly() {
    let opts = GbtOptions {
        reg_lambda: -1.0,
        ..Default::default()
    };
    assert!(matches!(
        GbtClassifier::new(opts),
        Err(BridgeError::InvalidParameter { .. })
    ));
}
