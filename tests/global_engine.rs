//! The process-wide engine lives in a `OnceCell`, so this file holds a single
//! test and runs in its own process.

use std::sync::Arc;

use ferrite_digits::engine::{self, InferenceEngine};
use ferrite_digits::{ActivationFunction, Config, ErrorKind, Layer, Matrix, Network, Pipeline};

fn write_valid_model(path: &std::path::Path) {
    let layer = Layer::from_parts(
        Matrix::from_fn(784, 10, |r, c| if r % 10 == c { 0.02 } else { 0.0 }),
        Matrix::zeros(1, 10),
        ActivationFunction::Softmax,
    )
    .unwrap();
    Network::from_layers(vec![layer]).unwrap().save_json(path).unwrap();
}

#[test]
fn engine_is_loaded_once_and_never_reloaded() {
    let dir = tempfile::tempdir().unwrap();

    let missing = Config { model_path: dir.path().join("absent.json"), ..Config::default() };
    let first = engine::init_global(&missing);
    assert!(!first.is_enabled());

    // A model appearing later does not revive the engine.
    let valid_path = dir.path().join("digits.json");
    write_valid_model(&valid_path);
    let valid = Config { model_path: valid_path, ..Config::default() };
    let second = engine::init_global(&valid);
    assert!(Arc::ptr_eq(&first, &second));
    assert!(!second.is_enabled());

    let pipeline = Pipeline::global(&valid);
    let shared = pipeline.engine() as *const dyn InferenceEngine as *const ();
    assert!(std::ptr::eq(shared, Arc::as_ptr(&first) as *const ()));

    let result = pipeline.classify(&ferrite_digits::EncodedImage::new("data:image/png;base64,AAAA"));
    assert_eq!(result.error_kind(), Some(ErrorKind::EngineDisabled));
}
