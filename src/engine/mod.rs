//! Inference engines.
//!
//! Every engine implements [`InferenceEngine`]. Which variant a process runs
//! is decided once, by [`Engine::load`], from the artifact found at the
//! configured model path:
//!
//! - a file starting with [`LITE_MAGIC`] → [`LiteInterpreterExecutor`]
//! - any other file → parsed as a JSON [`Network`] → [`FullModelExecutor`]
//! - no file, or an artifact that fails to load → [`Engine::Disabled`]
//!
//! The choice is never revisited. A disabled process stays disabled.

pub mod full;
pub mod lite;

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::config::Config;
use crate::decode::ProbabilityVector;
use crate::error::{ModelError, PipelineError};
use crate::network::Network;
use crate::preprocess::{DType, NormalizedTensor, TensorSpec};

pub use full::FullModelExecutor;
pub use lite::{LiteInterpreter, LiteInterpreterExecutor, LiteModel, LITE_MAGIC};

/// `predict(tensor) -> probability vector`, shared by all engine variants.
pub trait InferenceEngine: Send + Sync {
    /// Short variant name for logs and the health endpoint.
    fn name(&self) -> &'static str;

    /// Shape and element type `predict` requires.
    fn input_spec(&self) -> TensorSpec;

    /// Whether `predict` may run concurrently without the engine serializing
    /// internally. Informational; every engine is safe to share.
    fn is_reentrant(&self) -> bool;

    fn is_enabled(&self) -> bool {
        true
    }

    /// `EngineDisabled` with the reason when the engine cannot serve.
    fn ensure_enabled(&self) -> Result<(), PipelineError> {
        Ok(())
    }

    fn predict(&self, tensor: &NormalizedTensor) -> Result<ProbabilityVector, PipelineError>;
}

/// The process-wide engine.
#[derive(Debug)]
pub enum Engine {
    Full(FullModelExecutor),
    Lite(LiteInterpreterExecutor),
    Disabled { reason: String },
}

impl Engine {
    /// Loads the artifact at `path`, falling back to `Disabled` on any
    /// failure. Never retries.
    pub fn load(path: impl AsRef<Path>) -> Engine {
        let path = path.as_ref();
        match Engine::try_load(path) {
            Ok(engine) => {
                info!(path = %path.display(), engine = engine.name(), "model loaded");
                engine
            }
            Err(err) => {
                let reason = if err.is_not_found() {
                    format!("model artifact not found at {}", path.display())
                } else {
                    err.to_string()
                };
                warn!(path = %path.display(), %reason, "inference disabled");
                Engine::Disabled { reason }
            }
        }
    }

    /// Like [`Engine::load`] but reports why loading failed.
    pub fn try_load(path: impl AsRef<Path>) -> Result<Engine, ModelError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ModelError::io(path, source))?;
        if bytes.starts_with(LITE_MAGIC) {
            let model = LiteModel::from_bytes(&bytes)?;
            Ok(Engine::Lite(LiteInterpreterExecutor::new(model)?))
        } else {
            let network: Network = serde_json::from_slice(&bytes)?;
            Ok(Engine::Full(FullModelExecutor::from_network(network)?))
        }
    }

    pub fn disabled(reason: impl Into<String>) -> Engine {
        Engine::Disabled { reason: reason.into() }
    }

    fn variant(&self) -> Option<&dyn InferenceEngine> {
        match self {
            Engine::Full(exec) => Some(exec as &dyn InferenceEngine),
            Engine::Lite(exec) => Some(exec as &dyn InferenceEngine),
            Engine::Disabled { .. } => None,
        }
    }
}

impl InferenceEngine for Engine {
    fn name(&self) -> &'static str {
        self.variant().map_or("disabled", |e| e.name())
    }

    fn input_spec(&self) -> TensorSpec {
        self.variant().map_or(TensorSpec::digits(DType::F32), |e| e.input_spec())
    }

    fn is_reentrant(&self) -> bool {
        self.variant().map_or(true, |e| e.is_reentrant())
    }

    fn is_enabled(&self) -> bool {
        self.variant().is_some()
    }

    fn ensure_enabled(&self) -> Result<(), PipelineError> {
        match self {
            Engine::Disabled { reason } => Err(PipelineError::EngineDisabled(reason.clone())),
            _ => Ok(()),
        }
    }

    fn predict(&self, tensor: &NormalizedTensor) -> Result<ProbabilityVector, PipelineError> {
        match self {
            Engine::Disabled { reason } => Err(PipelineError::EngineDisabled(reason.clone())),
            Engine::Full(exec) => exec.predict(tensor),
            Engine::Lite(exec) => exec.predict(tensor),
        }
    }
}

// ---------------------------------------------------------------------------
// Process-wide instance
// ---------------------------------------------------------------------------

static ENGINE: OnceCell<Arc<Engine>> = OnceCell::new();

/// Loads the engine from `config.model_path` on first call; later calls
/// return the same instance and ignore their argument.
pub fn init_global(config: &Config) -> Arc<Engine> {
    ENGINE.get_or_init(|| Arc::new(Engine::load(&config.model_path))).clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ink_network, uniform_tensor};

    #[test]
    fn missing_artifact_disables_engine() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::load(dir.path().join("absent.json"));
        assert!(!engine.is_enabled());
        assert_eq!(engine.name(), "disabled");

        let err = engine.predict(&uniform_tensor(DType::F32, 0.0)).unwrap_err();
        match err {
            PipelineError::EngineDisabled(reason) => assert!(reason.contains("not found")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_artifact_disables_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(Engine::try_load(&path), Err(ModelError::Json(_))));
        assert!(!Engine::load(&path).is_enabled());
    }

    #[test]
    fn json_artifact_selects_full_executor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("digits.json");
        ink_network().save_json(&path).unwrap();

        let engine = Engine::load(&path);
        assert!(matches!(engine, Engine::Full(_)));
        assert_eq!(engine.input_spec().dtype, DType::F64);
        assert!(engine.is_reentrant());
    }

    #[test]
    fn lite_artifact_selects_lite_executor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("digits.fnlt");
        LiteModel::compile(&ink_network()).unwrap().save(&path).unwrap();

        let engine = Engine::load(&path);
        assert!(matches!(engine, Engine::Lite(_)));
        assert_eq!(engine.input_spec().dtype, DType::F32);
        assert!(!engine.is_reentrant());
    }

    #[test]
    fn truncated_lite_artifact_disables_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("digits.fnlt");
        let bytes = LiteModel::compile(&ink_network()).unwrap().to_bytes();
        std::fs::write(&path, &bytes[..100]).unwrap();
        assert!(matches!(Engine::try_load(&path), Err(ModelError::LiteFormat(_))));
        assert!(!Engine::load(&path).is_enabled());
    }

    #[test]
    fn overflowing_lite_header_disables_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.fnlt");
        let mut bytes = LITE_MAGIC.to_vec();
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&[0, 3]);
        for _ in 0..3 {
            bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        }
        bytes.extend_from_slice(&10u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        match Engine::load(&path) {
            Engine::Disabled { reason } => assert!(reason.contains("overflows")),
            other => panic!("expected a disabled engine, got {}", other.name()),
        }
    }

    #[test]
    fn variants_agree_on_the_same_weights() {
        let network = ink_network();
        let full = FullModelExecutor::from_network(network.clone()).unwrap();
        let lite = LiteInterpreterExecutor::new(LiteModel::compile(&network).unwrap()).unwrap();
        for value in [0.0, 0.25, 1.0] {
            let a = full.predict(&uniform_tensor(DType::F64, value)).unwrap();
            let b = lite.predict(&uniform_tensor(DType::F32, value)).unwrap();
            for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
                assert!((x - y).abs() < 1e-4);
            }
        }
    }
}
