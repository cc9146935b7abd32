use std::sync::Arc;

use ferrite_digits::Pipeline;

/// One pipeline shared by every request thread. It carries no per-request
/// state, so no outer lock is needed; the engine serializes internally when
/// it has to.
pub type SharedPipeline = Arc<Pipeline>;
