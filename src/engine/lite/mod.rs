pub mod executor;
pub mod format;
pub mod interpreter;

pub use executor::LiteInterpreterExecutor;
pub use format::{LiteLayer, LiteModel, LITE_MAGIC};
pub use interpreter::LiteInterpreter;
