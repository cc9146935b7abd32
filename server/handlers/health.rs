use serde::Serialize;

use ferrite_digits::Pipeline;

use crate::routes::{json_response, HttpResponse};

#[derive(Debug, Serialize)]
pub struct Health {
    pub engine: &'static str,
    pub enabled: bool,
}

impl Health {
    pub fn of(pipeline: &Pipeline) -> Self {
        let engine = pipeline.engine();
        Health { engine: engine.name(), enabled: engine.is_enabled() }
    }
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

pub fn handle_get(pipeline: &Pipeline) -> HttpResponse {
    json_response(200, &Health::of(pipeline))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use ferrite_digits::Engine;

    #[test]
    fn disabled_engine_reports_not_enabled() {
        let pipeline = Pipeline::new(Arc::new(Engine::disabled("no model")));
        let json = serde_json::to_value(Health::of(&pipeline)).unwrap();
        assert_eq!(json, serde_json::json!({ "engine": "disabled", "enabled": false }));
    }
}
