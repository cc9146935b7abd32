use std::io::Read;
use tiny_http::Request;
use tracing::warn;

use ferrite_digits::{Pipeline, PredictRequest, PredictResponse};

use crate::routes::{json_response, HttpResponse};

/// Largest request body read; a 300×300 canvas PNG is far below this.
const MAX_BODY_BYTES: u64 = 8 * 1024 * 1024;

// ---------------------------------------------------------------------------
// POST /predict
// ---------------------------------------------------------------------------

pub fn handle_post(request: &mut Request, pipeline: &Pipeline) -> HttpResponse {
    let mut body = String::new();
    if let Err(e) = request.as_reader().take(MAX_BODY_BYTES).read_to_string(&mut body) {
        warn!(error = %e, "unreadable request body");
        return json_response(400, &PredictResponse::error(format!("unreadable request body: {}", e)));
    }

    let (status, response) = predict_body(&body, pipeline);
    json_response(status, &response)
}

/// Parses a `{"image": ...}` body and classifies it. A body that is not
/// valid JSON gets status 400; every classification outcome, failed or
/// not, gets 200.
pub fn predict_body(body: &str, pipeline: &Pipeline) -> (u16, PredictResponse) {
    match serde_json::from_str::<PredictRequest>(body) {
        Ok(req) => (200, PredictResponse::from(&pipeline.classify(&req.image))),
        Err(e) => {
            warn!(error = %e, "invalid predict request");
            (400, PredictResponse::error(format!("invalid request body: {}", e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use image::{GrayImage, Luma};
    use ferrite_digits::{Engine, EncodedImage};
    use ferrite_digits::engine::{LiteInterpreterExecutor, LiteModel};
    use ferrite_digits::pipeline::PredictionValue;
    use ferrite_digits::{ActivationFunction, Layer, Matrix, Network};

    fn lite_pipeline() -> Pipeline {
        let layer = Layer::from_parts(
            Matrix::from_fn(784, 10, |r, c| if (r + c) % 10 == 0 { 0.01 } else { 0.0 }),
            Matrix::zeros(1, 10),
            ActivationFunction::Softmax,
        ).unwrap();
        let network = Network::from_layers(vec![layer]).unwrap();
        let model = LiteModel::compile(&network).unwrap();
        Pipeline::new(Arc::new(LiteInterpreterExecutor::new(model).unwrap()))
    }

    fn black_canvas_body() -> String {
        let image = GrayImage::from_pixel(300, 300, Luma([0]));
        let encoded = EncodedImage::from_gray_image(&image).unwrap();
        serde_json::to_string(&PredictRequest { image: encoded }).unwrap()
    }

    #[test]
    fn canvas_gets_a_digit() {
        let (status, response) = predict_body(&black_canvas_body(), &lite_pipeline());
        assert_eq!(status, 200);
        match response.prediction {
            PredictionValue::Digit(d) => assert!(d <= 9),
            other => panic!("expected a digit, got {other:?}"),
        }
        assert!((0.0..=100.0).contains(&response.confidence));
    }

    #[test]
    fn disabled_engine_answers_error() {
        let pipeline = Pipeline::new(Arc::new(Engine::disabled("no model")));
        let (status, response) = predict_body(&black_canvas_body(), &pipeline);
        assert_eq!(status, 200);
        assert_eq!(response.prediction, PredictionValue::Label("Error".into()));
        assert_eq!(response.confidence, 0.0);
    }

    #[test]
    fn bad_image_answers_with_message() {
        let (status, response) = predict_body(r#"{"image":"not a data uri"}"#, &lite_pipeline());
        assert_eq!(status, 200);
        assert!(response.is_error());
        assert_eq!(response.confidence, 0.0);
    }

    #[test]
    fn invalid_json_is_a_bad_request() {
        let (status, response) = predict_body("{\"img\": 3", &lite_pipeline());
        assert_eq!(status, 400);
        assert!(response.is_error());
    }
}
