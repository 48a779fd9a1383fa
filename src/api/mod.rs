//! Wire payloads of the inference endpoints and the client that talks to
//! them.

pub mod inference;

use serde::Deserialize;
use serde_json::Value;

pub use inference::{HttpInference, InferenceBackend, InferenceError};

/// Body returned by the ask endpoint.
#[derive(Debug, Deserialize)]
pub struct AskResponse {
    pub response: String,
}

/// Body returned by the image-data endpoint.
#[derive(Debug, Deserialize)]
pub struct ImageDataResponse {
    pub data: ImageData,
    #[serde(default)]
    pub results: Value,
}

#[derive(Debug, Deserialize)]
pub struct ImageData {
    pub predictions: Vec<Value>,
}

impl ImageDataResponse {
    /// The top prediction, or `null` when the classifier returned none.
    pub fn first_prediction(&self) -> &Value {
        self.data.predictions.first().unwrap_or(&Value::Null)
    }
}
