//! JSON codec.

use serde::de::IgnoredAny;
use serde_json::{Map, Value};

use super::{CodecError, ContentCodec, MediaType};

/// `application/json` codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ContentCodec for JsonCodec {
    fn media_type(&self) -> MediaType {
        MediaType::Json
    }

    fn verify(&self, text: &str) -> bool {
        serde_json::from_str::<IgnoredAny>(text).is_ok()
    }

    fn translate(&self, text: &str) -> Map<String, Value> {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            // Top-level arrays are keyed by index
            Ok(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), item))
                .collect(),
            _ => Map::new(),
        }
    }

    fn convert(&self, data: &Map<String, Value>) -> Result<String, CodecError> {
        Ok(serde_json::to_string(data)?)
    }
}
