use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumIter, EnumString};

/// Multipart field names the detection endpoint reads an upload from.
///
/// `Video` is a compatibility alias: its payload is decoded as a single still
/// image, exactly like `File`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, AsRefStr, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum UploadField {
    File,
    Video,
}

impl UploadField {
    pub fn name(&self) -> &str {
        self.as_ref()
    }
}

/// Probability that an upload is synthetic, always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FakeProbability(pub f32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetectionResponse {
    Prediction { fake_probability: FakeProbability },
    Error { error: String },
}

impl DetectionResponse {
    pub fn prediction(probability: f32) -> Self {
        DetectionResponse::Prediction {
            fake_probability: FakeProbability(probability),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        DetectionResponse::Error {
            error: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn upload_fields_in_priority_order() {
        let fields: Vec<UploadField> = UploadField::iter().collect();
        let names: Vec<&str> = fields.iter().map(|f| f.as_ref()).collect();
        assert_eq!(names, vec!["file", "video"]);
        assert!(UploadField::File < UploadField::Video);
    }

    #[test]
    fn upload_field_parses_wire_name() {
        assert_eq!(UploadField::from_str("video").unwrap(), UploadField::Video);
        assert!(UploadField::from_str("image").is_err());
    }

    #[test]
    fn prediction_serializes_bare_float() {
        let body = serde_json::to_value(DetectionResponse::prediction(0.25)).unwrap();
        assert_eq!(body, serde_json::json!({ "fake_probability": 0.25 }));
    }

    #[test]
    fn error_has_no_prediction_field() {
        let body = serde_json::to_value(DetectionResponse::error("No file or video uploaded")).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "No file or video uploaded" }));
    }

    #[test]
    fn responses_deserialize_by_shape() {
        let ok: DetectionResponse = serde_json::from_str(r#"{"fake_probability":0.5}"#).unwrap();
        assert_eq!(ok, DetectionResponse::prediction(0.5));
        let err: DetectionResponse = serde_json::from_str(r#"{"error":"Error: boom"}"#).unwrap();
        assert_eq!(err, DetectionResponse::error("Error: boom"));
    }
}
