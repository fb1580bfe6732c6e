use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::DetectionResponse;

use crate::classifier::ClassifierError;
use crate::preprocess::PreprocessError;

pub const MISSING_INPUT_MESSAGE: &str = "No file or video uploaded";

#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// Neither a `file` nor a `video` upload was present.
    #[error("No file or video uploaded")]
    MissingInput,
    /// Anything that went wrong between reading the upload and scoring it.
    #[error("Error: {0}")]
    Inference(String),
}

impl From<PreprocessError> for DetectError {
    fn from(err: PreprocessError) -> Self {
        DetectError::Inference(err.to_string())
    }
}

impl From<ClassifierError> for DetectError {
    fn from(err: ClassifierError) -> Self {
        DetectError::Inference(err.to_string())
    }
}

impl From<actix_multipart::MultipartError> for DetectError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        DetectError::Inference(err.to_string())
    }
}

impl From<actix_web::error::BlockingError> for DetectError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        DetectError::Inference(err.to_string())
    }
}

impl ResponseError for DetectError {
    fn status_code(&self) -> StatusCode {
        match self {
            DetectError::MissingInput => StatusCode::BAD_REQUEST,
            DetectError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(DetectionResponse::error(self.to_string()))
    }
}
