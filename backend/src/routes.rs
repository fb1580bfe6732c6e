use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use log::{error, info, warn};
use shared::DetectionResponse;
use uuid::Uuid;

use crate::detector::Detector;
use crate::error::DetectError;
use crate::upload::extract_upload;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/detect/").route(web::post().to(handle_detect)));
}

async fn handle_detect(
    req: HttpRequest,
    detector: web::Data<Detector>,
    payload: Multipart,
) -> Result<HttpResponse, DetectError> {
    let request_id = Uuid::new_v4();

    let media = match extract_upload(&req, payload).await {
        Ok(media) => media,
        Err(e) => {
            match &e {
                DetectError::MissingInput => warn!("[{}] {}", request_id, e),
                DetectError::Inference(_) => error!("[{}] Failed to read upload: {}", request_id, e),
            }
            return Err(e);
        }
    };

    info!(
        "[{}] Received {} upload {:?} ({} bytes, {:?})",
        request_id,
        media.field.name(),
        media.file_name,
        media.data.len(),
        media.content_type
    );

    let detector = detector.into_inner();
    let result = web::block(move || detector.detect(&media)).await;

    match result {
        Ok(Ok(probability)) => {
            info!("[{}] fake_probability = {}", request_id, probability);
            Ok(HttpResponse::Ok().json(DetectionResponse::prediction(probability)))
        }
        Ok(Err(e)) => {
            error!("[{}] Detection failed: {}", request_id, e);
            Err(e)
        }
        Err(e) => {
            error!("[{}] Detection task aborted: {}", request_id, e);
            Err(e.into())
        }
    }
}
