use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use backend::config::DetectorConfig;
use backend::detector::Detector;
use backend::routes::configure_routes;
use std::sync::Arc;

#[cfg(feature = "torch")]
fn load_classifier(
    config: &DetectorConfig,
) -> std::io::Result<Arc<dyn backend::classifier::Classifier>> {
    let spec = config
        .model
        .input_spec()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    let classifier =
        backend::classifier::TorchClassifier::load(&config.model.path, spec, config.model.layout)
            .map_err(|e| std::io::Error::other(format!("Model loading failed: {}", e)))?;
    Ok(Arc::new(classifier))
}

#[cfg(not(feature = "torch"))]
fn load_classifier(
    config: &DetectorConfig,
) -> std::io::Result<Arc<dyn backend::classifier::Classifier>> {
    Err(std::io::Error::other(format!(
        "Cannot load {}: this binary was built without a model backend, rebuild with `--features torch`",
        config.model.path.display()
    )))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = DetectorConfig::load().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!("Loading model from {}", config.model.path.display());
    let classifier = load_classifier(&config).inspect_err(|e| {
        log::error!("Failed to load model at startup: {}", e);
    })?;
    let input = classifier.input_spec();
    log::info!(
        "Model expects {}x{} input with {:?} preprocessing",
        input.width,
        input.height,
        input.preprocessing
    );

    let detector = web::Data::new(Detector::new(classifier, config.model.output));
    let bind_address = config.bind_address();

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(detector.clone())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
