pub mod classifier;
pub mod config;
pub mod detector;
pub mod error;
pub mod preprocess;
pub mod routes;
pub mod upload;
