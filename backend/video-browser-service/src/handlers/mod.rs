/// HTTP handlers for the video browser
///
/// This module contains handlers for:
/// - Pages: the bucket listing and the playback page
/// - Health: liveness probe
pub mod health;
pub mod pages;

use actix_web::web;

pub use health::health;
pub use pages::{index, play};

/// Register every route on an app or test service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/play/{object_name:.*}", web::get().to(play))
        .route("/api/v1/health", web::get().to(health));
}
