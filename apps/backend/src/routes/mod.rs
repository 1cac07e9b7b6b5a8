use actix_web::web;

use crate::middleware::jwt_extract::JwtExtract;

pub mod health;
pub mod realtime;
pub mod sessions;

/// Configure application routes.
///
/// `main.rs` wires these into the HttpServer together with CORS and
/// request tracing; tests register the same paths on a bare test App so
/// endpoint behavior can be exercised directly.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Health check routes: /health
    cfg.service(web::scope("/health").configure(health::configure_routes));

    // Session lookup routes: /api/sessions/**
    cfg.service(
        web::scope("/api/sessions")
            .wrap(JwtExtract)
            .configure(sessions::configure_routes),
    );

    // Realtime routes: /api/ws/**
    cfg.service(
        web::scope("/api/ws")
            .wrap(JwtExtract)
            .configure(realtime::configure_routes),
    );
}
