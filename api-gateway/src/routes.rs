use crate::handlers;
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .route("/metrics", web::get().to(handlers::metrics))
        .route("/auth/logout", web::post().to(handlers::logout))
        .route("/sessions/me", web::get().to(handlers::my_session));
}
