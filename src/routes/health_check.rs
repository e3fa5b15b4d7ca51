use actix_web::Responder;

/// Liveness probe
pub async fn health_check() -> impl Responder {
    "OK"
}
