use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::configuration::JwtSettings;
use crate::routes::{
    dual_token_refresh, health_check, login_cookie, login_token, logout, token_refresh, verify,
};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    jwt_config: JwtSettings,
) -> Result<Server, std::io::Error> {
    let connection = web::Data::new(connection);
    let jwt_config_data = web::Data::new(jwt_config);

    let server = HttpServer::new(move || {
        // Request shape validation happens before the engine runs;
        // malformed bodies are a 422, not an auth failure.
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            actix_web::error::InternalError::from_response(
                err,
                HttpResponse::UnprocessableEntity()
                    .json(serde_json::json!({ "detail": "Malformed request body" })),
            )
            .into()
        });

        App::new()
            .wrap(Logger::default())
            .app_data(connection.clone())
            .app_data(jwt_config_data.clone())
            .app_data(json_config)
            .route("/health_check", web::get().to(health_check))
            .route("/auth/login", web::post().to(login_token))
            .route("/auth/login/token", web::post().to(login_token))
            .route("/auth/login/cookie", web::post().to(login_cookie))
            .route("/auth/verify", web::get().to(verify))
            .route("/auth/token/refresh", web::post().to(token_refresh))
            .route("/auth/token/refresh/dual", web::post().to(dual_token_refresh))
            .route("/auth/logout", web::post().to(logout))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
