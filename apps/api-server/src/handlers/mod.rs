//! HTTP handlers and route configuration.

mod comments;
mod health;
mod images;
mod mappers;
mod posts;
mod tags;
mod users;
mod votes;

#[cfg(test)]
mod tests;

use actix_web::web;

use crate::middleware::error::AppError;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/users")
                    .route("", web::post().to(users::register))
                    .route("/token", web::post().to(users::token))
                    .route("/forgot-password", web::post().to(users::forgot_password))
                    .route(
                        "/reset-password/{encoded_pk}/{token}",
                        web::post().to(users::reset_password),
                    )
                    .route("/me", web::get().to(users::me))
                    .route("/me", web::patch().to(users::update_me)),
            )
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list))
                    .route("", web::post().to(posts::create))
                    .route("/{id}", web::get().to(posts::get))
                    .route("/{id}", web::patch().to(posts::update))
                    .route("/{id}", web::delete().to(posts::delete)),
            )
            .service(
                web::scope("/tags")
                    .route("", web::get().to(tags::list))
                    .route("/{id}", web::patch().to(tags::update))
                    .route("/{id}", web::delete().to(tags::delete)),
            )
            .service(
                web::scope("/comments")
                    .route("", web::get().to(comments::list))
                    .route("", web::post().to(comments::create))
                    .route("/{id}", web::get().to(comments::get))
                    .route("/{id}", web::patch().to(comments::update))
                    .route("/{id}", web::delete().to(comments::delete)),
            )
            .service(
                web::scope("/votes")
                    .route("", web::post().to(votes::submit))
                    .route("/{id}", web::delete().to(votes::delete)),
            )
            .service(
                web::scope("/images")
                    .route("", web::get().to(images::list))
                    .route("", web::post().to(images::create))
                    .route("/{id}", web::patch().to(images::update))
                    .route("/{id}", web::delete().to(images::delete)),
            ),
    );
}
