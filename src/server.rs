//! actix-web application wiring, shared between `main` and the integration
//! tests.

use crate::error::ApiError;
use crate::routes;
use crate::store::Store;
use actix_web::{web, HttpResponse};
use std::sync::Arc;

/// Registers the store and all routes on an app. Deserialization failures of
/// typed JSON bodies are mapped into the same `{"error": ...}` envelope the
/// rest of the API uses.
pub fn configure(cfg: &mut web::ServiceConfig, store: Arc<dyn Store>) {
    cfg.app_data(web::Data::from(store))
        .app_data(
            web::JsonConfig::default()
                .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
        )
        .service(web::resource("/employees/").route(web::post().to(routes::create_employee)))
        .service(web::resource("/login/").route(web::post().to(routes::login)))
        .service(web::resource("/restaurants/").route(web::post().to(routes::create_restaurant)))
        .service(web::resource("/menu/").route(web::post().to(routes::create_menu)))
        .service(web::resource("/menu/today/").route(web::get().to(routes::menus_today)))
        .service(web::resource("/vote/").route(web::post().to(routes::submit_vote)))
        .service(web::resource("/results/today/").route(web::get().to(routes::results_today)))
        .default_service(web::route().to(not_found));
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "Not found." }))
}
