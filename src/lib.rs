pub mod api;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod migrate;
pub mod model;
pub mod pages;
pub mod routes;
pub mod session;
pub mod templates;
pub mod utils;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::{Logger, NormalizePath, from_fn};
use actix_web::web::Data;
use actix_web::App;
use sqlx::SqlitePool;
use tera::Tera;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::session::middleware::subject_middleware;

/// Everything a worker needs to serve requests.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Data<Config>,
    pub templates: Data<Tera>,
}

pub fn build_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let config = state.config.clone();

    App::new()
        .wrap(from_fn(subject_middleware))
        .wrap(NormalizePath::trim())
        .wrap(Logger::default())
        .app_data(Data::new(state.pool))
        .app_data(state.config)
        .app_data(state.templates)
        .service(
            SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                .url("/api-doc/openapi.json", docs::openapi_for_prefix(&config.api_prefix)),
        )
        .configure(|cfg| routes::configure(cfg, &config))
}
