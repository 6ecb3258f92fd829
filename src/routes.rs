use crate::{
    api::{attendance, teacher},
    config::Config,
    pages,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::Condition, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    // Per-IP limiter for the JSON API
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let burst = requests_per_min.max(1);
        let per_ms = (60_000 / burst as u64).max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(burst)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("period and burst are non-zero");
        Governor::new(&cfg)
    }

    let api_limiter = Arc::new(build_limiter(config.rate_api_per_min));

    // Pages
    cfg.service(web::resource("/").route(web::get().to(pages::dashboard::dashboard)))
        .service(
            web::resource("/select_subject")
                .route(web::get().to(pages::subject::select_subject_form))
                .route(web::post().to(pages::subject::select_subject)),
        )
        .service(web::resource("/clear_subject").route(web::post().to(pages::subject::clear_subject)))
        .service(
            web::resource("/add_teacher")
                .route(web::get().to(pages::teacher::add_teacher_form))
                .route(web::post().to(pages::teacher::add_teacher)),
        )
        .service(
            web::resource("/mark_attendance")
                .route(web::get().to(pages::attendance::mark_attendance_page)),
        )
        .service(
            web::resource("/view_attendance").route(web::get().to(pages::attendance::view_attendance)),
        );

    // JSON API
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(Condition::new(config.rate_api_per_min > 0, api_limiter))
            .service(web::resource("/teachers").route(web::get().to(teacher::list_teachers)))
            .service(
                web::resource("/delete_teacher/{id}")
                    .route(web::delete().to(teacher::delete_teacher)),
            )
            .service(
                web::resource("/attendance").route(web::get().to(attendance::attendance_for_date)),
            )
            .service(
                web::resource("/mark_attendance").route(web::post().to(attendance::mark_attendance)),
            )
            // both names answer with the subject-scoped dump
            .service(
                web::resource(["/get_attendance", "/get_attendance_legacy"])
                    .route(web::get().to(attendance::get_attendance)),
            ),
    );
}
