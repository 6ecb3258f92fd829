use actix_web::{
    HttpResponse,
    cookie::{Cookie, SameSite, time::Duration},
    http::{StatusCode, header},
    web,
};
use serde::Deserialize;
use tera::Tera;
use tracing::info;

use crate::{
    config::Config,
    error::{AppError, SELECT_SUBJECT_PATH},
    pages::page_context,
    session::{SESSION_COOKIE, subject::ActiveSubject, token::issue_subject_token},
    templates,
};

#[derive(Deserialize)]
pub struct SelectSubject {
    #[serde(default)]
    pub subject: String,
}

pub async fn select_subject_form(
    current: Option<ActiveSubject>,
    config: web::Data<Config>,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, AppError> {
    let mut ctx = page_context(current.as_ref());
    ctx.insert("subjects", &config.subjects);
    templates::render(&tera, "select_subject.html", &ctx)
}

pub async fn select_subject(
    config: web::Data<Config>,
    tera: web::Data<Tera>,
    form: web::Form<SelectSubject>,
) -> Result<HttpResponse, AppError> {
    let subject = form.subject.trim();

    if !config.is_known_subject(subject) {
        let mut ctx = page_context(None);
        ctx.insert("subjects", &config.subjects);
        ctx.insert("message", "Invalid subject selected");
        return templates::render_with_status(
            &tera,
            StatusCode::BAD_REQUEST,
            "select_subject.html",
            &ctx,
        );
    }

    let token = issue_subject_token(subject, &config.session_secret, config.session_ttl)?;
    let cookie = Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(config.session_ttl as i64))
        .finish();

    info!(subject, "Subject selected");

    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/"))
        .cookie(cookie)
        .finish())
}

pub async fn clear_subject() -> HttpResponse {
    let cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .max_age(Duration::ZERO)
        .finish();

    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, SELECT_SUBJECT_PATH))
        .cookie(cookie)
        .finish()
}
