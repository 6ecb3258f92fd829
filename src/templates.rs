use actix_web::{HttpResponse, http::StatusCode};
use tera::{Context, Tera};

use crate::error::AppError;

/// Builds the template engine from the pages compiled into the binary.
pub fn load() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", include_str!("../templates/base.html")),
        ("dashboard.html", include_str!("../templates/dashboard.html")),
        ("select_subject.html", include_str!("../templates/select_subject.html")),
        ("add_teacher.html", include_str!("../templates/add_teacher.html")),
        ("mark_attendance.html", include_str!("../templates/mark_attendance.html")),
        ("view_attendance.html", include_str!("../templates/view_attendance.html")),
    ])?;
    Ok(tera)
}

pub fn render(tera: &Tera, template: &str, context: &Context) -> Result<HttpResponse, AppError> {
    render_with_status(tera, StatusCode::OK, template, context)
}

pub fn render_with_status(
    tera: &Tera,
    status: StatusCode,
    template: &str,
    context: &Context,
) -> Result<HttpResponse, AppError> {
    let html = tera.render(template, context)?;
    Ok(HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(html))
}
