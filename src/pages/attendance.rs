use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::SqlitePool;
use strum::IntoEnumIterator;
use tera::Tera;

use crate::{
    config::Config,
    error::AppError,
    model::attendance::{AttendanceRecord, AttendanceStatus},
    pages::page_context,
    session::subject::ActiveSubject,
    templates,
    utils::dates,
};

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

/// Every teacher of the subject with the status already marked today.
pub async fn mark_attendance_page(
    subject: ActiveSubject,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, AppError> {
    let today = dates::today();
    let teachers = AttendanceRecord::roster_for_date(pool.get_ref(), &today, subject.as_str()).await?;
    let statuses: Vec<String> = AttendanceStatus::iter().map(|s| s.to_string()).collect();

    let mut ctx = page_context(Some(&subject));
    ctx.insert("today", &today);
    ctx.insert("teachers", &teachers);
    ctx.insert("statuses", &statuses);
    ctx.insert("api_prefix", &config.api_prefix);

    templates::render(&tera, "mark_attendance.html", &ctx)
}

pub async fn view_attendance(
    subject: ActiveSubject,
    pool: web::Data<SqlitePool>,
    tera: web::Data<Tera>,
    query: web::Query<DateQuery>,
) -> Result<HttpResponse, AppError> {
    let date = dates::date_or_today(query.date.as_deref())?;

    let attendance_data = AttendanceRecord::list_for_date(pool.get_ref(), &date, subject.as_str()).await?;
    let counts = AttendanceRecord::count_by_status(pool.get_ref(), &date, subject.as_str()).await?;

    let mut ctx = page_context(Some(&subject));
    ctx.insert("selected_date", &date);
    ctx.insert("attendance_data", &attendance_data);
    ctx.insert("counts", &counts);

    templates::render(&tera, "view_attendance.html", &ctx)
}
