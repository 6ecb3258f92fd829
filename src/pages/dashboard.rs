use actix_web::{HttpResponse, web};
use sqlx::SqlitePool;
use tera::Tera;

use crate::{
    error::AppError,
    model::{attendance::AttendanceRecord, teacher::Teacher},
    pages::page_context,
    session::subject::ActiveSubject,
    templates,
    utils::dates,
};

/// Today's totals for the active subject.
pub async fn dashboard(
    subject: ActiveSubject,
    pool: web::Data<SqlitePool>,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, AppError> {
    let today = dates::today();

    let total_teachers = Teacher::count_by_subject(pool.get_ref(), subject.as_str()).await?;
    let counts = AttendanceRecord::count_by_status(pool.get_ref(), &today, subject.as_str()).await?;

    let mut ctx = page_context(Some(&subject));
    ctx.insert("today", &today);
    ctx.insert("total_teachers", &total_teachers);
    ctx.insert("present_count", &counts.present);
    ctx.insert("absent_count", &counts.absent);
    ctx.insert("leave_count", &counts.leave);
    ctx.insert("unmarked_count", &(total_teachers - counts.total()).max(0));

    templates::render(&tera, "dashboard.html", &ctx)
}
