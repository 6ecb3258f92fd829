use actix_web::{HttpResponse, http::StatusCode, web};
use sqlx::SqlitePool;
use tera::Tera;
use tracing::{error, info};

use crate::{
    error::{AppError, is_unique_violation},
    model::teacher::{NewTeacher, Teacher},
    pages::page_context,
    session::subject::ActiveSubject,
    templates,
};

pub async fn add_teacher_form(
    subject: ActiveSubject,
    tera: web::Data<Tera>,
) -> Result<HttpResponse, AppError> {
    let ctx = page_context(Some(&subject));
    templates::render(&tera, "add_teacher.html", &ctx)
}

/// Registers a teacher under the active subject.
///
/// The `(employee_id, subject)` uniqueness is left to the store; a duplicate
/// re-renders the form with an error and changes nothing.
pub async fn add_teacher(
    subject: ActiveSubject,
    pool: web::Data<SqlitePool>,
    tera: web::Data<Tera>,
    form: web::Form<NewTeacher>,
) -> Result<HttpResponse, AppError> {
    let mut ctx = page_context(Some(&subject));

    let Some(teacher) = form.normalized() else {
        ctx.insert("message", "Error: Name, department and employee ID are required!");
        return templates::render_with_status(&tera, StatusCode::BAD_REQUEST, "add_teacher.html", &ctx);
    };

    match Teacher::insert(pool.get_ref(), &teacher, subject.as_str()).await {
        Ok(id) => {
            info!(id, employee_id = %teacher.employee_id, subject = subject.as_str(), "Teacher added");
            ctx.insert("message", "Teacher added successfully!");
            templates::render(&tera, "add_teacher.html", &ctx)
        }
        Err(e) if is_unique_violation(&e) => {
            ctx.insert(
                "message",
                "Error: Teacher with this employee ID already exists for this subject!",
            );
            templates::render_with_status(&tera, StatusCode::CONFLICT, "add_teacher.html", &ctx)
        }
        Err(e) => {
            error!(error = %e, employee_id = %teacher.employee_id, "Failed to add teacher");
            Err(e.into())
        }
    }
}
