use crate::{error::AppError, model::teacher::Teacher, session::subject::ActiveSubject};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;

/// Teachers of the active subject
#[utoipa::path(
    get,
    path = "/api/teachers",
    responses(
        (status = 200, description = "Teachers registered under the active subject", body = [Teacher]),
        (status = 400, description = "No subject selected", body = Object, example = json!({
            "message": "No subject selected"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Teacher"
)]
pub async fn list_teachers(
    subject: ActiveSubject,
    pool: web::Data<SqlitePool>,
) -> Result<impl Responder, AppError> {
    let teachers = Teacher::list_by_subject(pool.get_ref(), subject.as_str()).await?;
    Ok(HttpResponse::Ok().json(teachers))
}

/// Delete a teacher and all of its attendance records
#[utoipa::path(
    delete,
    path = "/api/delete_teacher/{id}",
    params(
        ("id", Path, description = "Teacher id")
    ),
    responses(
        (status = 200, description = "Teacher deleted", body = Object, example = json!({
            "success": true,
            "message": "Teacher deleted successfully"
        })),
        (status = 404, description = "No such teacher in the active subject", body = Object, example = json!({
            "message": "Teacher not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Teacher"
)]
pub async fn delete_teacher(
    subject: ActiveSubject,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let teacher_id = path.into_inner();

    let deleted = Teacher::delete_with_attendance(pool.get_ref(), teacher_id, subject.as_str()).await?;
    if !deleted {
        return Err(AppError::not_found("Teacher not found"));
    }

    info!(teacher_id, subject = subject.as_str(), "Teacher deleted");
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Teacher deleted successfully"
    })))
}
