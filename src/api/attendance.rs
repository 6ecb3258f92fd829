use crate::{
    error::AppError,
    model::attendance::{AttendanceRecord, AttendanceStatus},
    model::teacher::Teacher,
    session::subject::ActiveSubject,
    utils::dates,
};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkAttendanceRequest {
    #[schema(example = 1)]
    pub teacher_id: i64,
    #[schema(example = "2024-01-01", format = "date")]
    pub date: String,
    /// One of `Present`, `Absent`, `Leave`
    #[schema(example = "Present")]
    pub status: String,
    #[schema(example = "", nullable = true)]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkAttendanceResponse {
    #[schema(example = true)]
    pub success: bool,
    /// Id of the created or updated record
    #[schema(example = 1)]
    pub id: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateParams {
    /// `YYYY-MM-DD`, defaults to today
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceFilter {
    /// Only records of this teacher
    pub teacher_id: Option<String>,
    /// Only records of this `YYYY-MM-DD` date
    pub date: Option<String>,
}

/// Teachers of the active subject with their status for a date
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(DateParams),
    responses(
        (status = 200, description = "One entry per teacher, status is null when unmarked", body = [crate::model::attendance::TeacherDayStatus]),
        (status = 400, description = "Invalid date or no subject selected"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn attendance_for_date(
    subject: ActiveSubject,
    pool: web::Data<SqlitePool>,
    query: web::Query<DateParams>,
) -> Result<impl Responder, AppError> {
    let date = dates::date_or_today(query.date.as_deref())?;
    let roster = AttendanceRecord::roster_for_date(pool.get_ref(), &date, subject.as_str()).await?;
    Ok(HttpResponse::Ok().json(roster))
}

/// Mark attendance, creating or replacing the teacher's record for the date
#[utoipa::path(
    post,
    path = "/api/mark_attendance",
    request_body(
        content = MarkAttendanceRequest,
        description = "JSON or form-encoded attendance mark",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Attendance recorded", body = MarkAttendanceResponse),
        (status = 400, description = "Invalid date or status", body = Object, example = json!({
            "message": "Invalid status \"Late\". Allowed: Present, Absent, Leave"
        })),
        (status = 404, description = "Teacher not in the active subject", body = Object, example = json!({
            "message": "Teacher not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    subject: ActiveSubject,
    pool: web::Data<SqlitePool>,
    body: web::Either<web::Json<MarkAttendanceRequest>, web::Form<MarkAttendanceRequest>>,
) -> Result<impl Responder, AppError> {
    let payload = match body {
        web::Either::Left(json) => json.into_inner(),
        web::Either::Right(form) => form.into_inner(),
    };

    // 1️⃣ validate input
    let date = dates::parse_date(&payload.date)?;
    let status: AttendanceStatus = payload.status.trim().parse().map_err(|_| {
        AppError::bad_request(format!(
            "Invalid status {:?}. Allowed: Present, Absent, Leave",
            payload.status
        ))
    })?;

    // 2️⃣ teacher must belong to the active subject
    if Teacher::find_in_subject(pool.get_ref(), payload.teacher_id, subject.as_str())
        .await?
        .is_none()
    {
        return Err(AppError::not_found("Teacher not found"));
    }

    // 3️⃣ insert or update in one statement
    let note = payload.note.as_deref().unwrap_or("");
    let id = AttendanceRecord::upsert(
        pool.get_ref(),
        payload.teacher_id,
        &date,
        status,
        note,
        subject.as_str(),
    )
    .await?;

    debug!(id, teacher_id = payload.teacher_id, date = %date, %status, "Attendance marked");
    Ok(HttpResponse::Ok().json(MarkAttendanceResponse { success: true, id }))
}

/// Raw attendance records of the active subject
#[utoipa::path(
    get,
    path = "/api/get_attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Matching records", body = [AttendanceRecord]),
        (status = 400, description = "Invalid filter or no subject selected"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn get_attendance(
    subject: ActiveSubject,
    pool: web::Data<SqlitePool>,
    query: web::Query<AttendanceFilter>,
) -> Result<impl Responder, AppError> {
    let teacher_id = match query.teacher_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(
            raw.parse::<i64>()
                .map_err(|_| AppError::bad_request(format!("Invalid teacher_id {raw:?}")))?,
        ),
        _ => None,
    };
    let date = match query.date.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(dates::parse_date(raw)?),
        _ => None,
    };

    let records = AttendanceRecord::filter(
        pool.get_ref(),
        subject.as_str(),
        teacher_id,
        date.as_deref(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(records))
}
