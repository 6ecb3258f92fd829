use crate::api::attendance::{MarkAttendanceRequest, MarkAttendanceResponse};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, TeacherDayStatus};
use crate::model::teacher::Teacher;
use utoipa::OpenApi;
use utoipa::openapi;

/// Prefix the handlers declare their paths under.
pub const DOCUMENTED_PREFIX: &str = "/api";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Teacher Attendance API",
        version = "1.0.0",
        description = r#"
## Teacher Attendance

JSON endpoints behind the attendance pages. Teachers are registered per
**subject**; every endpoint works on the subject selected in the browser
session (`POST /select_subject`), and answers `400` when none is selected.

### 🔹 Key Features
- **Teachers**: list the teachers of the active subject, delete a teacher with its records
- **Attendance**: mark a status per teacher and day, query by date or teacher

Marking the same teacher twice on one day replaces the earlier status.
"#,
    ),
    paths(
        crate::api::teacher::list_teachers,
        crate::api::teacher::delete_teacher,

        crate::api::attendance::attendance_for_date,
        crate::api::attendance::mark_attendance,
        crate::api::attendance::get_attendance
    ),
    components(
        schemas(
            Teacher,
            AttendanceRecord,
            AttendanceStatus,
            TeacherDayStatus,
            MarkAttendanceRequest,
            MarkAttendanceResponse
        )
    ),
    tags(
        (name = "Teacher", description = "Teacher registry APIs"),
        (name = "Attendance", description = "Attendance marking and query APIs"),
    )
)]
pub struct ApiDoc;

/// The API document with its paths moved under `api_prefix`.
pub fn openapi_for_prefix(api_prefix: &str) -> openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    let prefix = api_prefix.trim_end_matches('/');
    if prefix == DOCUMENTED_PREFIX {
        return doc;
    }

    let paths = std::mem::take(&mut doc.paths.paths);
    doc.paths.paths = paths
        .into_iter()
        .map(|(path, item)| match path.strip_prefix(DOCUMENTED_PREFIX) {
            Some(rest) => (format!("{prefix}{rest}"), item),
            None => (path, item),
        })
        .collect();
    doc
}
