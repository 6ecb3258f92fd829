use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Leave,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = 1)]
    pub teacher_id: i64,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub date: String,
    #[schema(example = "Present")]
    pub status: String,
    #[schema(example = "", nullable = true)]
    pub note: Option<String>,
    #[schema(example = "TCS 302")]
    pub subject: String,
}

/// A marked record joined with the teacher it belongs to.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AttendanceEntry {
    pub id: i64,
    pub teacher_name: String,
    pub department: String,
    pub employee_id: String,
    pub status: String,
    pub note: Option<String>,
}

/// One teacher of a subject and whatever was recorded for them on a date.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct TeacherDayStatus {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Ada")]
    pub name: String,
    #[schema(example = "CS")]
    pub department: String,
    #[schema(example = "E1")]
    pub employee_id: String,
    /// `null` when nothing was marked for the date
    #[schema(example = "Present", nullable = true)]
    pub status: Option<String>,
    #[schema(nullable = true)]
    pub note: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub present: i64,
    pub absent: i64,
    pub leave: i64,
}

impl StatusCounts {
    pub fn total(&self) -> i64 {
        self.present + self.absent + self.leave
    }

    fn add(&mut self, status: &str, count: i64) {
        match status.parse::<AttendanceStatus>() {
            Ok(AttendanceStatus::Present) => self.present += count,
            Ok(AttendanceStatus::Absent) => self.absent += count,
            Ok(AttendanceStatus::Leave) => self.leave += count,
            Err(_) => tracing::warn!(status, count, "Ignoring unknown attendance status"),
        }
    }
}

impl AttendanceRecord {
    /// Creates the record for `(teacher_id, date, subject)` or overwrites its
    /// status and note. Returns the record id.
    pub async fn upsert(
        pool: &SqlitePool,
        teacher_id: i64,
        date: &str,
        status: AttendanceStatus,
        note: &str,
        subject: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO attendance (teacher_id, date, status, note, subject)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (teacher_id, date, subject)
            DO UPDATE SET status = excluded.status, note = excluded.note
            RETURNING id
            "#,
        )
        .bind(teacher_id)
        .bind(date)
        .bind(status.as_ref())
        .bind(note)
        .bind(subject)
        .fetch_one(pool)
        .await
    }

    pub async fn list_for_date(
        pool: &SqlitePool,
        date: &str,
        subject: &str,
    ) -> Result<Vec<AttendanceEntry>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceEntry>(
            r#"
            SELECT a.id, t.name AS teacher_name, t.department, t.employee_id, a.status, a.note
            FROM attendance a
            JOIN teachers t ON a.teacher_id = t.id
            WHERE a.date = ? AND a.subject = ?
            ORDER BY t.name, a.id
            "#,
        )
        .bind(date)
        .bind(subject)
        .fetch_all(pool)
        .await
    }

    /// Every teacher of `subject`, with the status marked on `date` if any.
    pub async fn roster_for_date(
        pool: &SqlitePool,
        date: &str,
        subject: &str,
    ) -> Result<Vec<TeacherDayStatus>, sqlx::Error> {
        sqlx::query_as::<_, TeacherDayStatus>(
            r#"
            SELECT t.id, t.name, t.department, t.employee_id, a.status, a.note
            FROM teachers t
            LEFT JOIN attendance a
                ON a.teacher_id = t.id AND a.date = ? AND a.subject = t.subject
            WHERE t.subject = ?
            ORDER BY t.name, t.id
            "#,
        )
        .bind(date)
        .bind(subject)
        .fetch_all(pool)
        .await
    }

    /// Raw records of `subject`, optionally narrowed by teacher and date.
    pub async fn filter(
        pool: &SqlitePool,
        subject: &str,
        teacher_id: Option<i64>,
        date: Option<&str>,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        let mut sql = String::from(
            "SELECT id, teacher_id, date, status, note, subject FROM attendance WHERE subject = ?",
        );
        if teacher_id.is_some() {
            sql.push_str(" AND teacher_id = ?");
        }
        if date.is_some() {
            sql.push_str(" AND date = ?");
        }
        sql.push_str(" ORDER BY date, id");
        tracing::debug!(sql = %sql, subject, ?teacher_id, ?date, "Filtering attendance");

        let mut query = sqlx::query_as::<_, AttendanceRecord>(&sql).bind(subject);
        if let Some(teacher_id) = teacher_id {
            query = query.bind(teacher_id);
        }
        if let Some(date) = date {
            query = query.bind(date);
        }
        query.fetch_all(pool).await
    }

    pub async fn count_by_status(
        pool: &SqlitePool,
        date: &str,
        subject: &str,
    ) -> Result<StatusCounts, sqlx::Error> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM attendance
            WHERE date = ? AND subject = ?
            GROUP BY status
            "#,
        )
        .bind(date)
        .bind(subject)
        .fetch_all(pool)
        .await?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            counts.add(&status, count);
        }
        Ok(counts)
    }
}
