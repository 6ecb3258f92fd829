use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Ada",
        "department": "CS",
        "employee_id": "E1",
        "subject": "TCS 302"
    })
)]
pub struct Teacher {
    #[schema(example = 1)]
    pub id: i64,

    #[schema(example = "Ada")]
    pub name: String,

    #[schema(example = "CS")]
    pub department: String,

    /// Institution-assigned identifier, unique per subject
    #[schema(example = "E1")]
    pub employee_id: String,

    #[schema(example = "TCS 302")]
    pub subject: String,
}

/// Registration form fields. The subject comes from the session.
#[derive(Debug, Deserialize)]
pub struct NewTeacher {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub employee_id: String,
}

impl NewTeacher {
    /// Trimmed copy, or `None` if any field is blank.
    pub fn normalized(&self) -> Option<NewTeacher> {
        let name = self.name.trim();
        let department = self.department.trim();
        let employee_id = self.employee_id.trim();
        if name.is_empty() || department.is_empty() || employee_id.is_empty() {
            return None;
        }
        Some(NewTeacher {
            name: name.to_string(),
            department: department.to_string(),
            employee_id: employee_id.to_string(),
        })
    }
}

impl Teacher {
    pub async fn list_by_subject(
        pool: &SqlitePool,
        subject: &str,
    ) -> Result<Vec<Teacher>, sqlx::Error> {
        sqlx::query_as::<_, Teacher>(
            r#"
            SELECT id, name, department, employee_id, subject
            FROM teachers
            WHERE subject = ?
            ORDER BY name, id
            "#,
        )
        .bind(subject)
        .fetch_all(pool)
        .await
    }

    pub async fn find_in_subject(
        pool: &SqlitePool,
        id: i64,
        subject: &str,
    ) -> Result<Option<Teacher>, sqlx::Error> {
        sqlx::query_as::<_, Teacher>(
            r#"
            SELECT id, name, department, employee_id, subject
            FROM teachers
            WHERE id = ? AND subject = ?
            "#,
        )
        .bind(id)
        .bind(subject)
        .fetch_optional(pool)
        .await
    }

    pub async fn count_by_subject(pool: &SqlitePool, subject: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM teachers WHERE subject = ?")
            .bind(subject)
            .fetch_one(pool)
            .await
    }

    /// Inserts a teacher and returns its id. A repeated
    /// `(employee_id, subject)` pair fails with a unique violation.
    pub async fn insert(
        pool: &SqlitePool,
        teacher: &NewTeacher,
        subject: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO teachers (name, department, employee_id, subject)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&teacher.name)
        .bind(&teacher.department)
        .bind(&teacher.employee_id)
        .bind(subject)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Deletes a teacher of `subject` together with its attendance rows.
    /// Returns false when no such teacher exists.
    pub async fn delete_with_attendance(
        pool: &SqlitePool,
        id: i64,
        subject: &str,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let found = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM teachers WHERE id = ? AND subject = ?",
        )
        .bind(id)
        .bind(subject)
        .fetch_optional(&mut *tx)
        .await?;

        if found.is_none() {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM attendance WHERE teacher_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM teachers WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
