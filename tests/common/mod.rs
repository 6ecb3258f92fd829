#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::web::Data;
use sqlx::SqlitePool;
use teacher_attendance::{
    AppState,
    config::{Config, DEFAULT_SUBJECTS, parse_subjects},
    db::init_db,
    model::teacher::{NewTeacher, Teacher},
    session::{SESSION_COOKIE, token::issue_subject_token},
    templates,
};
use tempfile::TempDir;

pub const SECRET: &str = "test-secret";

pub struct TestContext {
    pub state: AppState,
    pub pool: SqlitePool,
    // keeps the database file alive for the test
    _dir: TempDir,
}

pub fn test_config(database_url: String) -> Config {
    Config {
        server_addr: "127.0.0.1:0".to_string(),
        database_url,
        session_secret: SECRET.to_string(),
        session_ttl: 3600,
        subjects: parse_subjects(DEFAULT_SUBJECTS),
        rate_api_per_min: 0,
        api_prefix: "/api".to_string(),
        backup_path: "unused_backup.db".into(),
    }
}

pub async fn setup() -> TestContext {
    let dir = tempfile::tempdir().unwrap();
    let database_url = format!("sqlite://{}", dir.path().join("attendance.db").display());
    let pool = init_db(&database_url).await.unwrap();

    let state = AppState {
        pool: pool.clone(),
        config: Data::new(test_config(database_url)),
        templates: Data::new(templates::load().unwrap()),
    };

    TestContext {
        state,
        pool,
        _dir: dir,
    }
}

/// Session cookie for `subject`, as `POST /select_subject` would set it.
pub fn subject_cookie(subject: &str) -> Cookie<'static> {
    let token = issue_subject_token(subject, SECRET, 3600).unwrap();
    Cookie::new(SESSION_COOKIE, token)
}

pub async fn add_teacher(pool: &SqlitePool, name: &str, employee_id: &str, subject: &str) -> i64 {
    let teacher = NewTeacher {
        name: name.to_string(),
        department: "CS".to_string(),
        employee_id: employee_id.to_string(),
    };
    Teacher::insert(pool, &teacher, subject).await.unwrap()
}

pub async fn attendance_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM attendance")
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn teacher_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM teachers")
        .fetch_one(pool)
        .await
        .unwrap()
}
