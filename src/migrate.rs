//! Versioned schema migrations for the attendance database.
//!
//! The schema version lives in `PRAGMA user_version`. Files written before
//! versioning existed carry version 0 and are classified by their shape.
//!
//! Migrations are applied out-of-band by the `migrate` binary. Before the
//! first pending migration runs, the database file is copied to a backup
//! path; each migration runs in its own transaction, and if any of them
//! fails the transaction is rolled back and the backup is copied back over
//! the database file, so a failed run leaves the file as it was.
//!
//! The server only calls [`ensure_current`], which creates the current
//! schema in an empty file and refuses to start on an outdated one.

use anyhow::{Context, anyhow, bail};
use futures::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{Connection, SqliteConnection, SqlitePool};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Subject assigned to rows that predate subject partitioning.
pub const DEFAULT_SUBJECT: &str = "TCS 302";

pub const LATEST_VERSION: i64 = 3;

pub type MigrationFn = for<'c> fn(&'c mut SqliteConnection) -> BoxFuture<'c, Result<(), sqlx::Error>>;

pub struct Migration {
    /// Schema version after this migration has run
    pub version: i64,
    pub description: &'static str,
    pub up: MigrationFn,
}

/// All migrations in version order.
pub fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Create teachers and attendance tables",
            up: create_base_tables,
        },
        Migration {
            version: 2,
            description: "Add subject column to teachers and attendance",
            up: add_subject_columns,
        },
        Migration {
            version: 3,
            description: "Scope uniqueness by subject and cascade attendance deletes",
            up: rebuild_with_subject_constraints,
        },
    ]
}

const CURRENT_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS teachers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        department TEXT NOT NULL,
        employee_id TEXT NOT NULL,
        subject TEXT NOT NULL,
        UNIQUE(employee_id, subject)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        teacher_id INTEGER NOT NULL,
        date TEXT NOT NULL,
        status TEXT NOT NULL,
        note TEXT,
        subject TEXT NOT NULL,
        FOREIGN KEY (teacher_id) REFERENCES teachers (id) ON DELETE CASCADE,
        UNIQUE(teacher_id, date, subject)
    )
    "#,
];

fn create_base_tables(conn: &mut SqliteConnection) -> BoxFuture<'_, Result<(), sqlx::Error>> {
    Box::pin(async move {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS teachers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                department TEXT NOT NULL,
                employee_id TEXT UNIQUE NOT NULL
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS attendance (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                teacher_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                status TEXT NOT NULL,
                note TEXT,
                FOREIGN KEY (teacher_id) REFERENCES teachers (id)
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;

        Ok(())
    })
}

fn add_subject_columns(conn: &mut SqliteConnection) -> BoxFuture<'_, Result<(), sqlx::Error>> {
    Box::pin(async move {
        for table in ["teachers", "attendance"] {
            if !has_column(&mut *conn, table, "subject").await? {
                let sql = format!(
                    "ALTER TABLE {table} ADD COLUMN subject TEXT DEFAULT '{DEFAULT_SUBJECT}'"
                );
                sqlx::query(&sql).execute(&mut *conn).await?;
            }
        }
        Ok(())
    })
}

// Build the new tables first and drop the old ones before renaming: renaming
// a referenced table would rewrite the foreign key in `attendance` to follow it.
// Attendance rows are copied with a plain INSERT, so two marks for the same
// teacher, date and subject fail the migration instead of losing one of them.
fn rebuild_with_subject_constraints(
    conn: &mut SqliteConnection,
) -> BoxFuture<'_, Result<(), sqlx::Error>> {
    Box::pin(async move {
        let steps = [
            r#"
            CREATE TABLE teachers_new (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                department TEXT NOT NULL,
                employee_id TEXT NOT NULL,
                subject TEXT NOT NULL,
                UNIQUE(employee_id, subject)
            )
            "#,
            r#"
            INSERT OR IGNORE INTO teachers_new (id, name, department, employee_id, subject)
            SELECT id, name, department, employee_id, COALESCE(subject, 'TCS 302')
            FROM teachers
            "#,
            r#"
            CREATE TABLE attendance_new (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                teacher_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                status TEXT NOT NULL,
                note TEXT,
                subject TEXT NOT NULL,
                FOREIGN KEY (teacher_id) REFERENCES teachers (id) ON DELETE CASCADE,
                UNIQUE(teacher_id, date, subject)
            )
            "#,
            r#"
            INSERT INTO attendance_new (id, teacher_id, date, status, note, subject)
            SELECT a.id, a.teacher_id, a.date, a.status, a.note,
                   COALESCE(a.subject, t.subject, 'TCS 302')
            FROM attendance a
            JOIN teachers t ON a.teacher_id = t.id
            "#,
            "DROP TABLE attendance",
            "DROP TABLE teachers",
            "ALTER TABLE teachers_new RENAME TO teachers",
            "ALTER TABLE attendance_new RENAME TO attendance",
        ];

        for step in steps {
            sqlx::query(step).execute(&mut *conn).await?;
        }
        Ok(())
    })
}

async fn has_column(
    conn: &mut SqliteConnection,
    table: &str,
    column: &str,
) -> Result<bool, sqlx::Error> {
    let columns = sqlx::query_scalar::<_, String>("SELECT name FROM pragma_table_info(?)")
        .bind(table)
        .fetch_all(&mut *conn)
        .await?;
    Ok(columns.iter().any(|c| c == column))
}

async fn set_user_version(conn: &mut SqliteConnection, version: i64) -> Result<(), sqlx::Error> {
    // PRAGMA arguments cannot be bound
    sqlx::query(&format!("PRAGMA user_version = {version}"))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Schema version of an open database, classifying unversioned files.
pub async fn detect_version(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let version = sqlx::query_scalar::<_, i64>("PRAGMA user_version")
        .fetch_one(&mut *conn)
        .await?;
    if version > 0 {
        return Ok(version);
    }

    let has_teachers = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'teachers'",
    )
    .fetch_one(&mut *conn)
    .await?;
    if has_teachers == 0 {
        return Ok(0);
    }

    // version 2 only once both tables carry the column
    if has_column(&mut *conn, "teachers", "subject").await?
        && has_column(&mut *conn, "attendance", "subject").await?
    {
        Ok(2)
    } else {
        Ok(1)
    }
}

/// Called at server start-up: initializes an empty database with the
/// current schema and rejects databases that still need migrating.
pub async fn ensure_current(pool: &SqlitePool) -> anyhow::Result<()> {
    let mut conn = pool.acquire().await?;
    let version = detect_version(&mut *conn).await?;

    match version {
        0 => {
            let mut tx = conn.begin().await?;
            for statement in CURRENT_SCHEMA {
                sqlx::query(statement).execute(&mut *tx).await?;
            }
            set_user_version(&mut *tx, LATEST_VERSION).await?;
            tx.commit().await?;
            info!(version = LATEST_VERSION, "Initialized empty database");
            Ok(())
        }
        LATEST_VERSION => Ok(()),
        v if v > LATEST_VERSION => bail!(
            "database schema version {v} is newer than the supported version {LATEST_VERSION}"
        ),
        v => bail!(
            "database schema is at version {v} but version {LATEST_VERSION} is required; \
             run the `migrate` tool first"
        ),
    }
}

/// Turns `sqlite://file.db?mode=rwc`, `sqlite:file.db` or a bare path into a file path.
pub fn database_path(database: &str) -> PathBuf {
    let path = database
        .strip_prefix("sqlite://")
        .or_else(|| database.strip_prefix("sqlite:"))
        .unwrap_or(database);
    let path = path.split('?').next().unwrap_or(path);
    PathBuf::from(path)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: i64,
    pub to_version: i64,
    pub applied: Vec<i64>,
    /// Snapshot taken before migrating, if anything was pending
    pub backup: Option<PathBuf>,
}

async fn open(db_path: &Path, read_only: bool) -> Result<SqliteConnection, sqlx::Error> {
    let mut options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(false)
        .read_only(read_only)
        .foreign_keys(false);
    if !read_only {
        // the backup is a plain file copy, keep everything in the main file
        options = options.journal_mode(SqliteJournalMode::Delete);
    }
    SqliteConnection::connect_with(&options).await
}

/// Schema version of the file at `db_path`, without modifying it.
pub async fn status(db_path: &Path) -> anyhow::Result<i64> {
    ensure_exists(db_path)?;
    let mut conn = open(db_path, true)
        .await
        .with_context(|| format!("opening {}", db_path.display()))?;
    let version = detect_version(&mut conn).await?;
    conn.close().await?;
    Ok(version)
}

/// Applies every pending migration to the file at `db_path`.
pub async fn run(db_path: &Path, backup_path: &Path) -> anyhow::Result<MigrationReport> {
    run_with(db_path, backup_path, &all_migrations()).await
}

pub async fn run_with(
    db_path: &Path,
    backup_path: &Path,
    migrations: &[Migration],
) -> anyhow::Result<MigrationReport> {
    let from_version = status(db_path).await?;
    let pending: Vec<&Migration> = migrations
        .iter()
        .filter(|m| m.version > from_version)
        .collect();

    if pending.is_empty() {
        info!(version = from_version, "Database schema is up to date");
        return Ok(MigrationReport {
            from_version,
            to_version: from_version,
            applied: Vec::new(),
            backup: None,
        });
    }

    fs::copy(db_path, backup_path).with_context(|| {
        format!(
            "creating backup {} of {}",
            backup_path.display(),
            db_path.display()
        )
    })?;
    info!(backup = %backup_path.display(), "Created backup");

    let mut conn = open(db_path, false)
        .await
        .with_context(|| format!("opening {}", db_path.display()))?;
    let result = apply(&mut conn, &pending).await;
    if let Err(e) = conn.close().await {
        error!(error = %e, "Failed to close migration connection");
    }

    match result {
        Ok(applied) => Ok(MigrationReport {
            from_version,
            to_version: applied.last().copied().unwrap_or(from_version),
            applied,
            backup: Some(backup_path.to_path_buf()),
        }),
        Err(e) => {
            error!(error = ?e, "Migration failed, restoring backup");
            fs::copy(backup_path, db_path).with_context(|| {
                format!(
                    "migration failed ({e:#}) and restoring {} from {} also failed",
                    db_path.display(),
                    backup_path.display()
                )
            })?;
            Err(e.context(format!(
                "database restored from backup {}",
                backup_path.display()
            )))
        }
    }
}

async fn apply(conn: &mut SqliteConnection, pending: &[&Migration]) -> anyhow::Result<Vec<i64>> {
    let mut applied = Vec::with_capacity(pending.len());

    for migration in pending {
        info!(
            version = migration.version,
            description = migration.description,
            "Applying migration"
        );

        let mut tx = conn.begin().await?;
        let outcome = match (migration.up)(&mut *tx).await {
            Ok(()) => set_user_version(&mut *tx, migration.version).await,
            Err(e) => Err(e),
        };

        if let Err(e) = outcome {
            tx.rollback().await?;
            return Err(anyhow!(e).context(format!(
                "migration {} ({}) failed",
                migration.version, migration.description
            )));
        }

        tx.commit().await?;
        applied.push(migration.version);
    }

    Ok(applied)
}

fn ensure_exists(db_path: &Path) -> anyhow::Result<()> {
    if !db_path.exists() {
        bail!("database file {} does not exist", db_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::str::FromStr;
    use tempfile::TempDir;

    fn broken_migration(conn: &mut SqliteConnection) -> BoxFuture<'_, Result<(), sqlx::Error>> {
        Box::pin(async move {
            sqlx::query("ALTER TABLE no_such_table ADD COLUMN extra TEXT")
                .execute(&mut *conn)
                .await?;
            Ok(())
        })
    }

    struct Files {
        _dir: TempDir,
        db: PathBuf,
        backup: PathBuf,
    }

    fn files() -> Files {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("attendance.db");
        let backup = dir.path().join("attendance_backup.db");
        fs::File::create(&db).unwrap();
        Files {
            _dir: dir,
            db,
            backup,
        }
    }

    /// A database as the first release of the app left it.
    async fn seed_version_one(db: &Path) {
        let migrations = all_migrations();
        let report = run_with(db, &db.with_extension("seed"), &migrations[..1])
            .await
            .unwrap();
        assert_eq!(report.to_version, 1);

        // unversioned, like the files written before migrations were tracked
        let mut conn = open(db, false).await.unwrap();
        set_user_version(&mut conn, 0).await.unwrap();
        sqlx::query("INSERT INTO teachers (name, department, employee_id) VALUES ('Ada', 'CS', 'E1')")
            .execute(&mut conn)
            .await
            .unwrap();
        sqlx::query("INSERT INTO attendance (teacher_id, date, status, note) VALUES (1, '2024-01-01', 'Present', '')")
            .execute(&mut conn)
            .await
            .unwrap();
        conn.close().await.unwrap();
    }

    #[actix_web::test]
    async fn classifies_unversioned_files() {
        let f = files();
        assert_eq!(status(&f.db).await.unwrap(), 0);

        seed_version_one(&f.db).await;
        assert_eq!(status(&f.db).await.unwrap(), 1);
    }

    /// A version one file with `subject` columns added by hand, as the
    /// second release of the app left it.
    async fn seed_version_two(db: &Path) {
        seed_version_one(db).await;

        let mut conn = open(db, false).await.unwrap();
        for statement in [
            "ALTER TABLE teachers ADD COLUMN subject TEXT DEFAULT 'TCS 302'",
            "ALTER TABLE attendance ADD COLUMN subject TEXT DEFAULT 'TCS 302'",
            "INSERT INTO teachers (name, department, employee_id, subject) VALUES ('Grace', 'Math', 'E2', 'TCS 304')",
            "INSERT INTO attendance (teacher_id, date, status, note, subject) VALUES (2, '2024-01-01', 'Leave', 'sick', NULL)",
        ] {
            sqlx::query(statement).execute(&mut conn).await.unwrap();
        }
        conn.close().await.unwrap();
    }

    #[actix_web::test]
    async fn classifies_version_two_and_keeps_subjects() {
        let f = files();
        seed_version_two(&f.db).await;
        assert_eq!(status(&f.db).await.unwrap(), 2);

        let report = run(&f.db, &f.backup).await.unwrap();
        assert_eq!(report.from_version, 2);
        assert_eq!(report.applied, vec![3]);

        let mut conn = open(&f.db, false).await.unwrap();
        let teacher_subject: String =
            sqlx::query_scalar("SELECT subject FROM teachers WHERE employee_id = 'E2'")
                .fetch_one(&mut conn)
                .await
                .unwrap();
        assert_eq!(teacher_subject, "TCS 304");

        // a NULL attendance subject falls back to the teacher's subject
        let attendance_subject: String =
            sqlx::query_scalar("SELECT subject FROM attendance WHERE teacher_id = 2")
                .fetch_one(&mut conn)
                .await
                .unwrap();
        assert_eq!(attendance_subject, "TCS 304");
        conn.close().await.unwrap();
    }

    #[actix_web::test]
    async fn partial_subject_columns_are_completed() {
        let f = files();
        seed_version_one(&f.db).await;
        let mut conn = open(&f.db, false).await.unwrap();
        sqlx::query("ALTER TABLE teachers ADD COLUMN subject TEXT DEFAULT 'TCS 302'")
            .execute(&mut conn)
            .await
            .unwrap();
        conn.close().await.unwrap();

        assert_eq!(status(&f.db).await.unwrap(), 1);

        let report = run(&f.db, &f.backup).await.unwrap();
        assert_eq!(report.applied, vec![2, 3]);
        assert_eq!(status(&f.db).await.unwrap(), LATEST_VERSION);
    }

    #[actix_web::test]
    async fn duplicate_marks_fail_the_run_and_restore_backup() {
        let f = files();
        seed_version_one(&f.db).await;
        let mut conn = open(&f.db, false).await.unwrap();
        sqlx::query("INSERT INTO attendance (teacher_id, date, status, note) VALUES (1, '2024-01-01', 'Absent', 'b')")
            .execute(&mut conn)
            .await
            .unwrap();
        conn.close().await.unwrap();
        let before = fs::read(&f.db).unwrap();

        let err = run(&f.db, &f.backup).await.unwrap_err();
        assert!(format!("{err:#}").contains("migration 3"));

        assert_eq!(fs::read(&f.db).unwrap(), before);
        assert_eq!(status(&f.db).await.unwrap(), 1);

        let mut conn = open(&f.db, true).await.unwrap();
        let marks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance WHERE teacher_id = 1")
            .fetch_one(&mut conn)
            .await
            .unwrap();
        assert_eq!(marks, 2);
        conn.close().await.unwrap();
    }

    #[actix_web::test]
    async fn migrates_version_one_and_backfills_subject() {
        let f = files();
        seed_version_one(&f.db).await;

        let report = run(&f.db, &f.backup).await.unwrap();
        assert_eq!(report.from_version, 1);
        assert_eq!(report.applied, vec![2, 3]);
        assert_eq!(report.to_version, LATEST_VERSION);
        assert!(f.backup.exists());

        let mut conn = open(&f.db, false).await.unwrap();
        let subject: String = sqlx::query_scalar("SELECT subject FROM teachers WHERE employee_id = 'E1'")
            .fetch_one(&mut conn)
            .await
            .unwrap();
        assert_eq!(subject, DEFAULT_SUBJECT);

        let attendance_subject: String =
            sqlx::query_scalar("SELECT subject FROM attendance WHERE teacher_id = 1")
                .fetch_one(&mut conn)
                .await
                .unwrap();
        assert_eq!(attendance_subject, DEFAULT_SUBJECT);

        // same employee may now be registered for another subject, not twice for one
        sqlx::query("INSERT INTO teachers (name, department, employee_id, subject) VALUES ('Ada', 'CS', 'E1', 'TCS 303')")
            .execute(&mut conn)
            .await
            .unwrap();
        let duplicate = sqlx::query("INSERT INTO teachers (name, department, employee_id, subject) VALUES ('Ada', 'CS', 'E1', 'TCS 302')")
            .execute(&mut conn)
            .await
            .unwrap_err();
        assert!(crate::error::is_unique_violation(&duplicate));
        conn.close().await.unwrap();

        assert_eq!(status(&f.db).await.unwrap(), LATEST_VERSION);
    }

    #[actix_web::test]
    async fn second_run_is_a_no_op() {
        let f = files();
        run(&f.db, &f.backup).await.unwrap();

        let report = run(&f.db, &f.backup).await.unwrap();
        assert!(report.applied.is_empty());
        assert_eq!(report.to_version, LATEST_VERSION);
        assert_eq!(report.backup, None);
    }

    #[actix_web::test]
    async fn failed_migration_restores_backup() {
        let f = files();
        seed_version_one(&f.db).await;
        let before = fs::read(&f.db).unwrap();

        let mut migrations = all_migrations();
        migrations.push(Migration {
            version: 4,
            description: "broken",
            up: broken_migration,
        });

        let err = run_with(&f.db, &f.backup, &migrations).await.unwrap_err();
        assert!(format!("{err:#}").contains("migration 4 (broken) failed"));

        assert_eq!(fs::read(&f.db).unwrap(), before);
        assert_eq!(status(&f.db).await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.db");
        assert!(run(&missing, &dir.path().join("backup.db")).await.is_err());
        assert!(!missing.exists());
    }

    #[actix_web::test]
    async fn server_start_rejects_outdated_schema() {
        let f = files();
        seed_version_one(&f.db).await;

        let options = SqliteConnectOptions::new().filename(&f.db);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        let err = ensure_current(&pool).await.unwrap_err();
        assert!(err.to_string().contains("run the `migrate` tool"));
        pool.close().await;
    }

    #[actix_web::test]
    async fn server_start_initializes_empty_file() {
        let f = files();
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", f.db.display()))
            .unwrap();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        ensure_current(&pool).await.unwrap();
        ensure_current(&pool).await.unwrap();
        pool.close().await;

        assert_eq!(status(&f.db).await.unwrap(), LATEST_VERSION);
    }

    #[test]
    fn database_urls_map_to_paths() {
        assert_eq!(database_path("sqlite://a/b.db?mode=rwc"), PathBuf::from("a/b.db"));
        assert_eq!(database_path("sqlite:b.db"), PathBuf::from("b.db"));
        assert_eq!(database_path("b.db"), PathBuf::from("b.db"));
    }
}
