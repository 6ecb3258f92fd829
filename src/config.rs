use anyhow::{Context, anyhow};
use dotenvy::dotenv;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://teacher_attendance.db";
pub const DEFAULT_BACKUP_PATH: &str = "teacher_attendance_backup.db";
pub const DEFAULT_SUBJECTS: &str = "TCS 302,TCS 303,TCS 304,TCS 305";

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,
    pub session_secret: String,
    pub session_ttl: usize,

    /// Subjects a browser session may select, in display order
    pub subjects: Vec<String>,

    // Rate limiting for the JSON API, 0 disables it
    pub rate_api_per_min: u32,

    pub api_prefix: String,
    pub backup_path: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        let subjects = parse_subjects(
            &env::var("SUBJECTS").unwrap_or_else(|_| DEFAULT_SUBJECTS.to_string()),
        );
        if subjects.is_empty() {
            return Err(anyhow!("SUBJECTS must name at least one subject"));
        }

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            session_secret: env::var("SESSION_SECRET").context("SESSION_SECRET must be set")?,
            session_ttl: env_or("SESSION_TTL", 86_400)?, // default 1 day
            subjects,
            rate_api_per_min: env_or("RATE_API_PER_MIN", 600)?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            backup_path: env::var("BACKUP_PATH")
                .unwrap_or_else(|_| DEFAULT_BACKUP_PATH.to_string())
                .into(),
        })
    }

    pub fn is_known_subject(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s == subject)
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} has an invalid value {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}

/// Splits a comma separated subject list, dropping blanks and duplicates.
pub fn parse_subjects(raw: &str) -> Vec<String> {
    let mut subjects: Vec<String> = Vec::new();
    for subject in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !subjects.iter().any(|s| s == subject) {
            subjects.push(subject.to_string());
        }
    }
    subjects
}
