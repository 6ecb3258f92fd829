pub mod middleware;
pub mod subject;
pub mod token;

/// Cookie carrying the signed active-subject token.
pub const SESSION_COOKIE: &str = "subject_session";
