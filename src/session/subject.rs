use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

use crate::{config::Config, error::AppError};

/// The subject selected in this browser session.
///
/// Inserted into request extensions by
/// [`subject_middleware`](crate::session::middleware::subject_middleware);
/// handlers take it as an argument instead of reading session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSubject(String);

impl ActiveSubject {
    pub fn new(subject: impl Into<String>) -> Self {
        ActiveSubject(subject.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequest for ActiveSubject {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(subject) = req.extensions().get::<ActiveSubject>() {
            return ready(Ok(subject.clone()));
        }

        let api = req
            .app_data::<Data<Config>>()
            .map(|config| req.path().starts_with(&config.api_prefix))
            .unwrap_or(false);

        ready(Err(AppError::SubjectRequired { api }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn reads_subject_from_extensions() {
        let req = TestRequest::get().uri("/").to_http_request();
        req.extensions_mut().insert(ActiveSubject::new("TCS 303"));

        let subject = ActiveSubject::extract(&req).await.unwrap();
        assert_eq!(subject.as_str(), "TCS 303");
    }

    #[actix_web::test]
    async fn missing_subject_depends_on_path() {
        let config = Data::new(Config {
            server_addr: "127.0.0.1:0".to_string(),
            database_url: "sqlite::memory:".to_string(),
            session_secret: "secret".to_string(),
            session_ttl: 60,
            subjects: vec!["TCS 302".to_string()],
            rate_api_per_min: 0,
            api_prefix: "/api".to_string(),
            backup_path: "backup.db".into(),
        });

        let page = TestRequest::get()
            .uri("/mark_attendance")
            .app_data(config.clone())
            .to_http_request();
        assert!(matches!(
            ActiveSubject::extract(&page).await,
            Err(AppError::SubjectRequired { api: false })
        ));

        let api = TestRequest::get()
            .uri("/api/teachers")
            .app_data(config)
            .to_http_request();
        assert!(matches!(
            ActiveSubject::extract(&api).await,
            Err(AppError::SubjectRequired { api: true })
        ));
    }
}
