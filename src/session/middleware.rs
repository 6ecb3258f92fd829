use crate::config::Config;
use crate::session::SESSION_COOKIE;
use crate::session::subject::ActiveSubject;
use crate::session::token::verify_subject_token;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use tracing::debug;

/// Resolves the session cookie into an [`ActiveSubject`] request extension.
///
/// A missing, invalid or expired cookie, or one naming a subject that is no
/// longer configured, leaves the request without a subject; handlers decide
/// how to react.
pub async fn subject_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        match verify_subject_token(cookie.value(), &config.session_secret) {
            Ok(claims) if config.is_known_subject(&claims.sub) => {
                req.extensions_mut().insert(ActiveSubject::new(claims.sub));
            }
            Ok(claims) => debug!(subject = %claims.sub, "Session names an unknown subject"),
            Err(e) => debug!(error = %e, "Ignoring invalid session cookie"),
        }
    }

    next.call(req).await
}
