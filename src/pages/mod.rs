pub mod attendance;
pub mod dashboard;
pub mod subject;
pub mod teacher;

use tera::Context;

use crate::session::subject::ActiveSubject;

/// Context shared by every page: the subject shown in the navigation bar.
fn page_context(subject: Option<&ActiveSubject>) -> Context {
    let mut ctx = Context::new();
    ctx.insert("current_subject", &subject.map(ActiveSubject::as_str));
    ctx.insert("message", "");
    ctx
}
