mod common;

use actix_web::{http::StatusCode, http::header, test};
use serde_json::Value;
use teacher_attendance::{build_app, session::SESSION_COOKIE};

use common::{setup, subject_cookie};

#[actix_web::test]
async fn pages_redirect_without_subject() {
    let ctx = setup().await;
    let app = test::init_service(build_app(ctx.state.clone())).await;

    for uri in ["/", "/add_teacher", "/mark_attendance", "/view_attendance"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/select_subject",
            "{uri}"
        );
    }
}

#[actix_web::test]
async fn api_requires_subject() {
    let ctx = setup().await;
    let app = test::init_service(build_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri("/api/teachers").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "No subject selected");
}

#[actix_web::test]
async fn selecting_a_subject_sets_the_session() {
    let ctx = setup().await;
    let app = test::init_service(build_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/select_subject")
        .set_form([("subject", "TCS 303")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");

    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .expect("session cookie")
        .into_owned();

    let req = test::TestRequest::get().uri("/").cookie(cookie).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("Subject: TCS 303"));
}

#[actix_web::test]
async fn unknown_subject_is_rejected() {
    let ctx = setup().await;
    let app = test::init_service(build_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/select_subject")
        .set_form([("subject", "XYZ 999")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.response().cookies().next().is_none());

    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("Invalid subject selected"));
}

#[actix_web::test]
async fn subject_page_lists_configured_subjects() {
    let ctx = setup().await;
    let app = test::init_service(build_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri("/select_subject").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    for subject in &ctx.state.config.subjects {
        assert!(html.contains(subject.as_str()), "{subject}");
    }
}

#[actix_web::test]
async fn forged_or_stale_cookies_are_ignored() {
    let ctx = setup().await;
    let app = test::init_service(build_app(ctx.state.clone())).await;

    let forged = actix_web::cookie::Cookie::new(SESSION_COOKIE, "not-a-token");
    let req = test::TestRequest::get().uri("/").cookie(forged).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    // validly signed, but the subject is no longer offered
    let req = test::TestRequest::get()
        .uri("/api/teachers")
        .cookie(subject_cookie("OLD 101"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn clearing_the_subject_expires_the_cookie() {
    let ctx = setup().await;
    let app = test::init_service(build_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/clear_subject")
        .cookie(subject_cookie("TCS 302"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/select_subject"
    );

    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .expect("removal cookie");
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.max_age(), Some(actix_web::cookie::time::Duration::ZERO));
}
