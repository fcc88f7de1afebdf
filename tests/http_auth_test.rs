/// HTTP-level tests for authentication and request classification:
/// missing/garbage tokens are rejected with the standard envelope, and
/// malformed ids come back as validation failures before any database
/// work happens.
mod common;

use actix_web::http::header;
use actix_web::{test, App};
use uuid::Uuid;

#[actix_web::test]
async fn protected_route_without_token_is_unauthorized() {
    common::init_test_env();
    let app = test::init_service(App::new().configure(common::configure)).await;

    let req = test::TestRequest::get().uri("/api/v1/users/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["statusCode"], 401);
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());
}

#[actix_web::test]
async fn garbage_bearer_token_is_unauthorized() {
    common::init_test_env();
    let app = test::init_service(App::new().configure(common::configure)).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/users/me")
        .insert_header((header::AUTHORIZATION, "Bearer not.a.jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn middleware_guarded_scope_rejects_missing_token() {
    common::init_test_env();
    let app = test::init_service(App::new().configure(common::configure)).await;

    let req = test::TestRequest::get().uri("/api/v1/tweets").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn basic_scheme_is_rejected() {
    common::init_test_env();
    let app = test::init_service(App::new().configure(common::configure)).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/tweets")
        .insert_header((header::AUTHORIZATION, "Basic dXNlcjpwYXNz"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn malformed_id_is_a_validation_failure_not_a_lookup_miss() {
    common::init_test_env();
    let app = test::init_service(App::new().configure(common::configure)).await;

    let req = test::TestRequest::delete()
        .uri("/api/v1/comments/not-a-uuid")
        .insert_header((header::AUTHORIZATION, common::bearer_for(Uuid::new_v4())))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["statusCode"], 400);
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .contains("invalid comment id"));
}

#[actix_web::test]
async fn public_route_also_validates_ids() {
    common::init_test_env();
    let app = test::init_service(App::new().configure(common::configure)).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/subscriptions/42/subscribers")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn self_subscription_is_rejected_without_touching_the_store() {
    common::init_test_env();
    let app = test::init_service(App::new().configure(common::configure)).await;

    let user_id = Uuid::new_v4();
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/subscriptions/{user_id}"))
        .insert_header((header::AUTHORIZATION, common::bearer_for(user_id)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .contains("own channel"));
}
