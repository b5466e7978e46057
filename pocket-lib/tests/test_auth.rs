#[macro_use]
mod utils;

use actix_web::http::header::AUTHORIZATION;
use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use pocket_lib::auth::jwt::JWTAuth;
use pocket_repo::Repos;
use rstest::rstest;
use serde_json::json;
use utils::{jwt_auth, repos, tracing_setup, TestUser, PASSWORD};
use uuid::Uuid;

fn unique_email() -> String {
    format!("user-{}@example.com", Uuid::new_v4())
}

#[rstest]
#[actix_rt::test]
async fn test_register_and_login(_tracing_setup: &(), repos: Repos, jwt_auth: JWTAuth) {
    let service = build_service!(repos, jwt_auth);
    let email = unique_email();

    let (status, body) = call!(
        &service,
        TestRequest::post().uri("/api/register").set_json(json!({
            "name": "Alice",
            "email": email,
            "password": "s3cret-pass",
        }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], email.as_str());
    let id = body["id"].as_i64().unwrap();

    let (status, body) = call!(
        &service,
        TestRequest::post()
            .uri("/api/login")
            .set_json(json!({"email": email, "password": "s3cret-pass"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"], json!({"id": id, "name": "Alice", "email": email}));
    let token = body["token"].as_str().unwrap().to_owned();
    assert_eq!(jwt_auth.validate_token(&token).unwrap(), id);

    let (status, body) = call!(
        &service,
        TestRequest::get()
            .uri("/api/profile")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alice");
    assert!(body.get("password_hash").is_none());
}

#[rstest]
#[actix_rt::test]
async fn test_register_twice(_tracing_setup: &(), repos: Repos, jwt_auth: JWTAuth) {
    let service = build_service!(repos, jwt_auth);
    let registration = json!({
        "name": "Bob",
        "email": unique_email(),
        "password": "password",
    });

    let (status, _) = call!(
        &service,
        TestRequest::post()
            .uri("/api/register")
            .set_json(&registration)
    );
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call!(
        &service,
        TestRequest::post()
            .uri("/api/register")
            .set_json(&registration)
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");
}

#[rstest]
#[case(json!({"email": "a@example.com", "password": "password"}))]
#[case(json!({"name": "A", "password": "password"}))]
#[case(json!({"name": "A", "email": "a@example.com"}))]
#[case(json!({"name": "  ", "email": "a@example.com", "password": "password"}))]
#[actix_rt::test]
async fn test_register_missing_fields(
    _tracing_setup: &(),
    repos: Repos,
    jwt_auth: JWTAuth,
    #[case] registration: serde_json::Value,
) {
    let service = build_service!(repos, jwt_auth);

    let (status, body) = call!(
        &service,
        TestRequest::post()
            .uri("/api/register")
            .set_json(&registration)
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing fields");
}

#[rstest]
#[actix_rt::test]
async fn test_register_disabled(_tracing_setup: &(), repos: Repos, jwt_auth: JWTAuth) {
    let service = build_service!(repos, jwt_auth, false);

    let (status, _) = call!(
        &service,
        TestRequest::post().uri("/api/register").set_json(json!({
            "name": "Carol",
            "email": unique_email(),
            "password": "password",
        }))
    );
    assert!(!status.is_success(), "Got {}", status);
}

#[rstest]
#[actix_rt::test]
async fn test_login_invalid_credentials(_tracing_setup: &(), repos: Repos, jwt_auth: JWTAuth) {
    let user = TestUser::new(&repos, &jwt_auth).await;
    let service = build_service!(repos, jwt_auth);

    let (status, body) = call!(
        &service,
        TestRequest::post()
            .uri("/api/login")
            .set_json(json!({"email": user.user.email, "password": "wrong password"}))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = call!(
        &service,
        TestRequest::post()
            .uri("/api/login")
            .set_json(json!({"email": unique_email(), "password": PASSWORD}))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, _) = call!(
        &service,
        TestRequest::post()
            .uri("/api/login")
            .set_json(json!({"email": user.user.email}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[case::tags("/api/tags")]
#[case::transactions("/api/transactions")]
#[case::analytics("/api/analytics")]
#[case::budgets("/api/budgets")]
#[case::profile("/api/profile")]
#[actix_rt::test]
async fn test_missing_and_bad_tokens(
    _tracing_setup: &(),
    repos: Repos,
    jwt_auth: JWTAuth,
    #[case] uri: &str,
) {
    let service = build_service!(repos, jwt_auth);

    let (status, body) = call!(&service, TestRequest::get().uri(uri));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing token");

    let (status, body) = call!(
        &service,
        TestRequest::get()
            .uri(uri)
            .insert_header((AUTHORIZATION, "Bearer garbage.token.value"))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    let other_secret = JWTAuth::from_secret(b"some other secret".to_vec());
    let user = TestUser::new(&repos, &other_secret).await;
    let (status, _) = call!(
        &service,
        TestRequest::get().uri(uri).insert_header(user.auth_header())
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[rstest]
#[actix_rt::test]
async fn test_update_profile(_tracing_setup: &(), repos: Repos, jwt_auth: JWTAuth) {
    let user = TestUser::new(&repos, &jwt_auth).await;
    let other = TestUser::new(&repos, &jwt_auth).await;
    let service = build_service!(repos, jwt_auth);

    let new_email = unique_email();
    let (status, body) = call!(
        &service,
        TestRequest::put()
            .uri("/api/profile")
            .insert_header(user.auth_header())
            .set_json(json!({"name": " New Name ", "email": new_email}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"id": user.id(), "name": "New Name", "email": new_email})
    );

    let (status, _) = call!(
        &service,
        TestRequest::put()
            .uri("/api/profile")
            .insert_header(other.auth_header())
            .set_json(json!({"name": "Other", "email": new_email}))
    );
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call!(
        &service,
        TestRequest::put()
            .uri("/api/profile")
            .insert_header(user.auth_header())
            .set_json(json!({"name": "", "email": new_email}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[actix_rt::test]
async fn test_change_password(_tracing_setup: &(), repos: Repos, jwt_auth: JWTAuth) {
    let user = TestUser::new(&repos, &jwt_auth).await;
    let service = build_service!(repos, jwt_auth);

    let (status, body) = call!(
        &service,
        TestRequest::put()
            .uri("/api/change-password")
            .insert_header(user.auth_header())
            .set_json(json!({"currentPassword": "not it", "newPassword": "brand new"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Current password is incorrect");

    let (status, _) = call!(
        &service,
        TestRequest::put()
            .uri("/api/change-password")
            .insert_header(user.auth_header())
            .set_json(json!({"currentPassword": PASSWORD, "newPassword": "short"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call!(
        &service,
        TestRequest::put()
            .uri("/api/change-password")
            .insert_header(user.auth_header())
            .set_json(json!({"currentPassword": PASSWORD}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call!(
        &service,
        TestRequest::put()
            .uri("/api/change-password")
            .insert_header(user.auth_header())
            .set_json(json!({"currentPassword": PASSWORD, "newPassword": "brand new"}))
    );
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call!(
        &service,
        TestRequest::post()
            .uri("/api/login")
            .set_json(json!({"email": user.user.email, "password": "brand new"}))
    );
    assert_eq!(status, StatusCode::OK);
}

#[rstest]
#[actix_rt::test]
async fn test_health(_tracing_setup: &(), repos: Repos, jwt_auth: JWTAuth) {
    let service = build_service!(repos, jwt_auth);

    let (status, body) = call!(&service, TestRequest::get().uri("/api/health"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[rstest]
#[actix_rt::test]
async fn test_malformed_json(_tracing_setup: &(), repos: Repos, jwt_auth: JWTAuth) {
    let service = build_service!(repos, jwt_auth);

    let (status, body) = call!(
        &service,
        TestRequest::post()
            .uri("/api/login")
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"email\": ")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}
