//! Tests for account API handlers.

use super::*;
use crate::domain::ports::{MockAccountCommand, MockAccountQuery, MockLoginService};
use crate::domain::{AccountId, EmailAddress, ErrorCode};
use crate::inbound::http::cache_control::NO_STORE_MUST_REVALIDATE;
use crate::inbound::http::test_utils::{
    SEED_SESSION_PATH, seed_session, session_cookie_for, test_session_middleware,
};
use actix_web::http::{StatusCode, header};
use actix_web::{App, test as actix_test};
use chrono::{TimeZone, Utc};
use rstest::rstest;
use serde_json::{Value, json};
use std::sync::Arc;

const CALLER: &str = "jane@example.com";

fn test_app(
    command: MockAccountCommand,
    query: MockAccountQuery,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let state = HttpState::new(
        Arc::new(command),
        Arc::new(query),
        Arc::new(MockLoginService::new()),
    );
    App::new()
        .app_data(web::Data::new(state))
        .app_data(json_config())
        .app_data(query_config())
        .wrap(test_session_middleware())
        .route(SEED_SESSION_PATH, web::get().to(seed_session))
        .service(
            web::scope("/v1")
                .service(register)
                .service(verify)
                .service(current_account)
                .service(update_account),
        )
}

fn profile(verified: bool) -> AccountProfile {
    let created = Utc
        .with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp");
    AccountProfile {
        id: AccountId::random(),
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        email: EmailAddress::new(CALLER).expect("email"),
        verified,
        account_created: created,
        account_updated: created,
        image_key: None,
        image_url: None,
    }
}

async fn error_body(res: actix_web::dev::ServiceResponse) -> Value {
    let body = actix_test::read_body(res).await;
    serde_json::from_slice(&body).expect("error payload")
}

#[actix_web::test]
async fn register_returns_created_profile() {
    let mut command = MockAccountCommand::new();
    command
        .expect_register()
        .withf(|request| {
            request.email == CALLER
                && request.first_name == "Jane"
                && request.password.as_str() == "s3cret"
        })
        .times(1)
        .returning(|_| Ok(profile(false)));
    let app = actix_test::init_service(test_app(command, MockAccountQuery::new())).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/v1/user")
            .set_json(json!({
                "first_name": "Jane",
                "last_name": "Doe",
                "email": CALLER,
                "password": "s3cret"
            }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["email"], CALLER);
    assert_eq!(body["account_created"], "2024-06-01T12:00:00+00:00");
    assert!(body["imageKey"].is_null());
    assert!(body.get("password").is_none());
    assert!(body.get("verified").is_none());
}

#[actix_web::test]
async fn register_passes_missing_fields_as_blank() {
    let mut command = MockAccountCommand::new();
    command
        .expect_register()
        .withf(|request| {
            request.first_name.is_empty() && request.email.is_empty() && request.password.is_empty()
        })
        .times(1)
        .returning(|_| {
            Err(Error::invalid_request("registration is invalid").with_details(json!({
                "fields": [{"field": "first_name", "code": "blank"}]
            })))
        });
    let app = actix_test::init_service(test_app(command, MockAccountQuery::new())).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/v1/user")
            .set_json(json!({"last_name": "Doe"}))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = error_body(res).await;
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["fields"][0]["field"], "first_name");
}

#[rstest]
#[case::unknown_field(json!({"first_name": "Jane", "last_name": "Doe", "email": CALLER, "password": "x", "admin": true}))]
#[case::wrong_type(json!({"first_name": 7}))]
#[actix_web::test]
async fn malformed_registration_never_reaches_service(#[case] payload: Value) {
    let mut command = MockAccountCommand::new();
    command.expect_register().times(0);
    let app = actix_test::init_service(test_app(command, MockAccountQuery::new())).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/v1/user")
            .set_json(payload)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = error_body(res).await;
    assert!(
        body["message"]
            .as_str()
            .is_some_and(|message| message.starts_with("malformed request"))
    );
}

#[actix_web::test]
async fn duplicate_registration_conflicts() {
    let mut command = MockAccountCommand::new();
    command
        .expect_register()
        .returning(|_| Err(Error::already_exists("an account with this email already exists")));
    let app = actix_test::init_service(test_app(command, MockAccountQuery::new())).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/v1/user")
            .set_json(json!({
                "first_name": "Jane",
                "last_name": "Doe",
                "email": CALLER,
                "password": "s3cret"
            }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[rstest]
#[case::accepted(true, StatusCode::OK, VERIFIED_MESSAGE)]
#[case::refused(false, StatusCode::BAD_REQUEST, VERIFICATION_FAILED_MESSAGE)]
#[actix_web::test]
async fn verify_reports_outcome_as_text(
    #[case] outcome: bool,
    #[case] status: StatusCode,
    #[case] message: &str,
) {
    let mut command = MockAccountCommand::new();
    command
        .expect_verify()
        .withf(|token| token == "abc123")
        .times(1)
        .returning(move |_| Ok(outcome));
    let app = actix_test::init_service(test_app(command, MockAccountQuery::new())).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/v1/user/verify?token=abc123")
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), status);
    let body = actix_test::read_body(res).await;
    assert_eq!(body, message.as_bytes());
}

#[actix_web::test]
async fn verify_without_token_names_missing_field() {
    let mut command = MockAccountCommand::new();
    command.expect_verify().times(0);
    let app = actix_test::init_service(test_app(command, MockAccountQuery::new())).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/v1/user/verify")
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = error_body(res).await;
    assert_eq!(body["details"]["field"], "token");
    assert_eq!(body["details"]["code"], "missing_field");
}

#[actix_web::test]
async fn current_account_requires_login() {
    let mut query = MockAccountQuery::new();
    query.expect_get_profile().times(0);
    let app = actix_test::init_service(test_app(MockAccountCommand::new(), query)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/v1/user/self").to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn current_account_returns_uncached_profile() {
    let mut query = MockAccountQuery::new();
    query
        .expect_get_profile()
        .withf(|caller| caller.as_str() == CALLER)
        .times(1)
        .returning(|_| Ok(profile(true)));
    let app = actix_test::init_service(test_app(MockAccountCommand::new(), query)).await;
    let cookie = session_cookie_for(&app, CALLER).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/v1/user/self")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()
            .get(header::CACHE_CONTROL)
            .and_then(|value| value.to_str().ok()),
        Some(NO_STORE_MUST_REVALIDATE)
    );
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["first_name"], "Jane");
}

#[rstest]
#[case::unverified(Error::not_verified("email not verified"), StatusCode::FORBIDDEN, ErrorCode::NotVerified)]
#[case::missing(Error::not_found("account not found"), StatusCode::NOT_FOUND, ErrorCode::NotFound)]
#[case::outage(
    Error::service_unavailable("account service temporarily unavailable"),
    StatusCode::SERVICE_UNAVAILABLE,
    ErrorCode::ServiceUnavailable
)]
#[actix_web::test]
async fn current_account_maps_service_errors(
    #[case] error: Error,
    #[case] status: StatusCode,
    #[case] code: ErrorCode,
) {
    let mut query = MockAccountQuery::new();
    query
        .expect_get_profile()
        .times(1)
        .returning(move |_| Err(error.clone()));
    let app = actix_test::init_service(test_app(MockAccountCommand::new(), query)).await;
    let cookie = session_cookie_for(&app, CALLER).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/v1/user/self")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), status);
    let payload: Error = actix_test::read_body_json(res).await;
    assert_eq!(payload.code(), code);
}

#[actix_web::test]
async fn update_account_forwards_patch() {
    let mut command = MockAccountCommand::new();
    command
        .expect_update_profile()
        .withf(|caller, patch| {
            caller.as_str() == CALLER
                && patch.last_name.as_deref() == Some("Smith")
                && patch.first_name.is_none()
                && patch.email.is_none()
                && patch.password.is_none()
        })
        .times(1)
        .returning(|_, _| Ok(profile(true)));
    let app = actix_test::init_service(test_app(command, MockAccountQuery::new())).await;
    let cookie = session_cookie_for(&app, CALLER).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri("/v1/user/self")
            .cookie(cookie)
            .set_json(json!({"last_name": "Smith"}))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn update_account_requires_login() {
    let mut command = MockAccountCommand::new();
    command.expect_update_profile().times(0);
    let app = actix_test::init_service(test_app(command, MockAccountQuery::new())).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri("/v1/user/self")
            .set_json(json!({"last_name": "Smith"}))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn update_account_surfaces_email_change_rejection() {
    let mut command = MockAccountCommand::new();
    command
        .expect_update_profile()
        .returning(|_, _| Err(Error::invalid_request("email cannot be changed")));
    let app = actix_test::init_service(test_app(command, MockAccountQuery::new())).await;
    let cookie = session_cookie_for(&app, CALLER).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri("/v1/user/self")
            .cookie(cookie)
            .set_json(json!({"email": "other@example.com"}))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = error_body(res).await;
    assert_eq!(body["message"], "email cannot be changed");
}
