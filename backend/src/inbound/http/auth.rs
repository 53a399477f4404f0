//! Login handler.
//!
//! Exchanges an email and password for a session cookie carrying the
//! account email. Every `/v1/user/self` endpoint resolves the caller from
//! that cookie.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::domain::{Error, LoginCredentials, LoginValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body for `POST /v1/login`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[schema(example = "jane.doe@example.com")]
    pub email: String,
    #[schema(example = "s3cr3t", write_only)]
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    let (field, code) = match err {
        LoginValidationError::InvalidEmail => ("email", "invalid_email"),
        LoginValidationError::EmptyPassword => ("password", "blank"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 503, description = "Dependency unavailable", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let email = state.login.authenticate(&credentials).await?;
    session.persist_account(&email)?;
    info!("login succeeded");
    Ok(HttpResponse::Ok().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockAccountCommand, MockAccountQuery, MockLoginService};
    use crate::domain::{EmailAddress, ErrorCode};
    use crate::inbound::http::test_utils::test_session_middleware;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::Value;
    use std::sync::Arc;

    fn app_with(
        login_service: MockLoginService,
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
            Arc::new(MockAccountCommand::new()),
            Arc::new(MockAccountQuery::new()),
            Arc::new(login_service),
        );
        App::new()
            .app_data(web::Data::new(state))
            .app_data(crate::inbound::http::accounts::json_config())
            .wrap(test_session_middleware())
            .service(web::scope("/v1").service(login))
    }

    #[actix_web::test]
    async fn successful_login_sets_session_cookie() {
        let mut login_service = MockLoginService::new();
        login_service
            .expect_authenticate()
            .withf(|creds| creds.email().as_str() == "jane@example.com")
            .times(1)
            .returning(|creds| Ok(creds.email().clone()));
        let app = actix_test::init_service(app_with(login_service)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/v1/login")
                .set_json(json!({"email": "jane@example.com", "password": "s3cret"}))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.response().cookies().any(|cookie| cookie.name() == "session"));
    }

    #[actix_web::test]
    async fn rejected_credentials_are_unauthorised() {
        let mut login_service = MockLoginService::new();
        login_service
            .expect_authenticate()
            .returning(|_| Err(Error::unauthorized("invalid credentials")));
        let app = actix_test::init_service(app_with(login_service)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/v1/login")
                .set_json(json!({"email": "jane@example.com", "password": "nope"}))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(res.response().cookies().next().is_none());
    }

    #[rstest]
    #[case(json!({"email": "jane", "password": "s3cret"}), "email", "invalid_email")]
    #[case(json!({"email": "jane@example.com", "password": ""}), "password", "blank")]
    #[actix_web::test]
    async fn malformed_credentials_never_reach_service(
        #[case] body: Value,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let mut login_service = MockLoginService::new();
        login_service.expect_authenticate().times(0);
        let app = actix_test::init_service(app_with(login_service)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/v1/login")
                .set_json(body)
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let payload: Error = actix_test::read_body_json(res).await;
        assert_eq!(payload.code(), ErrorCode::InvalidRequest);
        let details = payload.details().expect("details");
        assert_eq!(details["field"], field);
        assert_eq!(details["code"], code);
    }

    #[actix_web::test]
    async fn unknown_fields_are_rejected() {
        let app = actix_test::init_service(app_with(MockLoginService::new())).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/v1/login")
                .set_json(json!({"email": "jane@example.com", "password": "x", "admin": true}))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    fn login_request_converts_to_credentials() {
        let creds = LoginCredentials::try_from(LoginRequest {
            email: " jane@example.com ".into(),
            password: "s3cret".into(),
        })
        .expect("valid credentials");
        assert_eq!(
            creds.email(),
            &EmailAddress::new("jane@example.com").expect("email")
        );
    }
}
