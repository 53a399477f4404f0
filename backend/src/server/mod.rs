//! Server construction and middleware wiring.

mod config;
mod session_key;

pub use config::ServerConfig;
pub use session_key::load_session_key;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use account_backend::Trace;
#[cfg(debug_assertions)]
use account_backend::doc::ApiDoc;
use account_backend::inbound::http::accounts::{
    current_account, json_config, query_config, register, update_account, verify,
};
use account_backend::inbound::http::auth::login;
use account_backend::inbound::http::health::{HealthState, healthz};
use account_backend::inbound::http::images::{ImageState, serve_image};
use account_backend::inbound::http::pictures::{
    delete_picture, get_picture, payload_config, upload_picture,
};
use account_backend::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    image_state: web::Data<ImageState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

fn session_middleware(
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build()
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        image_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let api = web::scope("/v1")
        .wrap(session_middleware(key, cookie_secure, same_site))
        .service(register)
        .service(verify)
        .service(login)
        .service(current_account)
        .service(update_account)
        .service(upload_picture)
        .service(get_picture)
        .service(delete_picture);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(image_state)
        .app_data(json_config())
        .app_data(query_config())
        .app_data(payload_config())
        .wrap(Trace)
        .service(api)
        .service(serve_image)
        .service(healthz);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server serving the account API.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails, or when the
/// `metrics` feature is enabled without Prometheus middleware configured.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    image_state: web::Data<ImageState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        #[cfg(feature = "metrics")]
        prometheus,
    } = config;

    #[cfg(feature = "metrics")]
    let prometheus = prometheus.ok_or_else(|| {
        std::io::Error::other("metrics feature enabled without Prometheus middleware")
    })?;

    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            image_state: image_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(prometheus.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
