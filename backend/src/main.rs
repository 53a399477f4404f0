//! Account service entry-point: loads settings, wires adapters into the
//! lifecycle service and serves the REST API.

mod server;

use std::sync::Arc;
use std::time::Duration;

use actix_web::cookie::SameSite;
use actix_web::web;
#[cfg(feature = "metrics")]
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use account_backend::domain::{AccountLifecycleService, AccountServicePorts, VerificationPolicy};
use account_backend::inbound::http::health::HealthState;
use account_backend::inbound::http::images::ImageState;
use account_backend::inbound::http::state::HttpState;
use account_backend::outbound::hashing::Argon2CredentialHasher;
#[cfg(feature = "metrics")]
use account_backend::outbound::metrics::PrometheusAccountMetrics;
use account_backend::outbound::notify::{
    ConfiguredPublisher, LoggingVerificationPublisher, WebhookVerificationPublisher,
};
use account_backend::outbound::object_store::LocalProfileImageStore;
use account_backend::outbound::persistence::{
    DbPool, DieselAccountRepository, PoolConfig, run_pending_migrations,
};
use account_backend::settings::AccountSettings;
use server::{ServerConfig, create_server, load_session_key};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AccountSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load settings: {err}"))?;

    run_pending_migrations(settings.database_url())
        .await
        .wrap_err("failed to apply database migrations")?;

    let pool = DbPool::new(PoolConfig::new(settings.database_url()))
        .await
        .map_err(|err| eyre!("failed to build database pool: {}", err.into_message()))?;
    let accounts = Arc::new(DieselAccountRepository::new(pool));

    let images = Arc::new(LocalProfileImageStore::open(settings.image_root(), settings.image_base_url())
        .with_context(|| {
            format!(
                "failed to open image directory {}",
                settings.image_root().display()
            )
        })?);

    let publisher = match &settings.webhook_url {
        Some(url) => ConfiguredPublisher::Webhook(
            WebhookVerificationPublisher::new(url.clone(), WEBHOOK_TIMEOUT)
                .wrap_err("failed to build webhook client")?,
        ),
        None => {
            warn!("no webhook configured; verification events are only logged");
            ConfiguredPublisher::Logging(LoggingVerificationPublisher::new(cfg!(debug_assertions)))
        }
    };

    let service = AccountLifecycleService::new(
        AccountServicePorts {
            accounts: Arc::clone(&accounts),
            images: Arc::clone(&images),
            publisher: Arc::new(publisher),
            hasher: Arc::new(Argon2CredentialHasher::default()),
        },
        Arc::new(mockable::DefaultClock),
    )
    .with_policy(VerificationPolicy::from_env())
    .with_topic(settings.verification_topic());

    #[cfg(feature = "metrics")]
    let prometheus = make_metrics()?;
    #[cfg(feature = "metrics")]
    let service = service.with_metrics(Arc::new(
        PrometheusAccountMetrics::new(&prometheus.registry)
            .wrap_err("failed to register account metrics")?,
    ));

    let key = load_session_key(settings.session_key_file(), settings.allow_ephemeral_session)?;
    let config = ServerConfig::new(
        key,
        settings.cookie_secure(),
        SameSite::Lax,
        settings.bind_addr(),
    );
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(Some(prometheus));

    let bind_addr = config.bind_addr();
    let health_state = web::Data::new(HealthState::new().with_store_probe(accounts));
    let http_state = web::Data::new(HttpState::from_service(Arc::new(service)));
    let image_state = web::Data::new(ImageState::new(images));
    let server = create_server(health_state, http_state, image_state, config)
        .with_context(|| format!("failed to start server on {bind_addr}"))?;
    info!(%bind_addr, "account service listening");
    server.await.wrap_err("server terminated abnormally")
}

#[cfg(feature = "metrics")]
fn make_metrics() -> Result<PrometheusMetrics> {
    PrometheusMetricsBuilder::new("accounts")
        .endpoint("/metrics")
        .build()
        .map_err(|err| eyre!("failed to configure Prometheus metrics: {err}"))
}
