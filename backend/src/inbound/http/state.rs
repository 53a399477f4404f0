//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AccountCommand, AccountQuery, LoginService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountCommand>,
    pub profiles: Arc<dyn AccountQuery>,
    pub login: Arc<dyn LoginService>,
}

impl HttpState {
    /// Construct state from the three driving ports.
    pub fn new(
        accounts: Arc<dyn AccountCommand>,
        profiles: Arc<dyn AccountQuery>,
        login: Arc<dyn LoginService>,
    ) -> Self {
        Self {
            accounts,
            profiles,
            login,
        }
    }

    /// Construct state from one service implementing every driving port.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use account_backend::domain::ports::{AccountCommand, AccountQuery, LoginService};
    /// use account_backend::inbound::http::state::HttpState;
    ///
    /// fn wire<S>(service: Arc<S>) -> HttpState
    /// where
    ///     S: AccountCommand + AccountQuery + LoginService + 'static,
    /// {
    ///     HttpState::from_service(service)
    /// }
    /// ```
    pub fn from_service<S>(service: Arc<S>) -> Self
    where
        S: AccountCommand + AccountQuery + LoginService + 'static,
    {
        Self {
            accounts: service.clone(),
            profiles: service.clone(),
            login: service,
        }
    }
}
