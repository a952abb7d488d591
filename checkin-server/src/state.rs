//! Shared application state

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::SessionKeys;
use crate::config::Config;
use crate::db::Repositories;
use crate::line::{IdentityProvider, LineLogin, LineMessenger, Messenger};
use crate::services::{FrontendLinks, Services};

/// State handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub sessions: SessionKeys,
}

impl AppState {
    /// Production wiring: Postgres repositories and the real LINE clients
    pub fn new(config: &Config, pool: PgPool, http: reqwest::Client) -> Self {
        let repos = Repositories::postgres(pool);
        let messenger: Arc<dyn Messenger> = Arc::new(LineMessenger::new(
            http.clone(),
            config.line_channel_access_token.clone(),
        ));
        let identity: Arc<dyn IdentityProvider> = Arc::new(LineLogin::new(
            http,
            config.line_client_id.clone(),
            config.line_client_secret.clone(),
            config.line_redirect_uri.clone(),
        ));
        let sessions = SessionKeys::new(
            &config.jwt_secret,
            config.jwt_expiry_days,
            config.is_production(),
        );
        Self::with_parts(
            &repos,
            messenger,
            identity,
            sessions,
            FrontendLinks::new(config.frontend_url.clone()),
        )
    }

    /// Wire services over arbitrary repositories and collaborators
    pub fn with_parts(
        repos: &Repositories,
        messenger: Arc<dyn Messenger>,
        identity: Arc<dyn IdentityProvider>,
        sessions: SessionKeys,
        links: FrontendLinks,
    ) -> Self {
        let services = Services::new(repos, messenger, identity, sessions.clone(), links);
        Self { services, sessions }
    }
}
