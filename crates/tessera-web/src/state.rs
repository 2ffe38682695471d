use std::sync::Arc;

use tessera_core::{
    AuthenticationService, AuthenticatorChain, CompositePasswordEncoder, InMemoryTicketStore,
    InMemoryUserStore, RepositoryAuthenticator, SystemClock,
};

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthenticationService>,
}

impl AppState {
    /// Seeds the account store from `config.users` and builds the service
    /// with the repository authenticator as the chain's only member.
    pub fn new(config: &ServerConfig) -> Self {
        let clock = Arc::new(SystemClock);
        let users = Arc::new(InMemoryUserStore::with_users(
            config.users.iter().map(|u| u.to_record()),
        ));
        let repository = RepositoryAuthenticator::new(
            users,
            CompositePasswordEncoder::new(config.auth.password.preferred_encoding),
            clock.clone(),
        )
        .with_identities(&config.auth.identities);
        let chain = AuthenticatorChain::new().with_mutable(Arc::new(repository));

        let auth = AuthenticationService::from_config(
            &config.auth,
            chain,
            Arc::new(InMemoryTicketStore::new()),
            clock,
        );
        tracing::info!("Loaded {} user(s)", config.users.len());

        Self {
            auth: Arc::new(auth),
        }
    }
}
