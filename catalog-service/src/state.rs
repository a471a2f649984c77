//! Application state shared across handlers

use std::sync::Arc;

use crate::auth::{PasswordHasher, TokenIssuer};
use crate::config::{Config, ListingConfig};
use crate::error::Result;
use crate::repository::CatalogStore;

/// Configuration, storage and auth collaborators for one running service
///
/// Generic over the storage backend so the same router serves the in-memory
/// and PostgreSQL stores.
#[derive(Clone)]
pub struct AppState<S>
where
    S: CatalogStore,
{
    config: Arc<Config>,
    store: S,
    tokens: TokenIssuer,
    passwords: PasswordHasher,
}

impl<S> AppState<S>
where
    S: CatalogStore,
{
    /// Build state from configuration and a connected store
    ///
    /// Fails when the password hashing parameters are invalid.
    pub fn new(config: Config, store: S) -> Result<Self> {
        let tokens = TokenIssuer::new(&config.auth);
        let passwords = PasswordHasher::new(&config.auth.password)?;
        Ok(Self {
            config: Arc::new(config),
            store,
            tokens,
            passwords,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub fn passwords(&self) -> &PasswordHasher {
        &self.passwords
    }

    /// Page size bounds for list endpoints
    pub fn listing(&self) -> &ListingConfig {
        &self.config.listing
    }
}
