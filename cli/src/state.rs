use std::sync::Arc;

use anyhow::{Context, Result};
use securescape_config::{DatabaseLocation, Settings};
use securescape_core::{DemoSessionRegistry, MutationGateway, TokenStore};
use securescape_store::{DemoSeed, DemoStore};
use securescape_types::UserId;

use crate::session::SessionClock;

/// Shared handler state. Cloning is cheap; everything behind it is shared.
#[derive(Clone)]
pub struct AppState {
    gateway: MutationGateway,
    store: Arc<DemoStore>,
    allowed_origins: Arc<[String]>,
    session_clock: Arc<SessionClock>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("gateway", &self.gateway)
            .field("allowed_origins", &self.allowed_origins)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire the gateway over `store`. New sessions are bound to `victim`.
    #[must_use]
    pub fn new(
        store: Arc<DemoStore>,
        tokens: TokenStore,
        victim: Option<UserId>,
        allowed_origins: Vec<String>,
    ) -> Self {
        let gateway = MutationGateway::new(
            Arc::new(DemoSessionRegistry::new(victim)),
            Arc::new(tokens),
            store.clone(),
        );
        Self {
            gateway,
            store,
            allowed_origins: allowed_origins.into(),
            session_clock: Arc::default(),
        }
    }

    /// Open and seed the database described by `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let store = match &settings.database {
            DatabaseLocation::InMemory => {
                DemoStore::open_in_memory().context("opening in-memory database")?
            }
            DatabaseLocation::File(path) => DemoStore::open(path)
                .with_context(|| format!("opening database at {}", path.display()))?,
        };
        store
            .seed(&DemoSeed {
                starting_balance: settings.starting_balance,
            })
            .context("seeding demo data")?;

        let victim = store
            .user_id_by_username(&settings.victim)
            .context("looking up demo victim")?;
        if victim.is_none() {
            tracing::warn!(
                victim = %settings.victim,
                "Demo victim does not exist; CSRF routes will answer 401"
            );
        }

        Ok(Self::new(
            Arc::new(store),
            TokenStore::default(),
            victim,
            settings.allowed_origins.clone(),
        ))
    }

    #[must_use]
    pub fn gateway(&self) -> &MutationGateway {
        &self.gateway
    }

    #[must_use]
    pub fn store(&self) -> &DemoStore {
        &self.store
    }

    #[must_use]
    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    pub(crate) fn session_clock(&self) -> &SessionClock {
        &self.session_clock
    }
}
