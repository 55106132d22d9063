//! Service wiring: token service, stores, gate and session flow.

use std::sync::Arc;

use workdesk_auth::{AuthConfig, AuthGate, AuthSession, BaselineTemplate, ConfigError, TokenService};
use workdesk_core::UserId;
use workdesk_infra::{InMemoryDirectory, InMemoryRefreshTokenStore, InfraResult, RecordBook};

/// Everything handlers reach through `Extension<Arc<AppServices>>`.
pub struct AppServices {
    pub baseline: Arc<BaselineTemplate>,
    pub tokens: Arc<TokenService>,
    pub gate: Arc<AuthGate>,
    pub session: AuthSession,
    pub directory: Arc<InMemoryDirectory>,
    pub records: RecordBook,
}

impl AppServices {
    pub fn new(config: &AuthConfig) -> Result<Self, ConfigError> {
        let baseline = Arc::new(config.load_baseline()?);
        let tokens = Arc::new(TokenService::new(config));
        let refresh_tokens = Arc::new(InMemoryRefreshTokenStore::new());
        let directory = Arc::new(InMemoryDirectory::new(baseline.clone(), refresh_tokens.clone()));

        let gate = Arc::new(AuthGate::new(
            tokens.clone(),
            directory.clone(),
            baseline.clone(),
            config.store_timeout,
        ));
        let session = AuthSession::new(
            tokens.clone(),
            directory.clone(),
            directory.clone(),
            refresh_tokens,
            baseline.clone(),
            config.store_timeout,
        );

        tracing::info!(
            issuer = %config.issuer,
            audience = %config.audience,
            permission_pairs = baseline.matrix().len(),
            "services initialized"
        );

        Ok(Self {
            baseline,
            tokens,
            gate,
            session,
            directory,
            records: RecordBook::new(),
        })
    }

    /// Seed the super-role account.
    pub async fn bootstrap_admin(&self, username: &str, password: &str) -> InfraResult<UserId> {
        self.directory.bootstrap_super_admin(username, password).await
    }
}
