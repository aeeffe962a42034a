pub mod notification_queue;
pub mod tv;

use std::sync::Arc;

use crate::{config::AppConfig, services::admin_auth::AdminTokenSigner};

pub use self::tv::{ScorePopup, TvQueue, TvSessions};

pub type SharedState = Arc<AppState>;

/// Central application state: configuration, admin token signer, and the TV sessions.
pub struct AppState {
    config: AppConfig,
    token_signer: AdminTokenSigner,
    tv: TvSessions,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig) -> SharedState {
        let token_signer = AdminTokenSigner::from_config(&config.admin);
        let tv = TvSessions::new(config.popup);
        Arc::new(Self {
            config,
            token_signer,
            tv,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Signer used to issue and check admin tokens.
    pub fn token_signer(&self) -> &AdminTokenSigner {
        &self.token_signer
    }

    /// Registry of per-party TV popup queues.
    pub fn tv(&self) -> &TvSessions {
        &self.tv
    }
}
