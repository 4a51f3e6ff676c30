//! Application state: the reward engine, the clock, and app settings.
//!
//! Built once at startup:
//!   - optional TOML config (app settings, badge rules, lesson catalogue)
//!   - SQLite store, seeded with the configured or built-in catalogue
//!   - badge policy (configured rules, or the default set)

use std::sync::Arc;

use tracing::{info, instrument};

use crate::badges::BadgePolicy;
use crate::config::{load_app_config_from_env, AppConfig, AppSettings, ServerSettings};
use crate::engine::RewardEngine;
use crate::error::Result;
use crate::seeds::seed_lessons;
use crate::store::Store;
use crate::util::{Clock, SystemClock};

#[derive(Clone)]
pub struct AppState {
    pub engine: RewardEngine,
    pub clock: Arc<dyn Clock>,
    pub app: AppSettings,
}

impl AppState {
    /// Build state from env: load config, open + seed the store, build the policy.
    #[instrument(level = "info", skip_all, fields(db = %settings.database_path.display()))]
    pub fn from_env(settings: &ServerSettings) -> Result<Self> {
        let cfg = load_app_config_from_env().unwrap_or_default();
        let store = Store::open(&settings.database_path)?;
        Self::build(store, cfg, Arc::new(SystemClock))
    }

    /// Seed `store` and wire the engine. Used by `from_env` and by tests.
    pub fn build(store: Store, cfg: AppConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let catalogue = if cfg.lessons.is_empty() {
            info!(target: "calcuingo_backend", "No lessons configured; using built-in calculus catalogue");
            seed_lessons()
        } else {
            cfg.lessons.clone()
        };
        store.seed_catalogue(&catalogue)?;

        let policy = if cfg.badges.is_empty() {
            BadgePolicy::default()
        } else {
            BadgePolicy::new(cfg.badges.clone())
        };
        info!(target: "calcuingo_backend", rules = policy.rules().len(), app = %cfg.app.name, "Badge policy ready");

        let engine = RewardEngine::new(store, policy, cfg.app.max_answer_len);
        Ok(Self { engine, clock, app: cfg.app })
    }
}
