pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::holding::{HoldingUpdate, NewHolding};
use crate::core::identity::{UserId, resolve_identity};
use crate::core::notification::{NotificationService, NotificationUpdate};
use crate::core::price::{Metal, SpotPriceProvider};
use crate::core::pricing::{HistoryQuery, PriceCacheManager};
use crate::providers::{DiscordWebhook, MetalsDevProvider};
use crate::store::KeyValueStore;
use crate::store::holdings::HoldingsStore;
use crate::store::notifications::NotificationStore;
use crate::store::prices::PriceTables;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub enum AppCommand {
    Prices,
    CachedPrices,
    History(HistoryQuery),
    Holdings(HoldingsCommand),
    Summary,
    Analytics,
    Notify(NotifyCommand),
    Digest,
}

pub enum HoldingsCommand {
    List { metal: Option<Metal> },
    Add(NewHolding),
    Update { id: Uuid, update: HoldingUpdate },
    Remove { id: Uuid },
}

pub enum NotifyCommand {
    Show,
    Set(NotificationUpdate),
    Test,
}

/// Everything a command needs, wired from the configuration.
pub struct App {
    pub config: AppConfig,
    store: KeyValueStore,
    pub prices: PriceCacheManager,
    pub holdings: HoldingsStore,
    pub notifications: NotificationService,
}

impl App {
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let store = KeyValueStore::open(&config.default_data_path()?)?;
        Self::with_store(config, store)
    }

    pub fn with_store(config: AppConfig, store: KeyValueStore) -> Result<Self> {
        let tables = PriceTables::open(&store)?;

        let provider: Option<Arc<dyn SpotPriceProvider>> = match config.api_key() {
            Some(api_key) => Some(Arc::new(MetalsDevProvider::new(
                &config.providers.metals_dev.base_url,
                &api_key,
                &config.currency,
                &config.unit,
            ))),
            None => {
                warn!("No market-data API key configured. Live prices are disabled");
                None
            }
        };

        let holdings = HoldingsStore::open(&store)?;
        let notifications = NotificationService::new(
            NotificationStore::open(&store)?,
            holdings.clone(),
            tables.clone(),
            Arc::new(DiscordWebhook::new()),
            &config.currency,
            &config.unit,
        );

        Ok(Self {
            prices: PriceCacheManager::new(tables, provider),
            holdings,
            notifications,
            store,
            config,
        })
    }

    fn identity(&self, cli_user: Option<&str>) -> Result<UserId> {
        resolve_identity(cli_user, &self.config)
    }

    pub async fn execute(&self, command: AppCommand, user: Option<&str>) -> Result<()> {
        let currency = self.config.currency.as_str();

        match command {
            AppCommand::Prices => cli::prices::run(&self.prices, currency, &self.config.unit).await,
            AppCommand::CachedPrices => {
                cli::prices::run_cached(&self.prices, currency, &self.config.unit).await
            }
            AppCommand::History(query) => {
                cli::prices::run_history(&self.prices, query, currency).await
            }
            AppCommand::Holdings(cmd) => {
                let owner = self.identity(user)?;
                match cmd {
                    HoldingsCommand::List { metal } => {
                        cli::holdings::list(&self.holdings, &owner, metal, currency).await
                    }
                    HoldingsCommand::Add(new) => {
                        cli::holdings::add(&self.holdings, &owner, new).await
                    }
                    HoldingsCommand::Update { id, update } => {
                        cli::holdings::update(&self.holdings, &owner, &id, update).await
                    }
                    HoldingsCommand::Remove { id } => {
                        cli::holdings::remove(&self.holdings, &owner, &id).await
                    }
                }
            }
            AppCommand::Summary => {
                let owner = self.identity(user)?;
                cli::summary::run(&self.prices, &self.holdings, &owner, currency).await
            }
            AppCommand::Analytics => {
                let owner = self.identity(user)?;
                cli::summary::run_analytics(&self.prices, &self.holdings, &owner, currency).await
            }
            AppCommand::Notify(cmd) => {
                let owner = self.identity(user)?;
                match cmd {
                    NotifyCommand::Show => cli::notify::show(&self.notifications, &owner).await,
                    NotifyCommand::Set(update) => {
                        cli::notify::set(&self.notifications, &owner, update).await
                    }
                    NotifyCommand::Test => cli::notify::test(&self.notifications, &owner).await,
                }
            }
            AppCommand::Digest => cli::notify::digest(&self.notifications).await,
        }
    }

    /// Flushes the store to disk.
    pub fn close(self) -> Result<()> {
        self.store.persist()
    }
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    user: Option<&str>,
) -> Result<()> {
    info!("Bullion starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(currency = %config.currency, unit = %config.unit, "Loaded config");

    let app = App::from_config(config)?;
    let result = app.execute(command, user).await;
    app.close()?;
    result
}
