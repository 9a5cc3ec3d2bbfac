use std::sync::Arc;
use std::time::Duration;

use crate::cache::PageCache;
use crate::config::AppConfig;
use crate::mail::{MailClient, SmtpMailer};
use crate::repo::{postgres::PgStore, BlogStore};
use crate::storage::{LocalStorage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BlogStore>,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub mailer: Arc<dyn MailClient>,
    pub page_cache: PageCache,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<(Self, sqlx::PgPool)> {
        let config = Arc::new(config);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;

        let storage = Arc::new(LocalStorage::new(&config.media_root)) as Arc<dyn StorageClient>;
        let store = Arc::new(PgStore::new(db.clone())) as Arc<dyn BlogStore>;
        let mailer = Arc::new(SmtpMailer::new(&config.mail)?) as Arc<dyn MailClient>;
        let page_cache = PageCache::new(Duration::from_secs(config.index_cache_ttl_secs));

        Ok((
            Self::from_parts(store, config, storage, mailer, page_cache),
            db,
        ))
    }

    pub fn from_parts(
        store: Arc<dyn BlogStore>,
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
        mailer: Arc<dyn MailClient>,
        page_cache: PageCache,
    ) -> Self {
        Self {
            store,
            config,
            storage,
            mailer,
            page_cache,
        }
    }
}
