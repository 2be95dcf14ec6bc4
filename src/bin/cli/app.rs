use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use uuid::Uuid;

use nous_review::ordering::ORDERING_SETTINGS_KEY;
use nous_review::{
    normalize_ordering, ConfigCache, FileReviewStore, Item, ItemSectionResolver, ItemStore,
    OrderingSpec, Scheduler, SettingsStore, DUE_NEVER,
};

/// Shared application state for CLI commands
pub struct App {
    pub items: FileReviewStore,
    pub config: ConfigCache<FileReviewStore>,
}

impl App {
    /// Open the store in `data_dir`, or the default data directory
    pub async fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => FileReviewStore::default_data_dir().context("Failed to get data directory")?,
        };

        let items = FileReviewStore::new(data_dir.clone());
        items.init().await.context("Failed to initialize review storage")?;
        log::debug!("Using review data in {:?}", items.base_path());

        Ok(Self {
            items,
            config: ConfigCache::new(FileReviewStore::new(data_dir)),
        })
    }

    /// Scheduler over the current configuration
    pub async fn scheduler(&self) -> Scheduler<ItemSectionResolver> {
        Scheduler::new(ItemSectionResolver, self.config.get().await)
    }

    /// Ordering preference from settings
    pub async fn ordering(&self) -> OrderingSpec {
        match SettingsStore::get(self.config.store()).await {
            Ok(settings) => normalize_ordering(settings.get(ORDERING_SETTINGS_KEY)),
            Err(e) => {
                log::warn!("Failed to load ordering settings, using defaults: {}", e);
                OrderingSpec::default()
            }
        }
    }

    pub async fn list_items(&self) -> Result<Vec<Item>> {
        self.items.list().await.context("Failed to list items")
    }

    pub async fn save_item(&self, item: &Item) -> Result<()> {
        self.items.put(item).await.context("Failed to save item")
    }

    /// Find an item by id, or by title (case-insensitive prefix match)
    pub async fn find_item(&self, query: &str) -> Result<Item> {
        if let Ok(id) = Uuid::parse_str(query) {
            return ItemStore::get(&self.items, id)
                .await
                .context(format!("Item '{}' not found", query));
        }

        let items = self.list_items().await?;
        let query_lower = query.to_lowercase();

        // Exact match first
        if let Some(item) = items.iter().find(|i| i.title.to_lowercase() == query_lower) {
            return Ok(item.clone());
        }

        let matches: Vec<&Item> = items
            .iter()
            .filter(|i| i.title.to_lowercase().starts_with(&query_lower))
            .collect();

        match matches.len() {
            0 => bail!("No item matching '{}'", query),
            1 => Ok(matches[0].clone()),
            _ => bail!("Ambiguous item title '{}'. Matches:\n{}", query,
                matches.iter().map(|i| format!("  - {} ({})", i.title, i.id)).collect::<Vec<_>>().join("\n")),
        }
    }

    /// Titles by item id, for display
    pub fn titles(items: &[Item]) -> std::collections::HashMap<Uuid, String> {
        items.iter().map(|i| (i.id, i.title.clone())).collect()
    }
}

/// Render a millisecond timestamp in local time
pub fn format_due(due_at: i64) -> String {
    if due_at == DUE_NEVER {
        return "never".to_string();
    }
    DateTime::from_timestamp_millis(due_at)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "?".to_string())
}
