//! Storage seams for items and settings
//!
//! The scheduler never persists anything itself. Callers load items and
//! settings through these traits, run scheduling operations in memory and
//! write the mutated item back.
//!
//! Directory structure of the file-backed store:
//! ```text
//! {data_dir}/
//! ├── settings.json        # Raw settings payload
//! └── items/
//!     └── {item-id}.json   # One item with its scheduling record
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

use super::models::Item;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Item not found: {0}")]
    ItemNotFound(Uuid),

    #[error("Data directory not found")]
    DataDirNotFound,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Source of the raw settings payload
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self) -> Result<Value>;
    async fn set(&self, settings: Value) -> Result<()>;
}

/// Source of whole items
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Item>;
    async fn put(&self, item: &Item) -> Result<()>;
    async fn list(&self) -> Result<Vec<Item>>;
}

/// JSON-file store for items and settings
pub struct FileReviewStore {
    base_path: PathBuf,
}

impl FileReviewStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("nous").join("review"))
            .ok_or(StoreError::DataDirNotFound)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn items_dir(&self) -> PathBuf {
        self.base_path.join("items")
    }

    fn item_path(&self, id: Uuid) -> PathBuf {
        self.items_dir().join(format!("{}.json", id))
    }

    fn settings_path(&self) -> PathBuf {
        self.base_path.join("settings.json")
    }

    /// Initialize storage directories
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(self.items_dir()).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FileReviewStore {
    async fn get(&self) -> Result<Value> {
        let path = self.settings_path();
        if !fs::try_exists(&path).await? {
            return Ok(Value::Object(Default::default()));
        }

        let content = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn set(&self, settings: Value) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;
        fs::write(self.settings_path(), serde_json::to_string_pretty(&settings)?).await?;
        Ok(())
    }
}

#[async_trait]
impl ItemStore for FileReviewStore {
    async fn get(&self, id: Uuid) -> Result<Item> {
        let path = self.item_path(id);
        if !fs::try_exists(&path).await? {
            return Err(StoreError::ItemNotFound(id));
        }

        let content = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn put(&self, item: &Item) -> Result<()> {
        self.init().await?;
        fs::write(self.item_path(item.id), serde_json::to_string_pretty(item)?).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Item>> {
        let items_dir = self.items_dir();
        if !fs::try_exists(&items_dir).await? {
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        let mut entries = fs::read_dir(&items_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                let content = fs::read_to_string(&path).await?;
                match serde_json::from_str::<Item>(&content) {
                    Ok(item) => items.push(item),
                    Err(e) => log::warn!("Skipping unreadable item {:?}: {}", path, e),
                }
            }
        }

        items.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(items)
    }
}
