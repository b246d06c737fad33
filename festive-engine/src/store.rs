//! Per-shop settings persistence.
//!
//! Every shop owns a handful of JSON documents addressed by `(shop, key)`.
//! There are no multi-key transactions; callers read, mutate, and write back,
//! and the last write wins.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;

use festive_core::PopupSettings;

/// Document keys every shop may carry.
pub mod keys {
    pub const POPUP: &str = "popup_settings";
    pub const SUBSCRIBERS: &str = "subscribers";
    pub const NEWSLETTERS: &str = "sent_newsletters";
    pub const EMAIL: &str = "email_settings";
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, shop: &str, key: &str) -> Result<Option<Value>>;
    async fn set(&self, shop: &str, key: &str, value: Value) -> Result<()>;
    /// Every shop that has at least one stored document.
    async fn shops(&self) -> Result<Vec<String>>;
}

/// Load a document, falling back to `T::default()` when the shop has never
/// written that key.
pub async fn load_or_default<T>(store: &dyn SettingsStore, shop: &str, key: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match store.get(shop, key).await? {
        Some(value) => serde_json::from_value(value)
            .with_context(|| format!("malformed {key} document for {shop}")),
        None => Ok(T::default()),
    }
}

pub async fn save<T: Serialize>(
    store: &dyn SettingsStore,
    shop: &str,
    key: &str,
    value: &T,
) -> Result<()> {
    store.set(shop, key, serde_json::to_value(value)?).await
}

pub async fn load_popup(store: &dyn SettingsStore, shop: &str) -> Result<PopupSettings> {
    load_or_default(store, shop, keys::POPUP).await
}

pub async fn save_popup(
    store: &dyn SettingsStore,
    shop: &str,
    popup: &PopupSettings,
) -> Result<()> {
    save(store, shop, keys::POPUP, popup).await
}

/// In-memory store for tests and dry runs.
#[derive(Default)]
pub struct MemStore {
    inner: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemStore {
    async fn get(&self, shop: &str, key: &str) -> Result<Option<Value>> {
        let inner = self.inner.read().await;
        Ok(inner.get(shop).and_then(|docs| docs.get(key)).cloned())
    }

    async fn set(&self, shop: &str, key: &str, value: Value) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .entry(shop.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn shops(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        let mut shops: Vec<String> = inner.keys().cloned().collect();
        shops.sort();
        Ok(shops)
    }
}

/// File-backed store: one directory per shop, one pretty-printed JSON file
/// per key.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/.festive` unless the caller picks somewhere else.
    pub fn default_root() -> Result<PathBuf> {
        let home = std::env::var("HOME").context("HOME is not set")?;
        Ok(PathBuf::from(home).join(".festive"))
    }

    fn shop_dir(&self, shop: &str) -> PathBuf {
        // Shop domains are hostnames; anything stranger gets flattened so it
        // can never escape the root directory.
        let safe: String = shop
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(safe)
    }

    fn doc_path(&self, shop: &str, key: &str) -> PathBuf {
        self.shop_dir(shop).join(format!("{key}.json"))
    }
}

#[async_trait]
impl SettingsStore for FileStore {
    async fn get(&self, shop: &str, key: &str) -> Result<Option<Value>> {
        let path = self.doc_path(shop, key);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                let value = serde_json::from_str(&text)
                    .with_context(|| format!("parse {}", path.display()))?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }

    async fn set(&self, shop: &str, key: &str, value: Value) -> Result<()> {
        let dir = self.shop_dir(shop);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("create {}", dir.display()))?;
        let path = self.doc_path(shop, key);
        let json = serde_json::to_string_pretty(&value)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    async fn shops(&self) -> Result<Vec<String>> {
        let mut shops = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(shops),
            Err(e) => return Err(e).with_context(|| format!("list {}", self.root.display())),
        };
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("list {}", self.root.display()))?
        {
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                shops.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        shops.sort();
        Ok(shops)
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("root", &self.root.display().to_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use festive_core::Campaign;
    use std::path::Path;

    #[tokio::test]
    async fn missing_key_loads_default_popup() {
        let store = MemStore::new();
        let popup = load_popup(&store, "demo.myshopify.com").await.unwrap();
        assert!(popup.is_active);
        assert!(popup.festivals.is_empty());
    }

    #[tokio::test]
    async fn popup_roundtrips_through_store() {
        let store = MemStore::new();
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let mut popup = PopupSettings::default();
        popup
            .festivals
            .push(Campaign::new("Holi", "10% OFF", "HOHA10", start, start));

        save_popup(&store, "demo.myshopify.com", &popup).await.unwrap();
        let back = load_popup(&store, "demo.myshopify.com").await.unwrap();
        assert_eq!(back, popup);
    }

    #[tokio::test]
    async fn shops_lists_every_shop_once() {
        let store = MemStore::new();
        save_popup(&store, "b.example", &PopupSettings::default())
            .await
            .unwrap();
        save_popup(&store, "a.example", &PopupSettings::default())
            .await
            .unwrap();
        store
            .set("a.example", keys::SUBSCRIBERS, serde_json::json!([]))
            .await
            .unwrap();
        assert_eq!(store.shops().await.unwrap(), vec!["a.example", "b.example"]);
    }

    #[tokio::test]
    async fn file_store_writes_one_file_per_key() {
        let dir = std::env::temp_dir().join(format!("festive-store-{}", uuid::Uuid::new_v4()));
        let store = FileStore::new(&dir);

        save_popup(&store, "demo.myshopify.com", &PopupSettings::default())
            .await
            .unwrap();
        let path = dir.join("demo.myshopify.com").join("popup_settings.json");
        assert!(path.exists());

        assert_eq!(store.shops().await.unwrap(), vec!["demo.myshopify.com"]);
        let popup = load_popup(&store, "demo.myshopify.com").await.unwrap();
        assert_eq!(popup, PopupSettings::default());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[test]
    fn hostile_shop_names_stay_under_the_root() {
        let store = FileStore::new("/tmp/festive-root");
        // Separators are flattened, so the document lands directly under a
        // single shop directory inside the root.
        let path = store.doc_path("../../etc", "popup_settings");
        assert!(path.starts_with("/tmp/festive-root"));
        let shop_dir = path.parent().unwrap();
        assert_eq!(shop_dir.parent().unwrap(), Path::new("/tmp/festive-root"));
    }
}
