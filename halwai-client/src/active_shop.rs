//! 当前分店选择 (持久化)
//!
//! `<state_dir>/active_shop.json`:
//!
//! ```json
//! { "mrh_active_shop_id": "65f0c..." }
//! ```
//!
//! 进程内变更通过 watch channel 通知, 不做跨进程同步。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

use crate::{ClientError, ClientResult};

pub const ACTIVE_SHOP_FILE: &str = "active_shop.json";
pub const ACTIVE_SHOP_KEY: &str = "mrh_active_shop_id";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct ActiveShopFile {
    #[serde(rename = "mrh_active_shop_id", default, skip_serializing_if = "Option::is_none")]
    active_shop_id: Option<String>,
}

impl ActiveShopFile {
    fn load(path: &Path) -> ClientResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    fn save(&self, path: &Path) -> ClientResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Persisted active-branch selection
#[derive(Debug, Clone)]
pub struct ActiveShop {
    path: Arc<PathBuf>,
    tx: Arc<watch::Sender<Option<String>>>,
}

impl ActiveShop {
    /// Load the selection stored under `state_dir`
    ///
    /// A corrupt state file is logged and treated as "no selection".
    pub fn open(state_dir: impl AsRef<Path>) -> Self {
        let path = state_dir.as_ref().join(ACTIVE_SHOP_FILE);
        let current = match ActiveShopFile::load(&path) {
            Ok(file) => file.active_shop_id,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Ignoring unreadable active shop file"
                );
                None
            }
        };
        tracing::debug!(shop_id = ?current, "Active shop loaded");

        let (tx, _) = watch::channel(current);
        Self {
            path: Arc::new(path),
            tx: Arc::new(tx),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    /// Persist and announce a new selection (`None` clears it)
    pub fn set(&self, shop_id: Option<String>) -> ClientResult<()> {
        if let Some(id) = &shop_id
            && id.trim().is_empty()
        {
            return Err(ClientError::ShopNotFound(String::new()));
        }

        ActiveShopFile {
            active_shop_id: shop_id.clone(),
        }
        .save(&self.path)?;

        let changed = self.tx.send_if_modified(|current| {
            if *current == shop_id {
                false
            } else {
                *current = shop_id.clone();
                true
            }
        });
        if changed {
            tracing::info!(shop_id = ?shop_id, "Active shop changed");
        }
        Ok(())
    }

    pub fn watch(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let active = ActiveShop::open(dir.path());
        assert_eq!(active.get(), None);

        active.set(Some("shop-2".into())).unwrap();
        let raw = std::fs::read_to_string(active.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[ACTIVE_SHOP_KEY], "shop-2");

        let reopened = ActiveShop::open(dir.path());
        assert_eq!(reopened.get().as_deref(), Some("shop-2"));

        reopened.set(None).unwrap();
        assert_eq!(ActiveShop::open(dir.path()).get(), None);
    }

    #[test]
    fn test_corrupt_file_means_no_selection() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ACTIVE_SHOP_FILE), "not json").unwrap();
        assert_eq!(ActiveShop::open(dir.path()).get(), None);
    }

    #[test]
    fn test_empty_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let active = ActiveShop::open(dir.path());
        assert!(active.set(Some("  ".into())).is_err());
    }

    #[tokio::test]
    async fn test_watch_announces_changes() {
        let dir = tempfile::tempdir().unwrap();
        let active = ActiveShop::open(dir.path().join("nested"));
        let mut rx = active.watch();

        active.set(Some("shop-1".into())).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_deref(), Some("shop-1"));

        // 相同值不再通知
        active.set(Some("shop-1".into())).unwrap();
        assert!(!rx.has_changed().unwrap());
    }
}
