use parking_lot::RwLock;
use shared::models::Shop;
use std::sync::Arc;

use super::{ChangeFeed, StoreChange};

/// Client-local branch list
///
/// Replaced wholesale on refetch; the local copy is stale until reconciled.
#[derive(Debug, Clone, Default)]
pub struct ShopStore {
    shops: Arc<RwLock<Vec<Shop>>>,
    feed: ChangeFeed,
}

impl ShopStore {
    pub fn new(feed: ChangeFeed) -> Self {
        Self {
            shops: Arc::default(),
            feed,
        }
    }

    pub fn replace_all(&self, shops: Vec<Shop>) {
        let count = shops.len();
        *self.shops.write() = shops;
        tracing::debug!(count, "Shops replaced");
        self.feed.publish(StoreChange::ShopsReplaced { count });
    }

    /// Replace a single branch by id, appending unknown ones
    pub fn upsert(&self, shop: Shop) {
        let id = shop.id.clone();
        {
            let mut shops = self.shops.write();
            match shops.iter_mut().find(|s| s.id == shop.id) {
                Some(existing) => *existing = shop,
                None => shops.push(shop),
            }
        }
        self.feed.publish(StoreChange::ShopUpdated { id });
    }

    pub fn get(&self, id: &str) -> Option<Shop> {
        self.shops.read().iter().find(|s| s.id == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.shops.read().iter().any(|s| s.id == id)
    }

    pub fn first(&self) -> Option<Shop> {
        self.shops.read().first().cloned()
    }

    pub fn snapshot(&self) -> Vec<Shop> {
        self.shops.read().clone()
    }

    pub fn len(&self) -> usize {
        self.shops.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shops.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_and_upsert() {
        let store = ShopStore::default();
        store.replace_all(vec![
            Shop::new("s1", "Connaught Place", "CP"),
            Shop::new("s2", "Karol Bagh", "KB"),
        ]);
        assert_eq!(store.first().unwrap().id, "s1");

        let mut closed = store.get("s2").unwrap();
        closed.shop_open = false;
        store.upsert(closed);
        store.upsert(Shop::new("s3", "Lajpat Nagar", "LN"));

        assert_eq!(store.len(), 3);
        assert!(!store.get("s2").unwrap().shop_open);
        assert!(store.contains("s3"));
        assert!(!store.contains("s4"));
    }
}
