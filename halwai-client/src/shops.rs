//! 分店操作: 刷新 / 更新 / 克隆 / 选择当前分店

use shared::models::{CloneShopRequest, Shop};
use std::sync::Arc;

use crate::active_shop::ActiveShop;
use crate::http::AdminApi;
use crate::store::ShopStore;
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone)]
pub struct ShopService {
    api: Arc<dyn AdminApi>,
    shops: ShopStore,
    active: ActiveShop,
}

impl ShopService {
    pub fn new(api: Arc<dyn AdminApi>, shops: ShopStore, active: ActiveShop) -> Self {
        Self { api, shops, active }
    }

    /// Refetch the branch list
    ///
    /// A stored active branch that no longer exists falls back to the first
    /// branch of the new list.
    pub async fn refresh(&self) -> ClientResult<usize> {
        let shops = self.api.fetch_shops().await?;
        let count = shops.len();
        self.shops.replace_all(shops);
        self.ensure_active()?;
        Ok(count)
    }

    /// Save branch settings (open flag, delivery range, enabled menu)
    pub async fn update(&self, shop: &Shop) -> ClientResult<Shop> {
        let saved = self.api.update_shop(shop).await?;
        tracing::info!(shop_id = %saved.id, open = saved.shop_open, "Shop updated");
        self.shops.upsert(saved.clone());
        Ok(saved)
    }

    /// Create a branch from an existing one
    pub async fn clone_branch(&self, request: &CloneShopRequest) -> ClientResult<Shop> {
        let shop = self.api.clone_shop(request).await.inspect_err(|e| {
            tracing::warn!(
                source_shop_id = %request.source_shop_id,
                error = %e,
                "Branch clone failed"
            );
        })?;
        tracing::info!(shop_id = %shop.id, code = %shop.code, "Branch created");
        self.shops.upsert(shop.clone());
        Ok(shop)
    }

    /// Make `id` the active branch
    pub fn select(&self, id: &str) -> ClientResult<Shop> {
        let shop = self
            .shops
            .get(id)
            .ok_or_else(|| ClientError::ShopNotFound(id.to_string()))?;
        self.active.set(Some(shop.id.clone()))?;
        Ok(shop)
    }

    /// The active branch, if it is known locally
    pub fn active_shop(&self) -> Option<Shop> {
        self.active.get().and_then(|id| self.shops.get(&id))
    }

    pub fn active(&self) -> &ActiveShop {
        &self.active
    }

    pub fn shops(&self) -> &ShopStore {
        &self.shops
    }

    fn ensure_active(&self) -> ClientResult<()> {
        let current = self.active.get();
        if let Some(id) = &current
            && self.shops.contains(id)
        {
            return Ok(());
        }

        let fallback = self.shops.first().map(|s| s.id);
        if fallback != current {
            tracing::info!(previous = ?current, fallback = ?fallback, "Active shop fell back");
            self.active.set(fallback)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApi;
    use shared::ErrorCode;

    fn shops() -> Vec<Shop> {
        vec![
            Shop::new("s1", "Connaught Place", "CP"),
            Shop::new("s2", "Karol Bagh", "KB"),
        ]
    }

    fn service(api: Arc<MockApi>, dir: &std::path::Path) -> ShopService {
        ShopService::new(api, ShopStore::default(), ActiveShop::open(dir))
    }

    #[tokio::test]
    async fn test_refresh_falls_back_to_first_shop() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(MockApi::new().with_shops(shops()));
        let service = service(api.clone(), dir.path());

        service.active().set(Some("gone".into())).unwrap();
        assert_eq!(service.refresh().await.unwrap(), 2);
        assert_eq!(service.active().get().as_deref(), Some("s1"));

        service.select("s2").unwrap();
        service.refresh().await.unwrap();
        assert_eq!(service.active_shop().unwrap().code, "KB");
    }

    #[tokio::test]
    async fn test_refresh_with_no_shops_clears_selection() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(Arc::new(MockApi::new()), dir.path());
        service.active().set(Some("s1".into())).unwrap();

        service.refresh().await.unwrap();
        assert_eq!(service.active().get(), None);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(MockApi::new().with_shops(shops()));
        let service = service(api.clone(), dir.path());
        service.refresh().await.unwrap();

        api.fail_fetches(true);
        assert!(service.refresh().await.is_err());
        assert_eq!(service.shops().len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_clone() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(MockApi::new().with_shops(shops()));
        let service = service(api, dir.path());
        service.refresh().await.unwrap();

        let mut shop = service.shops().get("s1").unwrap();
        shop.shop_open = false;
        shop.shop_delivery_range = Some(7.5);
        let saved = service.update(&shop).await.unwrap();
        assert!(!service.shops().get(&saved.id).unwrap().shop_open);

        let request = CloneShopRequest {
            source_shop_id: "s1".into(),
            name: "Rajouri Garden".into(),
            code: "RG".into(),
        };
        let branch = service.clone_branch(&request).await.unwrap();
        assert_eq!(service.shops().len(), 3);
        assert_eq!(branch.shop_delivery_range, Some(7.5));

        let err = service.clone_branch(&request).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ShopCloneFailed);
        assert_eq!(err.user_message(), "Shop code already exists");
    }

    #[test]
    fn test_select_unknown_shop() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(Arc::new(MockApi::new()), dir.path());
        assert!(matches!(service.select("s9"), Err(ClientError::ShopNotFound(_))));
    }
}
