//! Shop (Branch) Model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A physical outlet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    /// Availability flag ("LIVE" / "OFFLINE")
    #[serde(default)]
    pub shop_open: bool,
    /// Menu item ids enabled at this branch
    #[serde(default)]
    pub menu_items: Vec<String>,
    /// Delivery radius in km
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_delivery_range: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Shop {
    pub fn new(id: impl Into<String>, name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            code: code.into(),
            shop_open: false,
            menu_items: Vec::new(),
            shop_delivery_range: None,
            extra: Map::new(),
        }
    }

    /// Display label: name, then code, then a generic fallback
    pub fn label(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.code.is_empty() {
            &self.code
        } else {
            "Branch"
        }
    }

    pub fn is_item_enabled(&self, item_id: &str) -> bool {
        self.menu_items.iter().any(|id| id == item_id)
    }
}

/// Body of `POST /api/shop/clone`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneShopRequest {
    pub source_shop_id: String,
    pub name: String,
    pub code: String,
}
