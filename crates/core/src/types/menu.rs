//! Menu items, categories and the storefront announcement.

use serde::{Deserialize, Serialize};

use super::id::{CategoryId, MenuItemId};
use super::price::Price;

/// A dish on the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default, alias = "imageUrl")]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_true", alias = "isAvailable")]
    pub available: bool,
    #[serde(default, alias = "isFeatured")]
    pub featured: bool,
}

const fn default_true() -> bool {
    true
}

/// A menu category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub item_count: Option<u32>,
}

/// Banner text shown above the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(default)]
    pub message: String,
    #[serde(default, alias = "isActive")]
    pub active: bool,
}

/// Filters for listing the menu.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuQuery {
    /// Restrict to one category (by name).
    pub category: Option<String>,
    /// Free-text search.
    pub search: Option<String>,
}

impl MenuQuery {
    /// Query string pairs, omitting unset filters.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            params.push(("category", category.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        params
    }

    /// Stable suffix used to key cached listings for this query.
    #[must_use]
    pub fn cache_suffix(&self) -> String {
        let params = self.to_params();
        if params.is_empty() {
            return "all".to_string();
        }
        params
            .into_iter()
            .map(|(k, v)| format!("{k}={}", v.to_lowercase()))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Fields for creating or replacing a menu item (admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub available: bool,
    pub featured: bool,
}
